//! Zone kinds. Each kind gets its own registry type, so atmosphere and
//! gravity claims can never be mixed up.

/// Marker for a family of emitters sharing one ownership registry.
pub trait ZoneKind: Send + Sync + 'static {
    /// Short name used in log lines.
    const NAME: &'static str;
}

/// Breathable-atmosphere distribution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Atmosphere;

impl ZoneKind for Atmosphere {
    const NAME: &'static str = "atmosphere";
}

/// Gravity-field normalization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Gravity;

impl ZoneKind for Gravity {
    const NAME: &'static str = "gravity";
}
