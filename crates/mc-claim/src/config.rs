//! Claim engine configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Tick;
use crate::error::{ConfigError, ConfigResult};

/// Tunables shared by every emitter of one zone kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimConfig {
    /// Hard cap on cells per claim run.
    pub max_cells: usize,
    /// Ticks before the path cache is dropped wholesale.
    pub cache_window: Tick,
    /// Radius an emitter starts from when it activates.
    pub initial_radius: u32,
    /// Active ticks per one-block radius growth.
    pub expansion_rate: u32,
    /// Base ticks between claim runs, before per-emitter stagger.
    pub interval: u32,
    /// Optional radius ceiling. Unbounded when unset; `max_cells` still caps
    /// the claim.
    pub max_radius: Option<u32>,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            max_cells: 4100,
            cache_window: 100,
            initial_radius: 3,
            expansion_rate: 10,
            interval: 20,
            max_radius: None,
        }
    }
}

impl ClaimConfig {
    /// Parse and validate a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `{PREFIX}_MAX_CELLS`, `{PREFIX}_CACHE_WINDOW`,
    /// `{PREFIX}_INITIAL_RADIUS`, `{PREFIX}_EXPANSION_RATE`,
    /// `{PREFIX}_INTERVAL` and `{PREFIX}_MAX_RADIUS` from the process
    /// environment, then validate.
    pub fn with_env_overrides(self, prefix: &str) -> ConfigResult<Self> {
        self.with_overrides(prefix, |key| std::env::var(key).ok())
    }

    /// Same as [`Self::with_env_overrides`] with an arbitrary lookup.
    pub fn with_overrides<F>(mut self, prefix: &str, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| format!("{prefix}_{name}");

        if let Some(value) = parse_override(&lookup, &var("MAX_CELLS"))? {
            self.max_cells = value;
        }
        if let Some(value) = parse_override(&lookup, &var("CACHE_WINDOW"))? {
            self.cache_window = value;
        }
        if let Some(value) = parse_override(&lookup, &var("INITIAL_RADIUS"))? {
            self.initial_radius = value;
        }
        if let Some(value) = parse_override(&lookup, &var("EXPANSION_RATE"))? {
            self.expansion_rate = value;
        }
        if let Some(value) = parse_override(&lookup, &var("INTERVAL"))? {
            self.interval = value;
        }
        if let Some(value) = parse_override(&lookup, &var("MAX_RADIUS"))? {
            self.max_radius = Some(value);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_cells == 0 {
            return Err(ConfigError::ZeroMaxCells);
        }
        if self.interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.expansion_rate == 0 {
            return Err(ConfigError::ZeroExpansionRate);
        }
        if let Some(max_radius) = self.max_radius {
            if max_radius < self.initial_radius {
                return Err(ConfigError::RadiusCeilingBelowInitial {
                    initial_radius: self.initial_radius,
                    max_radius,
                });
            }
        }
        Ok(())
    }
}

fn parse_override<T, F>(lookup: &F, key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };

    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnv {
            key: key.to_owned(),
            value,
        })
}
