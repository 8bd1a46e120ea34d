//! Passability classification.
//!
//! The claimer and the path validator both go through [`Classifier`], so a
//! cell the claimer accepts is never one the validator refuses to cross.

/// How air (or a gravity field) relates to a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Passability {
    /// Open or partially open space that should receive the effect.
    NeedsFill,
    /// A full obstruction. Never claimed, never traversed.
    Blocks,
    /// Already holds a liquid source. Traversable but never claimed.
    AlreadyFilled,
}

impl Passability {
    #[must_use]
    pub const fn needs_fill(self) -> bool {
        matches!(self, Self::NeedsFill)
    }

    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Blocks)
    }
}

/// Collision shape of the block occupying a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockShape {
    /// No block at all.
    Empty,
    /// A block whose collision box fills the whole cell.
    Full { solid: bool },
    Stairs,
    Slab { double: bool },
    Door,
    Trapdoor { open: bool },
    /// Any other shape lower than a full block (plates, carpets, buttons).
    Partial,
}

/// Snapshot of a cell as reported by the grid query service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellState {
    pub shape: BlockShape,
    /// Whether the cell holds a stationary liquid source.
    pub fluid_source: bool,
}

impl CellState {
    pub const AIR: Self = Self::new(BlockShape::Empty);
    pub const STONE: Self = Self::new(BlockShape::Full { solid: true });
    pub const WATER: Self = Self::new(BlockShape::Empty).with_fluid_source();

    #[must_use]
    pub const fn new(shape: BlockShape) -> Self {
        Self {
            shape,
            fluid_source: false,
        }
    }

    #[must_use]
    pub const fn with_fluid_source(mut self) -> Self {
        self.fluid_source = true;
        self
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::AIR
    }
}

/// Maps a cell state to its [`Passability`].
pub trait Classifier {
    fn classify(&self, state: &CellState) -> Passability;
}

impl<F> Classifier for F
where
    F: Fn(&CellState) -> Passability,
{
    fn classify(&self, state: &CellState) -> Passability {
        self(state)
    }
}

/// The block rules shared by oxygen distributors and gravity normalizers.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardClassifier;

impl Classifier for StandardClassifier {
    fn classify(&self, state: &CellState) -> Passability {
        classify(state)
    }
}

/// Classify a cell with the standard block rules.
///
/// Undecided shapes fall through to [`Passability::NeedsFill`].
#[must_use]
pub const fn classify(state: &CellState) -> Passability {
    if state.fluid_source {
        return Passability::AlreadyFilled;
    }

    match state.shape {
        BlockShape::Empty | BlockShape::Stairs | BlockShape::Door | BlockShape::Partial => {
            Passability::NeedsFill
        }
        BlockShape::Slab { double: true }
        | BlockShape::Trapdoor { open: false }
        | BlockShape::Full { solid: true } => Passability::Blocks,
        BlockShape::Slab { double: false }
        | BlockShape::Trapdoor { open: true }
        | BlockShape::Full { solid: false } => Passability::NeedsFill,
    }
}
