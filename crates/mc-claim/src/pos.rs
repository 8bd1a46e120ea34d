//! Block coordinates, directions, and the emitter identity built on them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer position of one block in the world grid.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    /// The world origin.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Create a new block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position shifted by the given deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The face-adjacent position in `direction`.
    #[must_use]
    pub const fn relative(self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.delta();
        self.offset(dx, dy, dz)
    }

    /// The six face-adjacent positions, in [`Direction::ALL`] order.
    pub fn neighbors(self) -> impl Iterator<Item = Self> {
        Direction::ALL.into_iter().map(move |dir| self.relative(dir))
    }

    /// The 26 positions of the 3×3×3 cube centered here, excluding the center.
    ///
    /// Iterates x, then y, then z from -1 to 1.
    pub fn cube_around(self) -> impl Iterator<Item = Self> {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1)
                    .filter(move |&dz| (dx, dy, dz) != (0, 0, 0))
                    .map(move |dz| self.offset(dx, dy, dz))
            })
        })
    }

    /// Sum of the per-axis distances.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) + self.z.abs_diff(other.z)
    }

    /// Largest per-axis distance.
    #[must_use]
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .max(self.y.abs_diff(other.y))
            .max(self.z.abs_diff(other.z))
    }

    /// Squared euclidean distance.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx * dx + dy * dy + dz * dz
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One of the six axis-aligned directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    /// All directions in neighbor enumeration order.
    pub const ALL: [Self; 6] = [
        Self::Down,
        Self::Up,
        Self::North,
        Self::South,
        Self::West,
        Self::East,
    ];

    /// Unit step along this direction. North is -z, west is -x.
    #[must_use]
    pub const fn delta(self) -> (i32, i32, i32) {
        match self {
            Self::Down => (0, -1, 0),
            Self::Up => (0, 1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::West => (-1, 0, 0),
            Self::East => (1, 0, 0),
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }
}

/// Identity of an emitter: the block it sits in.
///
/// Kept distinct from [`BlockPos`] so an owner can't be passed where a path
/// target is expected (or the reverse) without saying so.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EmitterPos(BlockPos);

impl EmitterPos {
    #[must_use]
    pub const fn new(pos: BlockPos) -> Self {
        Self(pos)
    }

    /// The block the emitter occupies.
    #[must_use]
    pub const fn pos(self) -> BlockPos {
        self.0
    }
}

impl fmt::Display for EmitterPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "emitter@{}", self.0)
    }
}

/// Key of a world dimension, e.g. `minecraft:overworld`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionId(String);

impl DimensionId {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn overworld() -> Self {
        Self::new("minecraft:overworld")
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&DimensionId> for DimensionId {
    fn from(id: &DimensionId) -> Self {
        id.clone()
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
