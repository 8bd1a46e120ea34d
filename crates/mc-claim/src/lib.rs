//! Ownership-aware area claiming for space-station emitters.
//!
//! Oxygen distributors and gravity generators each fill the connected open
//! space around them. This crate decides which cells an emitter gets: flood
//! outward ring by ring, confirm each candidate is reachable from the emitter
//! without crossing walls or another emitter's territory, and record the
//! claim so neighbors partition shared rooms instead of overlapping.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ClaimEngine<R, C>                                                  │
//! │    - One per zone kind (atmosphere, gravity)                        │
//! │    - Owns the registry and one PathCache per dimension              │
//! │    - distribute / shrink / deactivate reconcile a Zone              │
//! └─────────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  claim_area                                                         │
//! │    - Priority cube: the 26 cells around the emitter                 │
//! │    - Ring expansion: nearest first, capped by radius and max_cells  │
//! │    - Every candidate goes through the cached bounded A*             │
//! └─────────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Terrain = BlockView + Classifier                                   │
//! │    - BlockView: what the host world holds at a position             │
//! │    - Classifier: NeedsFill / Blocks / AlreadyFilled                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use mc_claim::prelude::*;
//!
//! let view = SparseBlockView::default();
//! let dim = DimensionId::overworld();
//! let emitter = EmitterPos::new(BlockPos::new(0, 64, 0));
//!
//! let mut engine = AtmosphereEngine::new(ClaimConfig::default());
//! let area = engine.claim_area(&view, &dim, emitter, 4, 128, 0);
//!
//! assert_eq!(area.len(), 128);
//! assert_eq!(engine.get_owner(&dim, BlockPos::new(1, 64, 0)), Some(emitter));
//! ```

mod cache;
mod claim;
mod config;
mod engine;
mod error;
mod kind;
mod passability;
mod path;
mod pos;
mod registry;
mod schedule;
mod view;
mod zone;

pub use cache::{CacheStats, CachedPath, PathCache, PathKey};
pub use claim::{ClaimRequest, ClaimedArea, can_claim, claim_area};
pub use config::ClaimConfig;
pub use engine::{AtmosphereEngine, ClaimEngine, GravityEngine, SharedClaimEngine, ZoneEngines};
pub use error::{ConfigError, ConfigResult};
pub use kind::{Atmosphere, Gravity, ZoneKind};
pub use passability::{BlockShape, CellState, Classifier, Passability, StandardClassifier};
pub use path::{PathQuery, has_path};
pub use pos::{BlockPos, DimensionId, Direction, EmitterPos};
pub use registry::{ClaimReport, Ownership, OwnershipRegistry, ReleaseReport};
pub use schedule::{EmitterSchedule, stagger};
pub use view::{BlockView, SparseBlockView, Terrain};
pub use zone::{Zone, ZoneDelta, trim_edges};

/// Game time in ticks.
pub type Tick = u64;

pub(crate) type FxMap<K, V> = hashbrown::HashMap<K, V, rustc_hash::FxBuildHasher>;
pub(crate) type FxSet<T> = hashbrown::HashSet<T, rustc_hash::FxBuildHasher>;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AtmosphereEngine, BlockPos, BlockView, CellState, ClaimConfig, ClaimEngine, ClaimedArea,
        Classifier, DimensionId, EmitterPos, EmitterSchedule, GravityEngine, Ownership,
        OwnershipRegistry, Passability, SparseBlockView, Zone, ZoneDelta,
    };
}
