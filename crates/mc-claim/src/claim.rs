//! Ring expansion: the claim algorithm proper.
//!
//! ```text
//! priority phase     26 cells around the emitter, no path check
//!        │            (nothing claimable → empty result, stop)
//!        ▼
//! frontier           every priority cell at distance 0
//!        │
//!        ▼
//! ring expansion     pop nearest → claimable? → cached path check
//!                    → register, record, push 6 neighbors at d + 1
//! ```
//!
//! Stops at an empty frontier or at `max_cells`. There is no error path: an
//! empty result means the emitter is sealed in or surrounded by foreign
//! claims, a short one means it ran out of connected space.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::cache::PathCache;
use crate::passability::Classifier;
use crate::path::PathQuery;
use crate::pos::{BlockPos, DimensionId, EmitterPos};
use crate::registry::Ownership;
use crate::view::{BlockView, Terrain};
use crate::{FxSet, Tick};

/// Parameters of one claim run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimRequest {
    pub emitter: EmitterPos,
    /// Ring distance ceiling, also the path search bound.
    pub radius: u32,
    /// Hard cap on the result size.
    pub max_cells: usize,
    pub now: Tick,
}

/// Insertion-ordered set of claimed cells.
#[derive(Clone, Debug, Default)]
pub struct ClaimedArea {
    order: Vec<BlockPos>,
    members: FxSet<BlockPos>,
}

impl ClaimedArea {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `pos`. Returns `false` if it was already present.
    pub fn insert(&mut self, pos: BlockPos) -> bool {
        if !self.members.insert(pos) {
            return false;
        }
        self.order.push(pos);
        true
    }

    #[must_use]
    pub fn contains(&self, pos: &BlockPos) -> bool {
        self.members.contains(pos)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Cells in claim order.
    pub fn iter(&self) -> std::slice::Iter<'_, BlockPos> {
        self.order.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[BlockPos] {
        &self.order
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<BlockPos> {
        self.order
    }
}

impl PartialEq for ClaimedArea {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl Eq for ClaimedArea {}

impl<'a> IntoIterator for &'a ClaimedArea {
    type Item = &'a BlockPos;
    type IntoIter = std::slice::Iter<'a, BlockPos>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

impl FromIterator<BlockPos> for ClaimedArea {
    fn from_iter<I: IntoIterator<Item = BlockPos>>(iter: I) -> Self {
        let mut area = Self::new();
        for pos in iter {
            area.insert(pos);
        }
        area
    }
}

/// Whether `emitter` may take `pos`: open space that nobody else holds.
pub fn can_claim<V, C, R>(
    terrain: Terrain<'_, V, C>,
    registry: &R,
    dimension: &DimensionId,
    pos: BlockPos,
    emitter: EmitterPos,
) -> bool
where
    V: BlockView + ?Sized,
    C: Classifier + ?Sized,
    R: Ownership + ?Sized,
{
    terrain.classify(pos).needs_fill() && !registry.is_foreign(dimension, pos, emitter)
}

/// Claim the connected space around an emitter.
///
/// Every accepted cell is written to `registry` as it is claimed, so later
/// path checks in the same run already see it as the emitter's own ground.
pub fn claim_area<V, C, R>(
    terrain: Terrain<'_, V, C>,
    registry: &mut R,
    cache: &mut PathCache,
    dimension: &DimensionId,
    request: &ClaimRequest,
) -> ClaimedArea
where
    V: BlockView + ?Sized,
    C: Classifier + ?Sized,
    R: Ownership + ?Sized,
{
    let ClaimRequest {
        emitter,
        radius,
        max_cells,
        now,
    } = *request;
    let origin = emitter.pos();
    let mut area = ClaimedArea::new();

    if max_cells == 0 {
        return area;
    }

    debug!(
        "[{}] claiming from {} with radius {}, max cells {}",
        R::KIND,
        emitter,
        radius,
        max_cells
    );

    let mut visited = FxSet::default();
    visited.insert(origin);

    // Adjacency stands in for connectivity here, diagonals included.
    for pos in origin.cube_around() {
        if !can_claim(terrain, &*registry, dimension, pos, emitter) {
            continue;
        }

        registry.set_owner(dimension, pos, emitter);
        area.insert(pos);
        visited.insert(pos);

        if area.len() >= max_cells {
            debug!("[{}] {} reached max cells in priority cube", R::KIND, emitter);
            return area;
        }
    }

    if area.is_empty() {
        debug!("[{}] {} is blocked, nothing claimable around it", R::KIND, emitter);
        return area;
    }

    debug!("[{}] priority cube claimed {} cells", R::KIND, area.len());

    let mut frontier = BinaryHeap::with_capacity(area.len());
    let mut seq = 0_u64;
    for &pos in &area {
        frontier.push(FrontierCell {
            distance: 0,
            seq,
            pos,
        });
        seq += 1;
    }

    while area.len() < max_cells {
        let Some(cell) = frontier.pop() else {
            break;
        };

        if cell.distance > radius {
            continue;
        }

        if !can_claim(terrain, &*registry, dimension, cell.pos, emitter) {
            continue;
        }

        let query = PathQuery::from_emitter(emitter, cell.pos, radius);
        if !cache.cached_has_path(terrain, &*registry, dimension, &query, now) {
            continue;
        }

        registry.set_owner(dimension, cell.pos, emitter);
        area.insert(cell.pos);

        let distance = cell.distance + 1;
        if distance > radius {
            continue;
        }

        for neighbor in cell.pos.neighbors() {
            if visited.insert(neighbor) {
                frontier.push(FrontierCell {
                    distance,
                    seq,
                    pos: neighbor,
                });
                seq += 1;
            }
        }
    }

    debug!(
        "[{}] {} claimed {} cells (radius={}, max_cells={})",
        R::KIND,
        emitter,
        area.len(),
        radius,
        max_cells
    );

    area
}

/// Frontier entry. Nearest ring first, then insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrontierCell {
    distance: u32,
    seq: u64,
    pos: BlockPos,
}

impl Ord for FrontierCell {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .cmp(&self.distance)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::Atmosphere;
    use crate::passability::{CellState, StandardClassifier};
    use crate::registry::OwnershipRegistry;
    use crate::view::SparseBlockView;

    const EMITTER: EmitterPos = EmitterPos::new(BlockPos::ORIGIN);

    fn run(
        view: &SparseBlockView,
        registry: &mut OwnershipRegistry<Atmosphere>,
        emitter: EmitterPos,
        radius: u32,
        max_cells: usize,
    ) -> ClaimedArea {
        let mut cache = PathCache::default();
        claim_area(
            Terrain::new(view, &StandardClassifier),
            registry,
            &mut cache,
            &DimensionId::overworld(),
            &ClaimRequest {
                emitter,
                radius,
                max_cells,
                now: 0,
            },
        )
    }

    #[test]
    fn test_claimed_area_keeps_insertion_order() {
        let a = BlockPos::new(2, 0, 0);
        let b = BlockPos::new(1, 0, 0);
        let mut area = ClaimedArea::new();

        assert!(area.insert(a));
        assert!(area.insert(b));
        assert!(!area.insert(a));
        assert_eq!(area.as_slice(), &[a, b]);
    }

    #[test]
    fn test_open_air_is_capped_by_max_cells() {
        let view = SparseBlockView::default();
        let mut registry = OwnershipRegistry::new();

        let area = run(&view, &mut registry, EMITTER, 8, 60);
        assert_eq!(area.len(), 60);
        assert_eq!(registry.claimed_count(&DimensionId::overworld()), 60);
    }

    #[test]
    fn test_max_cells_hit_during_priority_phase() {
        let view = SparseBlockView::default();
        let mut registry = OwnershipRegistry::new();

        let area = run(&view, &mut registry, EMITTER, 8, 5);
        assert_eq!(area.len(), 5);
        assert!(area.iter().all(|pos| pos.chebyshev(BlockPos::ORIGIN) == 1));
    }

    #[test]
    fn test_zero_max_cells_claims_nothing() {
        let view = SparseBlockView::default();
        let mut registry = OwnershipRegistry::new();

        assert!(run(&view, &mut registry, EMITTER, 8, 0).is_empty());
        assert_eq!(registry.claimed_count(&DimensionId::overworld()), 0);
    }

    #[test]
    fn test_radius_zero_keeps_to_the_priority_cube() {
        let view = SparseBlockView::default();
        let mut registry = OwnershipRegistry::new();

        let area = run(&view, &mut registry, EMITTER, 0, 1000);
        assert_eq!(area.len(), 26);
    }

    #[test]
    fn test_emitter_cell_is_never_claimed() {
        let view = SparseBlockView::default();
        let mut registry = OwnershipRegistry::new();

        let area = run(&view, &mut registry, EMITTER, 4, 1000);
        assert!(!area.contains(&BlockPos::ORIGIN));
    }

    #[test]
    fn test_nearer_cells_come_first() {
        let view = SparseBlockView::default();
        let mut registry = OwnershipRegistry::new();

        let area = run(&view, &mut registry, EMITTER, 4, 1000);
        assert!(area.iter().take(26).all(|pos| pos.chebyshev(BlockPos::ORIGIN) == 1));

        let index_of = |x: i32| {
            area.iter()
                .position(|pos| *pos == BlockPos::new(x, 0, 0))
                .unwrap()
        };
        assert!(index_of(1) < index_of(2));
        assert!(index_of(2) < index_of(3));
        assert!(index_of(3) < index_of(4));

        // Ring distance 4 is allowed, but the path bound is Manhattan 4.
        assert!(!area.contains(&BlockPos::new(5, 0, 0)));
    }

    #[test]
    fn test_liquid_cells_are_not_claimed() {
        let mut view = SparseBlockView::default();
        view.fill(BlockPos::new(-3, -3, -3), BlockPos::new(3, -1, 3), CellState::WATER);
        let mut registry = OwnershipRegistry::new();

        let area = run(&view, &mut registry, EMITTER, 3, 1000);
        assert!(!area.is_empty());
        assert!(area.iter().all(|pos| pos.y >= 0));
    }
}
