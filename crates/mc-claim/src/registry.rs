//! Cell ownership, partitioned by dimension.
//!
//! A cell has at most one owner. Claims are only ever overwritten by the
//! emitter that already holds them; everything else must be released by the
//! owner first.

use std::fmt;
use std::marker::PhantomData;

use hashbrown::hash_map::Entry;
use tracing::{debug, trace};

use crate::FxMap;
use crate::kind::ZoneKind;
use crate::pos::{BlockPos, DimensionId, EmitterPos};

/// Outcome of [`Ownership::claim_cells`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimReport {
    /// Cells now owned by the emitter, in request order.
    pub claimed: Vec<BlockPos>,
    pub newly_claimed: usize,
    pub already_owned: usize,
    /// Cells held by a different emitter.
    pub blocked: usize,
}

/// Outcome of [`Ownership::release_cells`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    pub released: usize,
    pub not_owned: usize,
    pub owned_by_others: usize,
}

/// The ownership registry contract the claim engine is generic over.
pub trait Ownership {
    /// Zone kind name used in log lines.
    const KIND: &'static str;

    fn get_owner(&self, dimension: &DimensionId, pos: BlockPos) -> Option<EmitterPos>;

    /// Claim `pos` for `emitter`.
    ///
    /// Returns whether `emitter` owns the cell afterwards. Re-claiming an owned
    /// cell is a no-op; a cell owned by someone else is left untouched.
    fn set_owner(&mut self, dimension: &DimensionId, pos: BlockPos, emitter: EmitterPos) -> bool;

    /// Drop the claim on `pos`, whoever holds it.
    fn clear_owner(&mut self, dimension: &DimensionId, pos: BlockPos) -> Option<EmitterPos>;

    /// Drop every claim held by `emitter`. Returns how many were dropped.
    fn clear_all_for(&mut self, dimension: &DimensionId, emitter: EmitterPos) -> usize;

    /// Drop every claim in `dimension`. Returns how many were dropped.
    fn clear_dimension(&mut self, dimension: &DimensionId) -> usize;

    /// Number of claimed cells in `dimension`.
    fn claimed_count(&self, dimension: &DimensionId) -> usize;

    fn is_occupied(&self, dimension: &DimensionId, pos: BlockPos) -> bool {
        self.get_owner(dimension, pos).is_some()
    }

    /// Whether `pos` belongs to an emitter other than `emitter`.
    fn is_foreign(&self, dimension: &DimensionId, pos: BlockPos, emitter: EmitterPos) -> bool {
        matches!(self.get_owner(dimension, pos), Some(owner) if owner != emitter)
    }

    /// Claim every requested cell that is free or already ours.
    fn claim_cells<I>(&mut self, dimension: &DimensionId, emitter: EmitterPos, cells: I) -> ClaimReport
    where
        I: IntoIterator<Item = BlockPos>,
    {
        let mut report = ClaimReport::default();
        let mut requested = 0_usize;

        for pos in cells {
            requested += 1;
            match self.get_owner(dimension, pos) {
                None => {
                    self.set_owner(dimension, pos, emitter);
                    report.newly_claimed += 1;
                    report.claimed.push(pos);
                }
                Some(owner) if owner == emitter => {
                    report.already_owned += 1;
                    report.claimed.push(pos);
                }
                Some(owner) => {
                    trace!("[{}] {} already owned by {}", Self::KIND, pos, owner);
                    report.blocked += 1;
                }
            }
        }

        debug!(
            "[{}] {} claimed {}/{} cells (new={}, already_owned={}, blocked={})",
            Self::KIND,
            emitter,
            report.claimed.len(),
            requested,
            report.newly_claimed,
            report.already_owned,
            report.blocked
        );

        report
    }

    /// Release the requested cells that `emitter` owns. Others are counted
    /// and left alone.
    fn release_cells<I>(
        &mut self,
        dimension: &DimensionId,
        emitter: EmitterPos,
        cells: I,
    ) -> ReleaseReport
    where
        I: IntoIterator<Item = BlockPos>,
    {
        let mut report = ReleaseReport::default();

        for pos in cells {
            match self.get_owner(dimension, pos) {
                None => report.not_owned += 1,
                Some(owner) if owner == emitter => {
                    self.clear_owner(dimension, pos);
                    report.released += 1;
                }
                Some(_) => report.owned_by_others += 1,
            }
        }

        if report != ReleaseReport::default() {
            debug!(
                "[{}] {} released {} cells (not_owned={}, owned_by_others={}, remaining={})",
                Self::KIND,
                emitter,
                report.released,
                report.not_owned,
                report.owned_by_others,
                self.claimed_count(dimension)
            );
        }

        report
    }
}

/// In-memory ownership registry for one zone kind.
pub struct OwnershipRegistry<K> {
    dimensions: FxMap<DimensionId, FxMap<BlockPos, EmitterPos>>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ZoneKind> OwnershipRegistry<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimensions that currently hold at least one claim.
    pub fn dimensions(&self) -> impl Iterator<Item = &DimensionId> {
        self.dimensions
            .iter()
            .filter(|(_, claims)| !claims.is_empty())
            .map(|(dimension, _)| dimension)
    }
}

impl<K> Default for OwnershipRegistry<K> {
    fn default() -> Self {
        Self {
            dimensions: FxMap::default(),
            _kind: PhantomData,
        }
    }
}

impl<K: ZoneKind> fmt::Debug for OwnershipRegistry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnershipRegistry")
            .field("kind", &K::NAME)
            .field("dimensions", &self.dimensions.len())
            .finish()
    }
}

impl<K: ZoneKind> Ownership for OwnershipRegistry<K> {
    const KIND: &'static str = K::NAME;

    fn get_owner(&self, dimension: &DimensionId, pos: BlockPos) -> Option<EmitterPos> {
        self.dimensions.get(dimension)?.get(&pos).copied()
    }

    fn set_owner(&mut self, dimension: &DimensionId, pos: BlockPos, emitter: EmitterPos) -> bool {
        let claims = self.dimensions.entry_ref(dimension).or_default();
        match claims.entry(pos) {
            Entry::Occupied(entry) => *entry.get() == emitter,
            Entry::Vacant(entry) => {
                entry.insert(emitter);
                true
            }
        }
    }

    fn clear_owner(&mut self, dimension: &DimensionId, pos: BlockPos) -> Option<EmitterPos> {
        self.dimensions.get_mut(dimension)?.remove(&pos)
    }

    fn clear_all_for(&mut self, dimension: &DimensionId, emitter: EmitterPos) -> usize {
        let Some(claims) = self.dimensions.get_mut(dimension) else {
            return 0;
        };

        let before = claims.len();
        claims.retain(|_, owner| *owner != emitter);
        let cleared = before - claims.len();

        debug!("[{}] cleared {} cells held by {}", K::NAME, cleared, emitter);
        cleared
    }

    fn clear_dimension(&mut self, dimension: &DimensionId) -> usize {
        let cleared = self.dimensions.remove(dimension).map_or(0, |claims| claims.len());
        debug!("[{}] cleared {} cells in {}", K::NAME, cleared, dimension);
        cleared
    }

    fn claimed_count(&self, dimension: &DimensionId) -> usize {
        self.dimensions.get(dimension).map_or(0, |claims| claims.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{Atmosphere, Gravity};

    fn emitter(x: i32) -> EmitterPos {
        EmitterPos::new(BlockPos::new(x, 64, 0))
    }

    #[test]
    fn test_set_owner_is_idempotent_and_never_steals() {
        let mut registry = OwnershipRegistry::<Atmosphere>::new();
        let dim = DimensionId::overworld();
        let cell = BlockPos::new(1, 64, 0);

        assert!(registry.set_owner(&dim, cell, emitter(0)));
        assert!(registry.set_owner(&dim, cell, emitter(0)));
        assert!(!registry.set_owner(&dim, cell, emitter(5)));

        assert_eq!(registry.get_owner(&dim, cell), Some(emitter(0)));
        assert_eq!(registry.claimed_count(&dim), 1);
    }

    #[test]
    fn test_dimensions_are_isolated() {
        let mut registry = OwnershipRegistry::<Atmosphere>::new();
        let overworld = DimensionId::overworld();
        let moon = DimensionId::new("adastramekanized:moon");
        let cell = BlockPos::new(1, 64, 0);

        registry.set_owner(&overworld, cell, emitter(0));
        assert_eq!(registry.get_owner(&moon, cell), None);
        assert!(registry.set_owner(&moon, cell, emitter(9)));
        assert_eq!(registry.get_owner(&overworld, cell), Some(emitter(0)));
    }

    #[test]
    fn test_kinds_do_not_share_claims() {
        let mut air = OwnershipRegistry::<Atmosphere>::new();
        let mut gravity = OwnershipRegistry::<Gravity>::new();
        let dim = DimensionId::overworld();
        let cell = BlockPos::new(1, 64, 0);

        assert!(air.set_owner(&dim, cell, emitter(0)));
        assert!(gravity.set_owner(&dim, cell, emitter(3)));
        assert_eq!(air.get_owner(&dim, cell), Some(emitter(0)));
        assert_eq!(gravity.get_owner(&dim, cell), Some(emitter(3)));
    }

    #[test]
    fn test_clear_all_for_only_touches_one_emitter() {
        let mut registry = OwnershipRegistry::<Gravity>::new();
        let dim = DimensionId::overworld();

        for x in 1..=4 {
            registry.set_owner(&dim, BlockPos::new(x, 64, 0), emitter(0));
        }
        registry.set_owner(&dim, BlockPos::new(-1, 64, 0), emitter(-5));

        assert_eq!(registry.clear_all_for(&dim, emitter(0)), 4);
        assert_eq!(registry.claimed_count(&dim), 1);
        assert_eq!(registry.clear_all_for(&DimensionId::new("missing"), emitter(0)), 0);
    }

    #[test]
    fn test_claim_cells_reports_contention() {
        let mut registry = OwnershipRegistry::<Atmosphere>::new();
        let dim = DimensionId::overworld();
        let a = BlockPos::new(1, 64, 0);
        let b = BlockPos::new(2, 64, 0);
        let c = BlockPos::new(3, 64, 0);

        registry.set_owner(&dim, a, emitter(0));
        registry.set_owner(&dim, c, emitter(9));

        let report = registry.claim_cells(&dim, emitter(0), [a, b, c]);
        assert_eq!(report.claimed, vec![a, b]);
        assert_eq!(report.newly_claimed, 1);
        assert_eq!(report.already_owned, 1);
        assert_eq!(report.blocked, 1);
        assert_eq!(registry.get_owner(&dim, c), Some(emitter(9)));
    }

    #[test]
    fn test_release_cells_only_releases_own_claims() {
        let mut registry = OwnershipRegistry::<Atmosphere>::new();
        let dim = DimensionId::overworld();
        let mine = BlockPos::new(1, 64, 0);
        let theirs = BlockPos::new(2, 64, 0);
        let nobody = BlockPos::new(3, 64, 0);

        registry.set_owner(&dim, mine, emitter(0));
        registry.set_owner(&dim, theirs, emitter(9));

        let report = registry.release_cells(&dim, emitter(0), [mine, theirs, nobody]);
        assert_eq!(
            report,
            ReleaseReport {
                released: 1,
                not_owned: 1,
                owned_by_others: 1,
            }
        );
        assert!(!registry.is_occupied(&dim, mine));
        assert!(registry.is_foreign(&dim, theirs, emitter(0)));
    }

    #[test]
    fn test_clear_dimension() {
        let mut registry = OwnershipRegistry::<Atmosphere>::new();
        let dim = DimensionId::overworld();
        registry.set_owner(&dim, BlockPos::new(1, 64, 0), emitter(0));
        registry.set_owner(&dim, BlockPos::new(2, 64, 0), emitter(0));

        assert_eq!(registry.dimensions().count(), 1);
        assert_eq!(registry.clear_dimension(&dim), 2);
        assert_eq!(registry.dimensions().count(), 0);
        assert_eq!(registry.claimed_count(&dim), 0);
    }
}
