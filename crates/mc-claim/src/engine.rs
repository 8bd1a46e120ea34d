//! The claim engine: one registry, its path caches, and the lifecycle glue
//! hosts call into.

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::cache::{CacheStats, PathCache};
use crate::claim::{ClaimRequest, ClaimedArea, claim_area};
use crate::config::ClaimConfig;
use crate::kind::{Atmosphere, Gravity};
use crate::passability::{Classifier, StandardClassifier};
use crate::pos::{BlockPos, DimensionId, EmitterPos};
use crate::registry::{Ownership, OwnershipRegistry, ReleaseReport};
use crate::schedule::EmitterSchedule;
use crate::view::{BlockView, Terrain};
use crate::zone::{Zone, ZoneDelta, trim_edges};
use crate::{FxMap, Tick};

/// Engine for breathable-atmosphere emitters.
pub type AtmosphereEngine = ClaimEngine<OwnershipRegistry<Atmosphere>>;

/// Engine for gravity-field emitters.
pub type GravityEngine = ClaimEngine<OwnershipRegistry<Gravity>>;

/// Claims space for every emitter sharing one registry.
///
/// Path caches are kept per dimension so equal coordinates in two dimensions
/// never share an entry.
pub struct ClaimEngine<R, C = StandardClassifier> {
    registry: R,
    classifier: C,
    caches: FxMap<DimensionId, PathCache>,
    config: ClaimConfig,
}

impl<R, C> ClaimEngine<R, C>
where
    R: Ownership + Default,
    C: Classifier + Default,
{
    /// Fresh engine with an empty registry.
    #[must_use]
    pub fn new(config: ClaimConfig) -> Self {
        Self::with_parts(R::default(), C::default(), config)
    }
}

impl<R, C> Default for ClaimEngine<R, C>
where
    R: Ownership + Default,
    C: Classifier + Default,
{
    fn default() -> Self {
        Self::new(ClaimConfig::default())
    }
}

impl<R, C> ClaimEngine<R, C>
where
    R: Ownership,
    C: Classifier,
{
    #[must_use]
    pub fn with_parts(registry: R, classifier: C, config: ClaimConfig) -> Self {
        Self {
            registry,
            classifier,
            caches: FxMap::default(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClaimConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// Claim connected space around `emitter`. See [`claim_area`].
    pub fn claim_area<V>(
        &mut self,
        view: &V,
        dimension: &DimensionId,
        emitter: EmitterPos,
        radius: u32,
        max_cells: usize,
        now: Tick,
    ) -> ClaimedArea
    where
        V: BlockView + ?Sized,
    {
        let window = self.config.cache_window;
        let cache = self
            .caches
            .entry_ref(dimension)
            .or_insert_with(|| PathCache::new(window));

        claim_area(
            Terrain::new(view, &self.classifier),
            &mut self.registry,
            cache,
            dimension,
            &ClaimRequest {
                emitter,
                radius,
                max_cells,
                now,
            },
        )
    }

    #[must_use]
    pub fn get_owner(&self, dimension: &DimensionId, pos: BlockPos) -> Option<EmitterPos> {
        self.registry.get_owner(dimension, pos)
    }

    /// Drop every claim of a removed emitter.
    pub fn clear_all_for(&mut self, dimension: &DimensionId, emitter: EmitterPos) -> usize {
        self.registry.clear_all_for(dimension, emitter)
    }

    /// Release specific cells held by `emitter`.
    pub fn release_cells<I>(
        &mut self,
        dimension: &DimensionId,
        emitter: EmitterPos,
        cells: I,
    ) -> ReleaseReport
    where
        I: IntoIterator<Item = BlockPos>,
    {
        self.registry.release_cells(dimension, emitter, cells)
    }

    /// Forget a dimension entirely, claims and cached paths alike.
    pub fn clear_dimension(&mut self, dimension: &DimensionId) -> usize {
        self.caches.remove(dimension);
        self.registry.clear_dimension(dimension)
    }

    /// Path cache counters for `dimension`, if it was ever searched.
    #[must_use]
    pub fn cache_stats(&self, dimension: &DimensionId) -> Option<CacheStats> {
        self.caches.get(dimension).map(PathCache::stats)
    }

    /// Re-claim a zone at `radius` and release whatever it no longer covers.
    pub fn distribute<V>(
        &mut self,
        view: &V,
        dimension: &DimensionId,
        zone: &mut Zone,
        radius: u32,
        now: Tick,
    ) -> ZoneDelta
    where
        V: BlockView + ?Sized,
    {
        let emitter = zone.emitter();
        let max_cells = self.config.max_cells;
        let area = self.claim_area(view, dimension, emitter, radius, max_cells, now);
        let delta = zone.replace(area);

        self.registry
            .release_cells(dimension, emitter, delta.released.iter().copied());

        if !delta.is_empty() {
            debug!(
                "[{}] {} zone now {} cells (+{}, -{})",
                R::KIND,
                emitter,
                zone.len(),
                delta.added.len(),
                delta.released.len()
            );
        }

        delta
    }

    /// Advance an emitter's schedule and distribute when it is due.
    pub fn tick_emitter<V>(
        &mut self,
        view: &V,
        dimension: &DimensionId,
        zone: &mut Zone,
        schedule: &mut EmitterSchedule,
        now: Tick,
    ) -> Option<ZoneDelta>
    where
        V: BlockView + ?Sized,
    {
        if !schedule.tick() {
            return None;
        }
        Some(self.distribute(view, dimension, zone, schedule.radius(), now))
    }

    /// Contract a zone to its `target` best-connected cells.
    pub fn shrink(&mut self, dimension: &DimensionId, zone: &mut Zone, target: usize) -> ZoneDelta {
        let keep: ClaimedArea = trim_edges(zone.cells(), zone.emitter(), target)
            .into_iter()
            .collect();
        let retained: ClaimedArea = zone
            .cells()
            .iter()
            .copied()
            .filter(|pos| keep.contains(pos))
            .collect();

        let delta = zone.replace(retained);
        self.registry
            .release_cells(dimension, zone.emitter(), delta.released.iter().copied());
        delta
    }

    /// Release a zone entirely, e.g. when its emitter shuts down.
    pub fn deactivate(&mut self, dimension: &DimensionId, zone: &mut Zone) -> ZoneDelta {
        let delta = zone.replace(ClaimedArea::new());
        self.registry
            .release_cells(dimension, zone.emitter(), delta.released.iter().copied());
        delta
    }
}

/// A [`ClaimEngine`] behind one lock, for hosts that claim off-thread.
///
/// Registry and caches sit under the same mutex so a claim run and its path
/// checks always see one consistent ownership state.
pub struct SharedClaimEngine<R, C = StandardClassifier> {
    inner: Mutex<ClaimEngine<R, C>>,
}

impl<R, C> SharedClaimEngine<R, C>
where
    R: Ownership,
    C: Classifier,
{
    #[must_use]
    pub fn new(engine: ClaimEngine<R, C>) -> Self {
        Self {
            inner: Mutex::new(engine),
        }
    }

    /// Exclusive access for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, ClaimEngine<R, C>> {
        self.inner.lock()
    }

    /// One claim run under the lock.
    pub fn claim_area<V>(
        &self,
        view: &V,
        dimension: &DimensionId,
        emitter: EmitterPos,
        radius: u32,
        max_cells: usize,
        now: Tick,
    ) -> ClaimedArea
    where
        V: BlockView + ?Sized,
    {
        self.lock()
            .claim_area(view, dimension, emitter, radius, max_cells, now)
    }

    #[must_use]
    pub fn get_owner(&self, dimension: &DimensionId, pos: BlockPos) -> Option<EmitterPos> {
        self.lock().get_owner(dimension, pos)
    }

    pub fn clear_all_for(&self, dimension: &DimensionId, emitter: EmitterPos) -> usize {
        self.lock().clear_all_for(dimension, emitter)
    }

    pub fn into_inner(self) -> ClaimEngine<R, C> {
        self.inner.into_inner()
    }
}

/// Both engines of one world, passed by reference to whoever ticks emitters.
#[derive(Default)]
pub struct ZoneEngines {
    pub atmosphere: AtmosphereEngine,
    pub gravity: GravityEngine,
}

impl ZoneEngines {
    #[must_use]
    pub fn new(atmosphere: ClaimConfig, gravity: ClaimConfig) -> Self {
        Self {
            atmosphere: AtmosphereEngine::new(atmosphere),
            gravity: GravityEngine::new(gravity),
        }
    }

    /// Forget a dimension in both engines.
    pub fn clear_dimension(&mut self, dimension: &DimensionId) {
        self.atmosphere.clear_dimension(dimension);
        self.gravity.clear_dimension(dimension);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::passability::CellState;
    use crate::view::SparseBlockView;

    /// Air inside the inclusive box, stone everywhere else.
    fn room(min: BlockPos, max: BlockPos) -> SparseBlockView {
        let mut view = SparseBlockView::new(CellState::STONE);
        view.fill(min, max, CellState::AIR);
        view
    }

    #[test]
    fn test_distribute_releases_cells_it_no_longer_reaches() {
        let mut view = room(BlockPos::new(-3, 0, -3), BlockPos::new(3, 2, 3));
        let dim = DimensionId::overworld();
        let emitter = EmitterPos::new(BlockPos::new(0, 0, 0));
        view.set(emitter.pos(), CellState::STONE);

        let mut engine = AtmosphereEngine::default();
        let mut zone = Zone::new(emitter);

        let first = engine.distribute(&view, &dim, &mut zone, 3, 0);
        assert_eq!(first.added.len(), zone.len());
        let far = BlockPos::new(3, 0, 0);
        assert!(zone.contains(&far));

        // Wall off the +x strip and wait out the cache window.
        view.fill(BlockPos::new(2, 0, -3), BlockPos::new(2, 2, 3), CellState::STONE);
        let second = engine.distribute(&view, &dim, &mut zone, 3, 500);

        assert!(second.released.contains(&far));
        assert_eq!(engine.get_owner(&dim, far), None);
        assert!(
            zone.cells()
                .iter()
                .all(|pos| engine.get_owner(&dim, *pos) == Some(emitter))
        );
    }

    #[test]
    fn test_shrink_and_deactivate_release_claims() {
        let view = room(BlockPos::new(-4, 0, -4), BlockPos::new(4, 3, 4));
        let dim = DimensionId::overworld();
        let emitter = EmitterPos::new(BlockPos::new(0, 1, 0));
        let mut engine = GravityEngine::default();
        let mut zone = Zone::new(emitter);

        engine.distribute(&view, &dim, &mut zone, 4, 0);
        let before = zone.len();
        assert!(before > 40);

        let shrunk = engine.shrink(&dim, &mut zone, 40);
        assert_eq!(zone.len(), 40);
        assert_eq!(shrunk.released.len(), before - 40);
        assert_eq!(engine.registry().claimed_count(&dim), 40);

        let gone = engine.deactivate(&dim, &mut zone);
        assert_eq!(gone.released.len(), 40);
        assert!(zone.is_empty());
        assert_eq!(engine.registry().claimed_count(&dim), 0);
    }

    #[test]
    fn test_tick_emitter_follows_schedule() {
        let view = room(BlockPos::new(-4, 0, -4), BlockPos::new(4, 3, 4));
        let dim = DimensionId::overworld();
        let emitter = EmitterPos::new(BlockPos::new(0, 1, 0));
        let config = ClaimConfig::default();
        let mut engine = AtmosphereEngine::new(config);
        let mut zone = Zone::new(emitter);
        let mut schedule = EmitterSchedule::new(emitter, &config);
        schedule.activate();

        let mut runs = 0;
        for now in 1..=schedule.run_every() {
            if engine
                .tick_emitter(&view, &dim, &mut zone, &mut schedule, Tick::from(now))
                .is_some()
            {
                runs += 1;
            }
        }

        assert_eq!(runs, 1);
        assert!(!zone.is_empty());
    }

    #[test]
    fn test_caches_are_per_dimension() {
        let view = SparseBlockView::default();
        let overworld = DimensionId::overworld();
        let moon = DimensionId::new("adastramekanized:moon");
        let emitter = EmitterPos::new(BlockPos::ORIGIN);
        let mut engine = AtmosphereEngine::default();

        engine.claim_area(&view, &overworld, emitter, 6, 200, 0);
        assert!(engine.cache_stats(&overworld).is_some());
        assert!(engine.cache_stats(&moon).is_none());

        engine.claim_area(&view, &moon, emitter, 6, 200, 0);
        assert_eq!(
            engine.cache_stats(&moon).map(|stats| stats.hits),
            Some(0)
        );

        engine.clear_dimension(&overworld);
        assert!(engine.cache_stats(&overworld).is_none());
        assert_eq!(engine.registry().claimed_count(&overworld), 0);
        assert_eq!(engine.registry().claimed_count(&moon), 200);
    }

    #[test]
    fn test_zone_grows_with_radius_inside_one_cache_window() {
        let mut view = room(BlockPos::new(-10, 0, -10), BlockPos::new(10, 4, 10));
        let emitter = EmitterPos::new(BlockPos::new(0, 1, 0));
        view.set(emitter.pos(), CellState::STONE);
        let dim = DimensionId::overworld();

        let mut engine = AtmosphereEngine::default();
        let mut zone = Zone::new(emitter);
        engine.distribute(&view, &dim, &mut zone, 3, 0);
        let small = zone.len();

        // Well inside the 100-tick window: nothing has expired.
        let grown = engine.distribute(&view, &dim, &mut zone, 6, 40);
        assert_eq!(engine.cache_stats(&dim).map(|stats| stats.expirations), Some(0));
        assert!(grown.released.is_empty());
        assert_eq!(grown.added.len(), zone.len() - small);

        let mut cold = AtmosphereEngine::default();
        let expected = cold.claim_area(&view, &dim, emitter, 6, 4100, 40);
        assert!(expected.len() > small);
        assert_eq!(zone.cells(), &expected);
    }

    #[test]
    fn test_shared_engine_partitions_across_threads() {
        let view = SparseBlockView::default();
        let dim = DimensionId::overworld();
        let shared = Arc::new(SharedClaimEngine::new(AtmosphereEngine::default()));
        let west = EmitterPos::new(BlockPos::ORIGIN);
        let east = EmitterPos::new(BlockPos::new(5, 0, 0));

        let (view, dim) = (&view, &dim);
        let (west_area, east_area) = thread::scope(|scope| {
            let claim = |emitter: EmitterPos| {
                let shared = Arc::clone(&shared);
                scope.spawn(move || shared.claim_area(view, dim, emitter, 5, 400, 0))
            };
            let west_handle = claim(west);
            let east_handle = claim(east);
            (west_handle.join().unwrap(), east_handle.join().unwrap())
        });

        assert!(!west_area.is_empty());
        assert!(!east_area.is_empty());
        assert!(west_area.iter().all(|pos| !east_area.contains(pos)));

        let engine = shared.lock();
        assert_eq!(
            engine.registry().claimed_count(dim),
            west_area.len() + east_area.len()
        );
        assert!(west_area.iter().all(|&pos| engine.get_owner(dim, pos) == Some(west)));
        assert!(east_area.iter().all(|&pos| engine.get_owner(dim, pos) == Some(east)));
    }

    #[test]
    fn test_shared_engine_claims_under_one_lock() {
        let view = SparseBlockView::default();
        let dim = DimensionId::overworld();
        let shared = SharedClaimEngine::new(AtmosphereEngine::default());
        let a = EmitterPos::new(BlockPos::ORIGIN);
        let b = EmitterPos::new(BlockPos::new(6, 0, 0));

        let first = shared.claim_area(&view, &dim, a, 4, 300, 0);
        let second = shared.claim_area(&view, &dim, b, 4, 300, 0);

        assert!(first.iter().all(|pos| !second.contains(pos)));
        assert_eq!(shared.get_owner(&dim, BlockPos::new(1, 0, 0)), Some(a));
        assert_eq!(shared.clear_all_for(&dim, a), first.len());
        assert_eq!(
            shared.into_inner().registry().claimed_count(&dim),
            second.len()
        );
    }
}
