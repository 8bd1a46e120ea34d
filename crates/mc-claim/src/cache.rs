//! Windowed memo of path search results.
//!
//! Entries are never invalidated individually. Once more than `window` ticks
//! have passed since the last clear, the whole cache is dropped. A wall placed
//! or removed mid-window is therefore only seen after the next clear.
//!
//! The search bound is not part of the key, but each entry remembers the
//! bound it was answered under. A connection found within `n` steps holds for
//! any bound of at least `n`; a miss holds for any bound of at most `n`.
//! Anything else is searched again.

use tracing::debug;

use crate::passability::Classifier;
use crate::path::{PathQuery, has_path};
use crate::pos::{BlockPos, DimensionId, EmitterPos};
use crate::registry::Ownership;
use crate::view::{BlockView, Terrain};
use crate::{FxMap, Tick};

/// Cache key. The search bound lives in [`CachedPath`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathKey {
    pub from: BlockPos,
    pub to: BlockPos,
    pub emitter: EmitterPos,
}

impl From<&PathQuery> for PathKey {
    fn from(query: &PathQuery) -> Self {
        Self {
            from: query.from,
            to: query.to,
            emitter: query.emitter,
        }
    }
}

/// A stored answer and the bound it was computed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachedPath {
    pub connected: bool,
    pub max_distance: u32,
}

impl CachedPath {
    /// The answer for a search bounded by `max_distance`, if this entry
    /// decides it.
    #[must_use]
    pub fn answer(self, max_distance: u32) -> Option<bool> {
        let decided = if self.connected {
            max_distance >= self.max_distance
        } else {
            max_distance <= self.max_distance
        };
        decided.then_some(self.connected)
    }
}

/// Counters since the cache was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Window expiries, not manual clears.
    pub expirations: u64,
}

/// Path results for one dimension, valid for one tick window.
#[derive(Clone, Debug)]
pub struct PathCache {
    entries: FxMap<PathKey, CachedPath>,
    window: Tick,
    last_cleared: Tick,
    stats: CacheStats,
}

impl PathCache {
    /// Reference window length in ticks.
    pub const DEFAULT_WINDOW: Tick = 100;

    #[must_use]
    pub fn new(window: Tick) -> Self {
        Self {
            entries: FxMap::default(),
            window,
            last_cleared: 0,
            stats: CacheStats::default(),
        }
    }

    /// Drop everything if the window has elapsed at `now`.
    ///
    /// Returns whether the cache was cleared.
    pub fn expire(&mut self, now: Tick) -> bool {
        if now.saturating_sub(self.last_cleared) <= self.window {
            return false;
        }

        debug!(
            "Cleared {} cached paths after {} ticks",
            self.entries.len(),
            self.window
        );
        self.entries.clear();
        self.last_cleared = now;
        self.stats.expirations += 1;
        true
    }

    /// [`has_path`], memoized until the window elapses.
    pub fn cached_has_path<V, C, R>(
        &mut self,
        terrain: Terrain<'_, V, C>,
        registry: &R,
        dimension: &DimensionId,
        query: &PathQuery,
        now: Tick,
    ) -> bool
    where
        V: BlockView + ?Sized,
        C: Classifier + ?Sized,
        R: Ownership + ?Sized,
    {
        self.expire(now);

        if query.from == query.to {
            return true;
        }

        let key = PathKey::from(query);
        if let Some(connected) = self.get(&key, query.max_distance) {
            self.stats.hits += 1;
            return connected;
        }

        self.stats.misses += 1;
        let connected = has_path(terrain, registry, dimension, query);
        self.entries.insert(
            key,
            CachedPath {
                connected,
                max_distance: query.max_distance,
            },
        );
        connected
    }

    /// Cached answer for `key` under `max_distance`, if the stored entry
    /// decides it.
    #[must_use]
    pub fn get(&self, key: &PathKey, max_distance: u32) -> Option<bool> {
        self.entries.get(key)?.answer(max_distance)
    }

    /// Drop every entry without touching the window timer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn window(&self) -> Tick {
        self.window
    }

    #[must_use]
    pub fn last_cleared(&self) -> Tick {
        self.last_cleared
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}
