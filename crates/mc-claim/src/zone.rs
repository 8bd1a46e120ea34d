//! An emitter's current territory, as tracked by its host.

use crate::FxMap;
use crate::claim::ClaimedArea;
use crate::pos::{BlockPos, EmitterPos};

/// Cells an emitter currently controls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Zone {
    emitter: EmitterPos,
    cells: ClaimedArea,
}

impl Zone {
    #[must_use]
    pub fn new(emitter: EmitterPos) -> Self {
        Self {
            emitter,
            cells: ClaimedArea::new(),
        }
    }

    #[must_use]
    pub fn emitter(&self) -> EmitterPos {
        self.emitter
    }

    #[must_use]
    pub fn cells(&self) -> &ClaimedArea {
        &self.cells
    }

    #[must_use]
    pub fn contains(&self, pos: &BlockPos) -> bool {
        self.cells.contains(pos)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Replace the zone with `next`, returning what changed.
    pub fn replace(&mut self, next: ClaimedArea) -> ZoneDelta {
        let released = self
            .cells
            .iter()
            .filter(|pos| !next.contains(pos))
            .copied()
            .collect();
        let added = next
            .iter()
            .filter(|pos| !self.cells.contains(pos))
            .copied()
            .collect();

        self.cells = next;
        ZoneDelta { added, released }
    }
}

/// What a zone update changed. The host applies its effect to `added` and
/// removes it from `released`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoneDelta {
    pub added: Vec<BlockPos>,
    pub released: Vec<BlockPos>,
}

impl ZoneDelta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.released.is_empty()
    }
}

/// Pick the `target` cells worth keeping when a zone has to contract.
///
/// Cells with more claimed face neighbors win; ties go to the one closer to
/// the emitter, then to the earlier claim. The result is in keep-priority
/// order.
#[must_use]
pub fn trim_edges(cells: &ClaimedArea, emitter: EmitterPos, target: usize) -> Vec<BlockPos> {
    if cells.len() <= target {
        return cells.as_slice().to_vec();
    }

    let origin = emitter.pos();
    let neighbor_counts: FxMap<BlockPos, usize> = cells
        .iter()
        .map(|&pos| {
            let count = pos.neighbors().filter(|n| cells.contains(n)).count();
            (pos, count)
        })
        .collect();

    let mut ranked = cells.as_slice().to_vec();
    ranked.sort_by(|a, b| {
        neighbor_counts[b]
            .cmp(&neighbor_counts[a])
            .then_with(|| a.distance_squared(origin).cmp(&b.distance_squared(origin)))
    });
    ranked.truncate(target);
    ranked
}
