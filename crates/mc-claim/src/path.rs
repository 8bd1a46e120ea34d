//! Bounded A* connectivity check.
//!
//! Answers "can the effect travel from here to there" without filling through
//! walls or through space another emitter already controls.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::FxSet;
use crate::passability::Classifier;
use crate::pos::{BlockPos, DimensionId, EmitterPos};
use crate::registry::Ownership;
use crate::view::{BlockView, Terrain};

/// One connectivity question. Also the path cache key, minus `max_distance`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathQuery {
    pub from: BlockPos,
    pub to: BlockPos,
    /// Emitter doing the search. Its own claims are open ground.
    pub emitter: EmitterPos,
    /// Longest path, in unit steps, that still counts as connected.
    pub max_distance: u32,
}

impl PathQuery {
    /// Query from the emitter's own block to `to`.
    #[must_use]
    pub const fn from_emitter(emitter: EmitterPos, to: BlockPos, max_distance: u32) -> Self {
        Self {
            from: emitter.pos(),
            to,
            emitter,
            max_distance,
        }
    }
}

/// Whether `to` is reachable from `from` in at most `max_distance` face steps.
///
/// A step may enter a cell unless it blocks or is owned by another emitter.
/// The starting cell itself is never tested.
pub fn has_path<V, C, R>(
    terrain: Terrain<'_, V, C>,
    registry: &R,
    dimension: &DimensionId,
    query: &PathQuery,
) -> bool
where
    V: BlockView + ?Sized,
    C: Classifier + ?Sized,
    R: Ownership + ?Sized,
{
    let PathQuery {
        from,
        to,
        emitter,
        max_distance,
    } = *query;

    if from == to {
        return true;
    }

    if from.manhattan(to) > max_distance {
        trace!("{} out of search range of {} ({})", to, from, max_distance);
        return false;
    }

    let mut open = BinaryHeap::new();
    let mut closed = FxSet::default();
    let mut seq = 0_u64;

    open.push(OpenNode {
        estimate: from.manhattan(to),
        cost: 0,
        seq,
        pos: from,
    });

    while let Some(node) = open.pop() {
        if node.pos == to {
            return true;
        }

        if !closed.insert(node.pos) {
            continue;
        }

        let cost = node.cost + 1;
        if cost > max_distance {
            continue;
        }

        for neighbor in node.pos.neighbors() {
            if closed.contains(&neighbor) {
                continue;
            }

            let estimate = cost + neighbor.manhattan(to);
            if estimate > max_distance {
                continue;
            }

            if registry.is_foreign(dimension, neighbor, emitter) {
                continue;
            }

            if terrain.classify(neighbor).is_blocking() {
                continue;
            }

            seq += 1;
            open.push(OpenNode {
                estimate,
                cost,
                seq,
                pos: neighbor,
            });
        }
    }

    false
}

/// Open-set entry. Lowest estimate first; among equals, the deeper node, then
/// the earlier one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenNode {
    estimate: u32,
    cost: u32,
    seq: u64,
    pos: BlockPos,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| self.cost.cmp(&other.cost))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
