//! Read access to the block grid.

use crate::FxMap;
use crate::passability::{CellState, Classifier, Passability};
use crate::pos::BlockPos;

/// The grid query service: what occupies a given cell.
pub trait BlockView {
    fn cell_state(&self, pos: BlockPos) -> CellState;
}

impl<F> BlockView for F
where
    F: Fn(BlockPos) -> CellState,
{
    fn cell_state(&self, pos: BlockPos) -> CellState {
        self(pos)
    }
}

/// Sparse in-memory grid: explicit cells over a uniform fallback.
///
/// Used by hosts that mirror a handful of loaded chunks, and by tests.
#[derive(Clone, Debug)]
pub struct SparseBlockView {
    cells: FxMap<BlockPos, CellState>,
    fallback: CellState,
}

impl SparseBlockView {
    /// Grid where every unset cell reads as `fallback`.
    #[must_use]
    pub fn new(fallback: CellState) -> Self {
        Self {
            cells: FxMap::default(),
            fallback,
        }
    }

    /// Set one cell, returning its previous explicit state.
    pub fn set(&mut self, pos: BlockPos, state: CellState) -> Option<CellState> {
        self.cells.insert(pos, state)
    }

    /// Forget an explicit cell so it reads as the fallback again.
    pub fn reset(&mut self, pos: BlockPos) -> Option<CellState> {
        self.cells.remove(&pos)
    }

    /// Set every cell in the inclusive box spanned by `a` and `b`.
    pub fn fill(&mut self, a: BlockPos, b: BlockPos, state: CellState) {
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    self.cells.insert(BlockPos::new(x, y, z), state);
                }
            }
        }
    }

    #[must_use]
    pub fn fallback(&self) -> CellState {
        self.fallback
    }

    /// Number of explicitly set cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Default for SparseBlockView {
    fn default() -> Self {
        Self::new(CellState::AIR)
    }
}

impl BlockView for SparseBlockView {
    fn cell_state(&self, pos: BlockPos) -> CellState {
        self.cells.get(&pos).copied().unwrap_or(self.fallback)
    }
}

/// A block view paired with the classifier that interprets it.
///
/// This is the single classification path for both claiming and path search.
pub struct Terrain<'a, V: ?Sized, C: ?Sized> {
    view: &'a V,
    classifier: &'a C,
}

impl<'a, V, C> Terrain<'a, V, C>
where
    V: BlockView + ?Sized,
    C: Classifier + ?Sized,
{
    #[must_use]
    pub const fn new(view: &'a V, classifier: &'a C) -> Self {
        Self { view, classifier }
    }

    /// Classify the cell at `pos`.
    #[must_use]
    pub fn classify(&self, pos: BlockPos) -> Passability {
        self.classifier.classify(&self.view.cell_state(pos))
    }
}

impl<V: ?Sized, C: ?Sized> Clone for Terrain<'_, V, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V: ?Sized, C: ?Sized> Copy for Terrain<'_, V, C> {}
