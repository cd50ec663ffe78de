//! Unique-position bookkeeping for tracked ladders.

use std::collections::HashSet;

use ladder_outline_core::TilePosition;

/// Set of ladder positions tracked for the active level.
///
/// Insertion is idempotent: a position reports `true` at most once between
/// resets, which is what keeps repeated sweeps from re-announcing ladders.
#[derive(Debug, Default)]
pub(crate) struct LadderRegistry {
    positions: HashSet<TilePosition>,
}

impl LadderRegistry {
    /// Creates an empty registry.
    pub(crate) fn new() -> Self {
        Self {
            positions: HashSet::new(),
        }
    }

    /// Inserts a position, reporting whether it was previously untracked.
    pub(crate) fn add(&mut self, position: TilePosition) -> bool {
        self.positions.insert(position)
    }

    /// Iterates over the tracked positions in arbitrary order.
    pub(crate) fn positions(&self) -> impl Iterator<Item = TilePosition> + '_ {
        self.positions.iter().copied()
    }

    /// Forgets every tracked position.
    pub(crate) fn reset(&mut self) {
        self.positions.clear();
    }
}
