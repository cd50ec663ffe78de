//! Deferred delivery of host ladder notifications.

use std::collections::VecDeque;

use ladder_outline_core::{LadderKind, TileCoord};

/// Ordered queue of ladder notifications awaiting absorption.
///
/// The queue drains at most one entry per pulse, and the first pulse after a
/// reset drains nothing at all: it merely arms the queue, granting the entry
/// sweep one full pulse to settle before notifications start landing.
#[derive(Debug, Default)]
pub(crate) struct DiscoveryQueue {
    entries: VecDeque<(TileCoord, LadderKind)>,
    armed: bool,
}

impl DiscoveryQueue {
    /// Creates an empty, disarmed queue.
    pub(crate) fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            armed: false,
        }
    }

    /// Appends a notification unless the tile is already queued.
    pub(crate) fn enqueue(&mut self, tile: TileCoord, kind: LadderKind) -> bool {
        if self.entries.iter().any(|(queued, _)| *queued == tile) {
            return false;
        }
        self.entries.push_back((tile, kind));
        true
    }

    /// Advances the queue by one pulse.
    ///
    /// The first pulse after a reset arms the queue and yields nothing; every
    /// later pulse yields the oldest entry, if one exists.
    pub(crate) fn tick(&mut self) -> Option<(TileCoord, LadderKind)> {
        if !self.armed {
            self.armed = true;
            return None;
        }
        self.entries.pop_front()
    }

    /// Number of notifications still waiting to drain.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Discards all entries and disarms the queue.
    pub(crate) fn reset(&mut self) {
        self.entries.clear();
        self.armed = false;
    }
}
