#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative ladder-tracking state.
//!
//! The world owns the set of discovered ladder positions and the queue of
//! deferred host notifications for the active level. All mutation flows
//! through [`apply`], which emits [`Event`] values describing what actually
//! changed; adapters and systems read back through [`query`].

mod queue;
mod registry;

use ladder_outline_core::{Command, DiscoverySource, Event, LevelId, TilePosition};

use crate::{queue::DiscoveryQueue, registry::LadderRegistry};

/// Represents the authoritative tracker state for one level at a time.
#[derive(Debug)]
pub struct World {
    level: LevelId,
    registry: LadderRegistry,
    queue: DiscoveryQueue,
    tick_index: u64,
}

impl World {
    /// Creates a tracker with no level entered and nothing tracked.
    #[must_use]
    pub fn new() -> Self {
        Self {
            level: LevelId::new(0),
            registry: LadderRegistry::new(),
            queue: DiscoveryQueue::new(),
            tick_index: 0,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the tracker, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::EnterLevel { level } => {
            world.level = level;
            world.registry.reset();
            world.queue.reset();
            world.tick_index = 0;
            out_events.push(Event::LevelEntered { level });
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::Pulse => {
            if let Some((tile, _kind)) = world.queue.tick() {
                let position = TilePosition::from_tile(tile);
                if world.registry.add(position) {
                    out_events.push(Event::LadderFound {
                        position,
                        source: DiscoverySource::Notification,
                    });
                }
            }
        }
        Command::RecordLadder { position } => {
            if world.registry.add(position) {
                out_events.push(Event::LadderFound {
                    position,
                    source: DiscoverySource::Scan,
                });
            }
        }
        Command::ReportLadder { tile, kind } => {
            let _ = world.queue.enqueue(tile, kind);
        }
    }
}

/// Query functions that provide read-only access to the tracker state.
pub mod query {
    use super::World;
    use ladder_outline_core::{LevelId, TilePosition};

    /// Identifier of the level the tracker currently follows.
    #[must_use]
    pub fn level(world: &World) -> LevelId {
        world.level
    }

    /// Number of frame ticks observed since the current level was entered.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Number of host notifications still waiting to drain.
    #[must_use]
    pub fn pending_discoveries(world: &World) -> usize {
        world.queue.len()
    }

    /// Captures a read-only view of the tracked ladder positions.
    #[must_use]
    pub fn ladder_view(world: &World) -> LadderView {
        let mut positions: Vec<TilePosition> = world.registry.positions().collect();
        positions.sort_by_key(|position| (position.y(), position.x()));
        LadderView { positions }
    }

    /// Read-only snapshot of the tracked ladder positions in row-major order.
    #[derive(Clone, Debug)]
    pub struct LadderView {
        positions: Vec<TilePosition>,
    }

    impl LadderView {
        /// Iterator over the tracked positions in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &TilePosition> {
            self.positions.iter()
        }

        /// Number of tracked positions.
        #[must_use]
        pub fn len(&self) -> usize {
            self.positions.len()
        }

        /// Reports whether nothing is tracked.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.positions.is_empty()
        }

        /// Consumes the view, yielding the underlying positions.
        #[must_use]
        pub fn into_vec(self) -> Vec<TilePosition> {
            self.positions
        }
    }
}
