#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic sweep policy that turns level grids into record commands.

use ladder_outline_core::{Command, Event, TileCoord, TileMap, TilePosition, LADDER_TILE_INDEX};

/// Number of frame ticks between level entry and the verification sweep.
pub const VERIFICATION_DELAY_TICKS: u32 = 30;

/// Collects the pixel positions of every ladder tile in the map.
///
/// All layers are visited column by column, top to bottom within each
/// column. Layers with truncated storage simply contribute fewer tiles. The
/// sweep is pure: the same grid always yields the same positions in the same
/// order.
#[must_use]
pub fn scan_map(map: &TileMap) -> Vec<TilePosition> {
    let mut positions = Vec::new();
    for layer in map.layers() {
        for column in 0..layer.width() {
            for row in 0..layer.height() {
                let tile = TileCoord::new(column, row);
                if layer.tile(tile) == Some(LADDER_TILE_INDEX) {
                    positions.push(TilePosition::from_tile(tile));
                }
            }
        }
    }
    positions
}

/// Pure system that schedules grid sweeps around level transitions.
///
/// Every [`Event::LevelEntered`] triggers an immediate entry sweep and arms a
/// tick counter; once [`VERIFICATION_DELAY_TICKS`] ticks have elapsed the map
/// is swept one more time. The verification sweep exists because hosts may
/// publish a level before its grid is fully populated, so the entry sweep can
/// run against an incomplete map. It fires exactly once per level.
#[derive(Debug)]
pub struct Scanning {
    awaiting_verification: bool,
    ticks_observed: u32,
}

impl Scanning {
    /// Creates a system that idles until the first level entry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            awaiting_verification: false,
            ticks_observed: 0,
        }
    }

    /// Consumes events and the live level grid to emit record commands.
    pub fn handle(&mut self, events: &[Event], map: &TileMap, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::LevelEntered { .. } => {
                    self.awaiting_verification = true;
                    self.ticks_observed = 0;
                    push_sweep(map, out);
                }
                Event::TimeAdvanced { .. } => {
                    if !self.awaiting_verification {
                        continue;
                    }
                    self.ticks_observed = self.ticks_observed.saturating_add(1);
                    if self.ticks_observed >= VERIFICATION_DELAY_TICKS {
                        self.awaiting_verification = false;
                        push_sweep(map, out);
                    }
                }
                _ => {}
            }
        }
    }
}

impl Default for Scanning {
    fn default() -> Self {
        Self::new()
    }
}

fn push_sweep(map: &TileMap, out: &mut Vec<Command>) {
    for position in scan_map(map) {
        out.push(Command::RecordLadder { position });
    }
}
