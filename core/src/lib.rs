#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the ladder outline tracker.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative tracker, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the tracker executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Side length of one map tile measured in pixel units.
pub const TILE_LENGTH: i32 = 64;

/// Tile-sheet index that marks a cell as containing a ladder.
pub const LADDER_TILE_INDEX: TileIndex = TileIndex::new(173);

/// Commands that express all permissible tracker mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Announces that the host moved the player onto a different level.
    EnterLevel {
        /// Level that became active.
        level: LevelId,
    },
    /// Advances the tracker clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Delivers one slow heartbeat, draining at most one deferred discovery.
    Pulse,
    /// Records a ladder located by sweeping the level grid.
    RecordLadder {
        /// Pixel position of the discovered ladder tile.
        position: TilePosition,
    },
    /// Defers a host notification about a freshly created ladder.
    ReportLadder {
        /// Grid cell the ladder appeared in.
        tile: TileCoord,
        /// Whether the opening is a plain ladder or a shaft.
        kind: LadderKind,
    },
}

/// Events broadcast by the tracker after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the tracker reset for a newly entered level.
    LevelEntered {
        /// Level that became active.
        level: LevelId,
    },
    /// Indicates that the tracker clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces a ladder position that was not previously tracked.
    LadderFound {
        /// Pixel position of the newly tracked ladder.
        position: TilePosition,
        /// Which detection path produced the position.
        source: DiscoverySource,
    },
}

/// Detection path that produced a tracked ladder position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiscoverySource {
    /// The position came out of a full sweep of the level grid.
    Scan,
    /// The position arrived as a deferred host notification.
    Notification,
}

/// Kinds of downward openings a host can announce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LadderKind {
    /// A ladder descending a single level.
    Ladder,
    /// A shaft dropping several levels at once.
    Shaft,
}

/// Identifier of a mine level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(u32);

impl LevelId {
    /// Creates a new level identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index into the tile sheet backing a map layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex(u32);

impl TileIndex {
    /// Creates a new tile-sheet index wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying sheet index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Position of a tile expressed in pixel units.
///
/// Two positions compare equal exactly when they name the same tile, which
/// makes the type usable as a set key for deduplicating discoveries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePosition {
    x: i32,
    y: i32,
}

impl TilePosition {
    /// Creates a position from explicit pixel coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Scales a grid cell into its pixel position.
    #[must_use]
    pub const fn from_tile(tile: TileCoord) -> Self {
        Self {
            x: tile.column() as i32 * TILE_LENGTH,
            y: tile.row() as i32 * TILE_LENGTH,
        }
    }

    /// Horizontal pixel coordinate of the tile's upper-left corner.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical pixel coordinate of the tile's upper-left corner.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

/// One named layer of a level grid.
///
/// Hosts deliver layer contents as-is; the accessor tolerates storage that is
/// shorter than `width * height` by reporting the missing cells as empty, so
/// malformed host data degrades to skipped tiles rather than a panic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayer {
    id: String,
    width: u32,
    height: u32,
    tiles: Vec<Option<TileIndex>>,
}

impl TileLayer {
    /// Creates a layer from raw host data without validating the storage.
    #[must_use]
    pub fn new(id: String, width: u32, height: u32, tiles: Vec<Option<TileIndex>>) -> Self {
        Self {
            id,
            width,
            height,
            tiles,
        }
    }

    /// Creates an empty layer of the given dimensions.
    #[must_use]
    pub fn empty(id: String, width: u32, height: u32) -> Self {
        let cells = (width as usize).saturating_mul(height as usize);
        Self {
            id,
            width,
            height,
            tiles: vec![None; cells],
        }
    }

    /// Name the host assigned to the layer.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of columns the layer spans.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows the layer spans.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the tile stored at the provided cell, if any.
    #[must_use]
    pub fn tile(&self, tile: TileCoord) -> Option<TileIndex> {
        self.index(tile)
            .and_then(|index| self.tiles.get(index).copied().flatten())
    }

    /// Stores a tile at the provided cell.
    ///
    /// Returns `false` when the cell lies outside the layer's declared
    /// dimensions or beyond the actual storage, leaving the layer unchanged.
    pub fn set_tile(&mut self, tile: TileCoord, index: Option<TileIndex>) -> bool {
        match self.index(tile) {
            Some(slot) if slot < self.tiles.len() => {
                self.tiles[slot] = index;
                true
            }
            _ => false,
        }
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        if tile.column() < self.width && tile.row() < self.height {
            let row = usize::try_from(tile.row()).ok()?;
            let column = usize::try_from(tile.column()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Layered level grid delivered by the host for sweeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileMap {
    layers: Vec<TileLayer>,
}

impl TileMap {
    /// Creates a map from the provided layers.
    #[must_use]
    pub fn new(layers: Vec<TileLayer>) -> Self {
        Self { layers }
    }

    /// Layers composing the map, in host order.
    #[must_use]
    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    /// Looks up a layer by its host-assigned name.
    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&TileLayer> {
        self.layers.iter().find(|layer| layer.id() == id)
    }

    /// Stores a tile into the named layer.
    ///
    /// Returns `false` when no such layer exists or the cell is unwritable.
    pub fn set_tile(&mut self, layer_id: &str, tile: TileCoord, index: Option<TileIndex>) -> bool {
        self.layers
            .iter_mut()
            .find(|layer| layer.id() == layer_id)
            .map_or(false, |layer| layer.set_tile(tile, index))
    }
}

/// Capability hosts implement to announce ladders created after level entry.
///
/// Sweeping only sees tiles that already sit in the grid; ladders spawned by
/// gameplay reach the tracker through this channel instead. The backlog covers
/// creations that happened before the observer attached.
pub trait LadderDiscovery {
    /// Ladder creations recorded before any observer was attached.
    fn backlog(&self) -> Vec<(TileCoord, LadderKind)>;

    /// Registers an observer invoked once per subsequently created ladder.
    fn subscribe(&mut self, observer: Box<dyn FnMut(TileCoord, LadderKind)>);
}

#[cfg(test)]
mod tests {
    use super::{LadderKind, LevelId, TileCoord, TileIndex, TileLayer, TileMap, TilePosition};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn tile_position_scales_cells_by_tile_length() {
        let position = TilePosition::from_tile(TileCoord::new(3, 4));
        assert_eq!(position, TilePosition::new(192, 256));
    }

    #[test]
    fn tile_position_round_trips_through_bincode() {
        assert_round_trip(&TilePosition::new(192, 256));
    }

    #[test]
    fn tile_coord_round_trips_through_bincode() {
        assert_round_trip(&TileCoord::new(7, 11));
    }

    #[test]
    fn ladder_kind_round_trips_through_bincode() {
        assert_round_trip(&LadderKind::Shaft);
    }

    #[test]
    fn level_id_round_trips_through_bincode() {
        assert_round_trip(&LevelId::new(120));
    }

    #[test]
    fn layer_reports_stored_tiles() {
        let mut layer = TileLayer::empty("buildings".to_owned(), 4, 3);
        assert!(layer.set_tile(TileCoord::new(2, 1), Some(TileIndex::new(173))));
        assert_eq!(layer.tile(TileCoord::new(2, 1)), Some(TileIndex::new(173)));
        assert_eq!(layer.tile(TileCoord::new(1, 2)), None);
    }

    #[test]
    fn layer_rejects_writes_outside_declared_bounds() {
        let mut layer = TileLayer::empty("buildings".to_owned(), 2, 2);
        assert!(!layer.set_tile(TileCoord::new(2, 0), Some(TileIndex::new(1))));
        assert!(!layer.set_tile(TileCoord::new(0, 2), Some(TileIndex::new(1))));
    }

    #[test]
    fn layer_with_short_storage_yields_empty_cells() {
        let tiles = vec![Some(TileIndex::new(173)), None];
        let layer = TileLayer::new("buildings".to_owned(), 2, 2, tiles);
        assert_eq!(layer.tile(TileCoord::new(0, 0)), Some(TileIndex::new(173)));
        assert_eq!(layer.tile(TileCoord::new(0, 1)), None);
        assert_eq!(layer.tile(TileCoord::new(1, 1)), None);
    }

    #[test]
    fn layer_with_short_storage_rejects_writes_into_missing_cells() {
        let mut layer = TileLayer::new("buildings".to_owned(), 2, 2, vec![None]);
        assert!(!layer.set_tile(TileCoord::new(1, 1), Some(TileIndex::new(1))));
        assert_eq!(layer.tile(TileCoord::new(1, 1)), None);
    }

    #[test]
    fn map_routes_writes_to_the_named_layer() {
        let mut map = TileMap::new(vec![
            TileLayer::empty("back".to_owned(), 3, 3),
            TileLayer::empty("buildings".to_owned(), 3, 3),
        ]);
        assert!(map.set_tile("buildings", TileCoord::new(1, 1), Some(TileIndex::new(173))));
        assert!(!map.set_tile("paths", TileCoord::new(1, 1), Some(TileIndex::new(173))));

        let back = map.layer("back").expect("back layer");
        assert_eq!(back.tile(TileCoord::new(1, 1)), None);
        let buildings = map.layer("buildings").expect("buildings layer");
        assert_eq!(
            buildings.tile(TileCoord::new(1, 1)),
            Some(TileIndex::new(173))
        );
    }
}
