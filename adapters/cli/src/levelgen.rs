//! Seeded synthetic mine levels hosting the overlay.

use crate::level_code::{BacklogEntry, LevelCode};
use ladder_outline_core::{
    LadderDiscovery, LadderKind, LevelId, TileCoord, TileIndex, TileLayer, TileMap,
    LADDER_TILE_INDEX,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Identifier of the layer carrying rock and floor tiles.
pub(crate) const BACK_LAYER: &str = "Back";
/// Identifier of the layer carrying ladder tiles.
pub(crate) const BUILDINGS_LAYER: &str = "Buildings";

/// Tile index standing for solid rock on the back layer.
pub(crate) const ROCK_TILE_INDEX: TileIndex = TileIndex::new(1);
/// Tile index standing for walkable floor on the back layer.
pub(crate) const FLOOR_TILE_INDEX: TileIndex = TileIndex::new(2);

const DEFAULT_COLUMNS: u32 = 15;
const DEFAULT_ROWS: u32 = 12;

const LAYER_SALT: u64 = 0x4C_41_59;
const PLACEMENT_SALT: u64 = 0x50_4C_43;
const DIG_SALT: u64 = 0x44_49_47;

/// One mine level with its grid, discovery backlog, and dig state.
///
/// Levels are fully determined by `(seed, level id, dimensions)`: the layer
/// fill, ladder placement, and every subsequent dig choice replay identically,
/// which is what makes level codes reproducible.
pub(crate) struct MineLevel {
    id: LevelId,
    seed: u64,
    columns: u32,
    rows: u32,
    map: TileMap,
    placed: Vec<TileCoord>,
    backlog: Vec<(TileCoord, LadderKind)>,
    observer: Option<Box<dyn FnMut(TileCoord, LadderKind)>>,
    dig_rng: ChaCha8Rng,
}

impl MineLevel {
    /// Generates a level with the default grid dimensions.
    pub(crate) fn generate(id: LevelId, seed: u64) -> Self {
        Self::generate_sized(id, seed, DEFAULT_COLUMNS, DEFAULT_ROWS)
    }

    /// Rebuilds the level described by a decoded share code.
    pub(crate) fn from_code(id: LevelId, code: &LevelCode) -> Self {
        let backlog = code
            .backlog
            .iter()
            .map(|entry| (entry.tile, entry.kind))
            .collect();
        Self::compose(
            id,
            code.seed,
            code.columns,
            code.rows,
            code.ladders.clone(),
            backlog,
        )
    }

    /// Generates the level one floor below this one.
    pub(crate) fn descend(&self) -> Self {
        Self::generate_sized(
            LevelId::new(self.id.get().saturating_add(1)),
            self.seed,
            self.columns,
            self.rows,
        )
    }

    /// Converts one random rock tile into a ladder tile.
    ///
    /// The creation is delivered to the subscribed observer, or stored in the
    /// backlog when no observer is attached yet. Returns `None` once no rock
    /// remains to dig through.
    pub(crate) fn dig(&mut self) -> Option<(TileCoord, LadderKind)> {
        let back = self.map.layer(BACK_LAYER)?;
        let buildings = self.map.layer(BUILDINGS_LAYER)?;

        let mut candidates = Vec::new();
        for column in 0..buildings.width() {
            for row in 0..buildings.height() {
                let tile = TileCoord::new(column, row);
                if buildings.tile(tile).is_none() && back.tile(tile) == Some(ROCK_TILE_INDEX) {
                    candidates.push(tile);
                }
            }
        }
        if candidates.is_empty() {
            return None;
        }

        let tile = candidates[self.dig_rng.gen_range(0..candidates.len())];
        let kind = if self.dig_rng.gen_ratio(1, 4) {
            LadderKind::Shaft
        } else {
            LadderKind::Ladder
        };
        if !self.map.set_tile(BUILDINGS_LAYER, tile, Some(LADDER_TILE_INDEX)) {
            return None;
        }

        match self.observer.as_mut() {
            Some(observer) => observer(tile, kind),
            None => self.backlog.push((tile, kind)),
        }
        Some((tile, kind))
    }

    /// Captures the level as generated so it can be shared and replayed.
    pub(crate) fn share_code(&self) -> LevelCode {
        LevelCode {
            columns: self.columns,
            rows: self.rows,
            seed: self.seed,
            ladders: self.placed.clone(),
            backlog: self
                .backlog
                .iter()
                .map(|(tile, kind)| BacklogEntry {
                    tile: *tile,
                    kind: *kind,
                })
                .collect(),
        }
    }

    /// Identifier of this level.
    pub(crate) fn id(&self) -> LevelId {
        self.id
    }

    /// Grid the scanning system sweeps.
    pub(crate) fn map(&self) -> &TileMap {
        &self.map
    }

    /// Number of tile columns in the grid.
    pub(crate) fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows in the grid.
    pub(crate) fn rows(&self) -> u32 {
        self.rows
    }

    fn generate_sized(id: LevelId, seed: u64, columns: u32, rows: u32) -> Self {
        let mut placement_rng = stream(seed, id, PLACEMENT_SALT);
        let mut taken = Vec::new();

        let placed_count: usize = placement_rng.gen_range(1..=3);
        let placed = pick_distinct(&mut placement_rng, columns, rows, placed_count, &mut taken);

        let backlog_count: usize = placement_rng.gen_range(0..=2);
        let backlog = pick_distinct(&mut placement_rng, columns, rows, backlog_count, &mut taken)
            .into_iter()
            .map(|tile| {
                let kind = if placement_rng.gen_ratio(1, 4) {
                    LadderKind::Shaft
                } else {
                    LadderKind::Ladder
                };
                (tile, kind)
            })
            .collect();

        Self::compose(id, seed, columns, rows, placed, backlog)
    }

    fn compose(
        id: LevelId,
        seed: u64,
        columns: u32,
        rows: u32,
        placed: Vec<TileCoord>,
        backlog: Vec<(TileCoord, LadderKind)>,
    ) -> Self {
        let mut fill_rng = stream(seed, id, LAYER_SALT);
        let tile_count = (columns as usize).saturating_mul(rows as usize);
        let mut back_tiles = Vec::with_capacity(tile_count);
        for _ in 0..tile_count {
            let index = if fill_rng.gen_ratio(5, 8) {
                ROCK_TILE_INDEX
            } else {
                FLOOR_TILE_INDEX
            };
            back_tiles.push(Some(index));
        }
        let back = TileLayer::new(BACK_LAYER.to_owned(), columns, rows, back_tiles);

        let mut buildings = TileLayer::empty(BUILDINGS_LAYER.to_owned(), columns, rows);
        // Backlog openings were already dug into the grid when they were
        // recorded, so they are stamped the same way as placed ladders.
        for tile in placed.iter().chain(backlog.iter().map(|(tile, _)| tile)) {
            let _ = buildings.set_tile(*tile, Some(LADDER_TILE_INDEX));
        }

        Self {
            id,
            seed,
            columns,
            rows,
            map: TileMap::new(vec![back, buildings]),
            placed,
            backlog,
            observer: None,
            dig_rng: stream(seed, id, DIG_SALT),
        }
    }
}

impl LadderDiscovery for MineLevel {
    fn backlog(&self) -> Vec<(TileCoord, LadderKind)> {
        self.backlog.clone()
    }

    fn subscribe(&mut self, observer: Box<dyn FnMut(TileCoord, LadderKind)>) {
        self.observer = Some(observer);
    }
}

fn stream(seed: u64, id: LevelId, salt: u64) -> ChaCha8Rng {
    let mixed = seed ^ u64::from(id.get()).wrapping_mul(0x9E37_79B9_97F4_A7C5) ^ salt;
    ChaCha8Rng::seed_from_u64(mixed)
}

fn pick_distinct(
    rng: &mut ChaCha8Rng,
    columns: u32,
    rows: u32,
    count: usize,
    taken: &mut Vec<TileCoord>,
) -> Vec<TileCoord> {
    // Cap the request at the free cells left so sampling terminates on
    // grids smaller than the placement demand.
    let free = (columns as usize)
        .saturating_mul(rows as usize)
        .saturating_sub(taken.len());
    let count = count.min(free);
    let mut picked = Vec::with_capacity(count);
    while picked.len() < count {
        let tile = TileCoord::new(rng.gen_range(0..columns), rng.gen_range(0..rows));
        if taken.contains(&tile) {
            continue;
        }
        taken.push(tile);
        picked.push(tile);
    }
    picked
}
