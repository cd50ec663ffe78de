//! Single-line share strings that reproduce a generated mine level.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use ladder_outline_core::{LadderKind, TileCoord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CODE_DOMAIN: &str = "mine";
const CODE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded level payload.
pub(crate) const CODE_HEADER: &str = "mine:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';
/// Upper bound either grid dimension may declare in a decoded level.
const MAX_GRID_DIMENSION: u32 = 1024;

/// Everything needed to rebuild a mine level exactly as it was generated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LevelCode {
    /// Number of tile columns contained in the level grid.
    pub columns: u32,
    /// Number of tile rows contained in the level grid.
    pub rows: u32,
    /// Seed driving the deterministic layer fill and dig choices.
    pub seed: u64,
    /// Cells carrying a ladder tile from the moment the level loads.
    pub ladders: Vec<TileCoord>,
    /// Openings recorded before any discovery observer attached.
    pub backlog: Vec<BacklogEntry>,
}

impl LevelCode {
    /// Encodes the level into a single-line string suitable for clipboard transfer.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializablePayload {
            seed: self.seed,
            ladders: self.ladders.clone(),
            backlog: self.backlog.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("level code serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{CODE_HEADER}:{}x{}:{encoded}", self.columns, self.rows)
    }

    /// Decodes a level from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LevelCodeError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LevelCodeError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LevelCodeError::MissingPrefix)?;
        let version = parts.next().ok_or(LevelCodeError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LevelCodeError::MissingDimensions)?;
        let payload = parts.next().ok_or(LevelCodeError::MissingPayload)?;

        if domain != CODE_DOMAIN {
            return Err(LevelCodeError::InvalidPrefix(domain.to_owned()));
        }
        if version != CODE_VERSION {
            return Err(LevelCodeError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LevelCodeError::InvalidEncoding)?;
        let decoded: SerializablePayload =
            serde_json::from_slice(&bytes).map_err(LevelCodeError::InvalidPayload)?;

        let out_of_bounds = decoded
            .ladders
            .iter()
            .chain(decoded.backlog.iter().map(|entry| &entry.tile))
            .find(|tile| tile.column() >= columns || tile.row() >= rows);
        if let Some(tile) = out_of_bounds {
            return Err(LevelCodeError::TileOutOfBounds {
                tile: *tile,
                columns,
                rows,
            });
        }

        Ok(Self {
            columns,
            rows,
            seed: decoded.seed,
            ladders: decoded.ladders,
            backlog: decoded.backlog,
        })
    }
}

/// Opening recorded in the backlog portion of a level code.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct BacklogEntry {
    /// Grid cell the opening occupies.
    pub tile: TileCoord,
    /// Whether the opening is a plain ladder or a shaft.
    pub kind: LadderKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializablePayload {
    seed: u64,
    ladders: Vec<TileCoord>,
    backlog: Vec<BacklogEntry>,
}

/// Errors that can occur while decoding level share strings.
#[derive(Debug, Error)]
pub(crate) enum LevelCodeError {
    /// The provided string was empty or contained only whitespace.
    #[error("level code was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded level.
    #[error("level code is missing the prefix")]
    MissingPrefix,
    /// The encoded level did not contain a version segment.
    #[error("level code is missing the version")]
    MissingVersion,
    /// The encoded level did not include grid dimensions.
    #[error("level code is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded level did not include the payload segment.
    #[error("level code is missing the payload")]
    MissingPayload,
    /// The encoded level used an unexpected prefix segment.
    #[error("level prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded level used an unsupported version identifier.
    #[error("level code version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions were malformed or outside the supported range.
    #[error("grid dimensions '{0}' are not supported")]
    InvalidDimensions(String),
    /// The payload referenced a cell outside the declared grid.
    #[error("tile ({}, {}) lies outside the {columns}x{rows} grid", .tile.column(), .tile.row())]
    TileOutOfBounds {
        /// Cell referenced by the payload.
        tile: TileCoord,
        /// Number of tile columns declared by the code.
        columns: u32,
        /// Number of tile rows declared by the code.
        rows: u32,
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode level payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse level payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LevelCodeError> {
    let (columns, rows) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| LevelCodeError::InvalidDimensions(dimensions.to_owned()))?;

    let columns = columns
        .trim()
        .parse::<u32>()
        .map_err(|_| LevelCodeError::InvalidDimensions(dimensions.to_owned()))?;
    let rows = rows
        .trim()
        .parse::<u32>()
        .map_err(|_| LevelCodeError::InvalidDimensions(dimensions.to_owned()))?;

    if columns == 0 || rows == 0 || columns > MAX_GRID_DIMENSION || rows > MAX_GRID_DIMENSION {
        return Err(LevelCodeError::InvalidDimensions(dimensions.to_owned()));
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_empty_level() {
        let code = LevelCode {
            columns: 15,
            rows: 12,
            seed: 42,
            ladders: Vec::new(),
            backlog: Vec::new(),
        };

        let encoded = code.encode();
        assert!(encoded.starts_with(&format!("{CODE_HEADER}:15x12:")));

        let decoded = LevelCode::decode(&encoded).expect("level code decodes");
        assert_eq!(code, decoded);
    }

    #[test]
    fn round_trip_populated_level() {
        let code = LevelCode {
            columns: 20,
            rows: 16,
            seed: 173,
            ladders: vec![TileCoord::new(3, 4), TileCoord::new(11, 9)],
            backlog: vec![
                BacklogEntry {
                    tile: TileCoord::new(7, 2),
                    kind: LadderKind::Ladder,
                },
                BacklogEntry {
                    tile: TileCoord::new(14, 15),
                    kind: LadderKind::Shaft,
                },
            ],
        };

        let encoded = code.encode();
        assert!(encoded.starts_with(&format!("{CODE_HEADER}:20x16:")));

        let decoded = LevelCode::decode(&encoded).expect("level code decodes");
        assert_eq!(code, decoded);
    }

    #[test]
    fn decode_rejects_foreign_prefixes() {
        let error = LevelCode::decode("maze:v1:4x4:e30").expect_err("prefix must be rejected");
        assert!(matches!(error, LevelCodeError::InvalidPrefix(prefix) if prefix == "maze"));
    }

    #[test]
    fn decode_rejects_unknown_versions() {
        let error = LevelCode::decode("mine:v9:4x4:e30").expect_err("version must be rejected");
        assert!(matches!(error, LevelCodeError::UnsupportedVersion(version) if version == "v9"));
    }

    #[test]
    fn decode_rejects_malformed_dimensions() {
        for dimensions in ["4by4", "0x4", "4x0", "x4", "4x"] {
            let value = format!("mine:v1:{dimensions}:e30");
            let error = LevelCode::decode(&value).expect_err("dimensions must be rejected");
            assert!(matches!(error, LevelCodeError::InvalidDimensions(_)));
        }
    }

    #[test]
    fn decode_rejects_oversized_grids() {
        for dimensions in ["1025x4", "4x1025"] {
            let value = format!("mine:v1:{dimensions}:e30");
            let error = LevelCode::decode(&value).expect_err("dimensions must be rejected");
            assert!(matches!(error, LevelCodeError::InvalidDimensions(_)));
        }
    }

    #[test]
    fn decode_rejects_ladders_outside_the_declared_grid() {
        let code = LevelCode {
            columns: 4,
            rows: 4,
            seed: 9,
            ladders: vec![TileCoord::new(4, 0)],
            backlog: Vec::new(),
        };

        let error = LevelCode::decode(&code.encode()).expect_err("tile must be rejected");
        assert!(matches!(
            error,
            LevelCodeError::TileOutOfBounds {
                tile,
                columns: 4,
                rows: 4,
            } if tile == TileCoord::new(4, 0)
        ));
    }

    #[test]
    fn decode_rejects_backlog_openings_outside_the_declared_grid() {
        let code = LevelCode {
            columns: 4,
            rows: 4,
            seed: 9,
            ladders: vec![TileCoord::new(1, 1)],
            backlog: vec![BacklogEntry {
                tile: TileCoord::new(40_000_000, 0),
                kind: LadderKind::Shaft,
            }],
        };

        let error = LevelCode::decode(&code.encode()).expect_err("opening must be rejected");
        assert!(matches!(
            error,
            LevelCodeError::TileOutOfBounds { tile, .. } if tile.column() == 40_000_000
        ));
    }

    #[test]
    fn decode_rejects_invalid_encodings() {
        let error =
            LevelCode::decode("mine:v1:4x4:!!!not-base64!!!").expect_err("payload must be rejected");
        assert!(matches!(error, LevelCodeError::InvalidEncoding(_)));

        let truncated_json = STANDARD_NO_PAD.encode(b"{\"seed\":1");
        let value = format!("mine:v1:4x4:{truncated_json}");
        let error = LevelCode::decode(&value).expect_err("payload must be rejected");
        assert!(matches!(error, LevelCodeError::InvalidPayload(_)));
    }

    #[test]
    fn decode_rejects_blank_input() {
        assert!(matches!(
            LevelCode::decode("   "),
            Err(LevelCodeError::EmptyPayload)
        ));
    }
}
