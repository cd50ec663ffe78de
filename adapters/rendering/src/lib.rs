#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for ladder outline adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use ladder_outline_core::{TilePosition, TILE_LENGTH};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the color faded by the provided opacity.
    ///
    /// All four channels scale together, so fading darkens the color as it
    /// becomes translucent. The opacity is clamped to 0.0..=1.0.
    #[must_use]
    pub fn scaled(self, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);

        Self {
            red: self.red * opacity,
            green: self.green * opacity,
            blue: self.blue * opacity,
            alpha: self.alpha * opacity,
        }
    }
}

/// Named colors selectable for the ladder outline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutlineColor {
    /// Pure red.
    Red,
    /// Pure blue.
    Blue,
    /// Half-intensity green.
    Green,
    /// Pure yellow.
    Yellow,
    /// Pure white.
    White,
    /// Half-intensity magenta.
    Purple,
    /// Pure cyan.
    Cyan,
    /// Orange.
    Orange,
}

impl OutlineColor {
    /// Every selectable outline color, in presentation order.
    pub const ALL: [Self; 8] = [
        Self::Red,
        Self::Blue,
        Self::Green,
        Self::Yellow,
        Self::White,
        Self::Purple,
        Self::Cyan,
        Self::Orange,
    ];

    /// Resolves a color from its configured name, ignoring ASCII case.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|color| name.eq_ignore_ascii_case(color.name()))
    }

    /// Canonical name of the color as it appears in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Blue => "Blue",
            Self::Green => "Green",
            Self::Yellow => "Yellow",
            Self::White => "White",
            Self::Purple => "Purple",
            Self::Cyan => "Cyan",
            Self::Orange => "Orange",
        }
    }

    /// Fully opaque base color before any opacity fade.
    #[must_use]
    pub const fn base_color(self) -> Color {
        match self {
            Self::Red => Color::from_rgb_u8(255, 0, 0),
            Self::Blue => Color::from_rgb_u8(0, 0, 255),
            Self::Green => Color::from_rgb_u8(0, 128, 0),
            Self::Yellow => Color::from_rgb_u8(255, 255, 0),
            Self::White => Color::from_rgb_u8(255, 255, 255),
            Self::Purple => Color::from_rgb_u8(128, 0, 128),
            Self::Cyan => Color::from_rgb_u8(0, 255, 255),
            Self::Orange => Color::from_rgb_u8(255, 165, 0),
        }
    }
}

/// Resolves a configured color name and opacity into a drawable color.
///
/// Unrecognized names fall back to [`OutlineColor::Red`] so a typo in the
/// configuration file degrades to a visible outline rather than an error.
#[must_use]
pub fn resolve_outline_color(name: &str, opacity: f32) -> Color {
    let color = OutlineColor::parse(name).unwrap_or(OutlineColor::Red);
    color.base_color().scaled(opacity)
}

/// Square border drawn around one ladder tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileOutline {
    /// Screen-space position of the outline's upper-left corner.
    pub origin: Vec2,
    /// Side length of the outlined square.
    pub side: f32,
    /// Thickness of each border strip.
    pub thickness: f32,
    /// Fill color of the border strips.
    pub color: Color,
}

impl TileOutline {
    /// Border thickness used for ladder outlines.
    pub const THICKNESS: f32 = 3.0;

    /// Creates an outline at an explicit screen-space origin.
    #[must_use]
    pub const fn new(origin: Vec2, side: f32, color: Color) -> Self {
        Self {
            origin,
            side,
            thickness: Self::THICKNESS,
            color,
        }
    }

    /// Creates the world-space outline for a tile position.
    ///
    /// Backends translate the outline by the scene viewport when drawing.
    #[must_use]
    pub fn for_tile(position: TilePosition, color: Color) -> Self {
        let origin = Vec2::new(position.x() as f32, position.y() as f32);
        Self::new(origin, TILE_LENGTH as f32, color)
    }

    /// Decomposes the outline into its four filled border strips.
    ///
    /// Strips are emitted in top, bottom, left, right order. The vertical
    /// strips span the full side, so the corners are covered twice; with a
    /// translucent color the overlap is invisible because every strip shares
    /// the same premultiplied fill.
    #[must_use]
    pub fn edge_strips(&self) -> [EdgeStrip; 4] {
        let left = self.origin.x;
        let top = self.origin.y;
        let side = self.side;
        let thickness = self.thickness;

        [
            EdgeStrip::new(Vec2::new(left, top), Vec2::new(side, thickness)),
            EdgeStrip::new(
                Vec2::new(left, top + side - thickness),
                Vec2::new(side, thickness),
            ),
            EdgeStrip::new(Vec2::new(left, top), Vec2::new(thickness, side)),
            EdgeStrip::new(
                Vec2::new(left + side - thickness, top),
                Vec2::new(thickness, side),
            ),
        ]
    }
}

/// Axis-aligned filled rectangle composing part of an outline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStrip {
    /// Screen-space position of the strip's upper-left corner.
    pub origin: Vec2,
    /// Width and height of the strip.
    pub size: Vec2,
}

impl EdgeStrip {
    /// Creates a new strip descriptor.
    #[must_use]
    pub const fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }
}

/// Describes the visible level grid that outlines are drawn over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single tile expressed in screen units.
    pub tile_length: f32,
    /// Color used when drawing grid lines.
    pub line_color: Color,
}

impl MapPresentation {
    /// Creates a new level grid descriptor.
    ///
    /// Returns an error when `tile_length` is not positive.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_length: f32,
        line_color: Color,
    ) -> Result<Self, RenderingError> {
        if tile_length <= 0.0 {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
            line_color,
        })
    }

    /// Calculates the total width of the grid.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }
}

/// Flat-colored fill for one visible grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapCellPresentation {
    /// Zero-based column index of the cell.
    pub column: u32,
    /// Zero-based row index of the cell.
    pub row: u32,
    /// Fill color of the cell.
    pub color: Color,
}

impl MapCellPresentation {
    /// Creates a new cell fill descriptor.
    #[must_use]
    pub const fn new(column: u32, row: u32, color: Color) -> Self {
        Self { column, row, color }
    }
}

/// Short-lived message surfaced in the corner of the screen.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    /// Message text shown to the player.
    pub text: String,
    /// Time left before the notice disappears.
    pub remaining: Duration,
}

impl Notice {
    /// Creates a notice that stays visible for the provided duration.
    #[must_use]
    pub fn new<T>(text: T, remaining: Duration) -> Self
    where
        T: Into<String>,
    {
        Self {
            text: text.into(),
            remaining,
        }
    }

    /// Counts down the notice by the elapsed frame time.
    pub fn advance(&mut self, dt: Duration) {
        self.remaining = self.remaining.saturating_sub(dt);
    }

    /// Reports whether the notice should no longer be drawn.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.remaining.is_zero()
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Whether the adapter detected an overlay toggle press on this frame.
    pub toggle_overlay: bool,
    /// Whether the adapter detected a descend request on this frame.
    pub descend: bool,
    /// Whether the adapter detected a dig request on this frame.
    pub dig: bool,
    /// Viewport pan requested this frame, in screen units.
    pub pan: Vec2,
}

/// Scene description combining the level grid, fills and ladder outlines.
///
/// Grid cells and outlines are expressed in world-space pixels; backends
/// subtract `viewport` when drawing so the visible region can pan across
/// levels larger than the window.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Level grid that composes the visible play area.
    pub map: MapPresentation,
    /// World-space offset of the window's upper-left corner.
    pub viewport: Vec2,
    /// Flat cell fills layered over the grid background.
    pub cells: Vec<MapCellPresentation>,
    /// Ladder outlines drawn over the grid.
    pub outlines: Vec<TileOutline>,
    /// Transient messages shown to the player.
    pub notices: Vec<Notice>,
    /// Optional one-line status summary drawn along the bottom edge.
    pub status_line: Option<String>,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        map: MapPresentation,
        viewport: Vec2,
        cells: Vec<MapCellPresentation>,
        outlines: Vec<TileOutline>,
        notices: Vec<Notice>,
        status_line: Option<String>,
    ) -> Self {
        Self {
            map,
            viewport,
            cells,
            outlines,
            notices,
            status_line,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting ladder outline scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta,
    /// per-frame input captured by the adapter, and may mutate the scene before
    /// it is rendered, allowing adapters to animate world snapshots
    /// deterministically.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Tile length must be positive to avoid a degenerate grid.
    InvalidTileLength {
        /// Provided tile length that failed validation.
        tile_length: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileLength { tile_length } => {
                write!(f, "tile_length must be positive (received {tile_length})")
            }
        }
    }
}

impl Error for RenderingError {}
