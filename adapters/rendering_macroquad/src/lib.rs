#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed implementation of the rendering contracts.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! Outlines are drawn by stretching a one-pixel white texture into each edge
//! strip, so a single texture upload serves every rectangle the overlay ever
//! paints.

use anyhow::Result;
use glam::Vec2;
use ladder_outline_rendering::{
    Color, FrameInput, Presentation, RenderingBackend, Scene, TileOutline,
};
use macroquad::input::{is_key_down, is_key_pressed, KeyCode};
use macroquad::math::Vec2 as MacroquadVec2;
use macroquad::texture::{draw_texture_ex, DrawTextureParams, Texture2D};
use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Pixels per second the viewport moves while an arrow key is held.
const PAN_SPEED: f32 = 320.0;

const BRUSH_DIMENSION: u16 = 1;
const BRUSH_BYTES: [u8; 4] = [255, 255, 255, 255];

/// Keyboard state sampled once per frame.
struct KeyboardShortcuts {
    quit_requested: bool,
    toggle_overlay: bool,
    descend: bool,
    dig: bool,
    pan_direction: Vec2,
}

impl KeyboardShortcuts {
    fn poll(toggle_key: Option<KeyCode>) -> Self {
        let quit_requested = is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q);
        let toggle_overlay = toggle_key.map_or(false, is_key_pressed);
        let descend = is_key_pressed(KeyCode::N);
        let dig = is_key_pressed(KeyCode::Space);

        let mut pan_direction = Vec2::ZERO;
        if is_key_down(KeyCode::Left) {
            pan_direction.x -= 1.0;
        }
        if is_key_down(KeyCode::Right) {
            pan_direction.x += 1.0;
        }
        if is_key_down(KeyCode::Up) {
            pan_direction.y -= 1.0;
        }
        if is_key_down(KeyCode::Down) {
            pan_direction.y += 1.0;
        }

        Self {
            quit_requested,
            toggle_overlay,
            descend,
            dig,
            pan_direction,
        }
    }
}

/// Maps a configured key name onto a macroquad key code.
///
/// Names are case-insensitive. `N`, `Q`, space, and the arrow keys are
/// reserved by the session shortcuts and cannot be bound.
fn parse_key_binding(name: &str) -> Option<KeyCode> {
    let normalized = name.trim().to_ascii_uppercase();
    let key = match normalized.as_str() {
        "A" => KeyCode::A,
        "B" => KeyCode::B,
        "C" => KeyCode::C,
        "D" => KeyCode::D,
        "E" => KeyCode::E,
        "F" => KeyCode::F,
        "G" => KeyCode::G,
        "H" => KeyCode::H,
        "I" => KeyCode::I,
        "J" => KeyCode::J,
        "K" => KeyCode::K,
        "L" => KeyCode::L,
        "M" => KeyCode::M,
        "O" => KeyCode::O,
        "P" => KeyCode::P,
        "R" => KeyCode::R,
        "S" => KeyCode::S,
        "T" => KeyCode::T,
        "U" => KeyCode::U,
        "V" => KeyCode::V,
        "W" => KeyCode::W,
        "X" => KeyCode::X,
        "Y" => KeyCode::Y,
        "Z" => KeyCode::Z,
        "F1" => KeyCode::F1,
        "F2" => KeyCode::F2,
        "F3" => KeyCode::F3,
        "F4" => KeyCode::F4,
        "F5" => KeyCode::F5,
        "F6" => KeyCode::F6,
        "F7" => KeyCode::F7,
        "F8" => KeyCode::F8,
        "F9" => KeyCode::F9,
        "F10" => KeyCode::F10,
        "F11" => KeyCode::F11,
        "F12" => KeyCode::F12,
        "TAB" => KeyCode::Tab,
        _ => return None,
    };
    Some(key)
}

/// One-pixel white texture stretched into rectangles at draw time.
struct PixelBrush {
    texture: Texture2D,
}

impl PixelBrush {
    fn new() -> Result<Self, BrushError> {
        validate_brush_bytes(&BRUSH_BYTES, BRUSH_DIMENSION, BRUSH_DIMENSION)?;
        let texture = Texture2D::from_rgba8(BRUSH_DIMENSION, BRUSH_DIMENSION, &BRUSH_BYTES);
        Ok(Self { texture })
    }

    fn fill_rect(&self, origin: Vec2, size: Vec2, color: macroquad::color::Color) {
        draw_texture_ex(
            self.texture,
            origin.x,
            origin.y,
            color,
            DrawTextureParams {
                dest_size: Some(MacroquadVec2::new(size.x, size.y)),
                ..DrawTextureParams::default()
            },
        );
    }
}

fn validate_brush_bytes(bytes: &[u8], width: u16, height: u16) -> Result<(), BrushError> {
    if width == 0 || height == 0 {
        return Err(BrushError::EmptyDimensions { width, height });
    }
    let expected = usize::from(width) * usize::from(height) * 4;
    if bytes.len() != expected {
        return Err(BrushError::ByteCountMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Raised when the brush texture bytes do not describe a valid RGBA image.
#[derive(Debug, PartialEq, Eq)]
enum BrushError {
    EmptyDimensions { width: u16, height: u16 },
    ByteCountMismatch { expected: usize, actual: usize },
}

impl fmt::Display for BrushError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDimensions { width, height } => write!(
                formatter,
                "brush texture dimensions must be non-zero (got {width}x{height})"
            ),
            Self::ByteCountMismatch { expected, actual } => write!(
                formatter,
                "brush texture expected {expected} bytes but received {actual}"
            ),
        }
    }
}

impl Error for BrushError {}

/// Tracks wall-clock frame timing and reports frames per second once a second.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    fn record_frame(&mut self, dt: Duration) -> Option<f32> {
        self.elapsed += dt;
        self.frames = self.frames.saturating_add(1);
        if self.elapsed < Duration::from_secs(1) {
            return None;
        }
        let fps = self.frames as f32 / self.elapsed.as_secs_f32();
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        Some(fps)
    }
}

/// Window-driven backend rendering scenes with macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    toggle_key: Option<KeyCode>,
}

impl MacroquadBackend {
    /// Creates a backend with platform-default swap behaviour.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display
    /// refresh rate or swap as fast as the platform allows.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Enables the once-per-second FPS log line.
    #[must_use]
    pub fn with_show_fps(mut self, show_fps: bool) -> Self {
        self.show_fps = show_fps;
        self
    }

    /// Binds the overlay toggle to a named key, or leaves it unbound.
    ///
    /// `None`, the empty string, and the literal `none` leave the toggle
    /// unbound. Unknown names log a warning and stay unbound.
    #[must_use]
    pub fn with_toggle_binding(mut self, name: Option<&str>) -> Self {
        self.toggle_key = match name {
            None => None,
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) if raw.trim().eq_ignore_ascii_case("none") => None,
            Some(raw) => {
                let parsed = parse_key_binding(raw);
                if parsed.is_none() {
                    tracing::warn!("unknown toggle key name {raw:?}, overlay toggle unbound");
                }
                parsed
            }
        };
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            toggle_key,
        } = self;
        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 960,
            window_height: 640,
            ..macroquad::window::Conf::default()
        };
        if let Some(interval) = swap_interval {
            config.platform.swap_interval = Some(interval);
        }

        macroquad::Window::from_config(config, async move {
            let brush = match PixelBrush::new() {
                Ok(brush) => Some(brush),
                Err(error) => {
                    tracing::warn!(
                        "pixel brush unavailable, outlines disabled for this session: {error}"
                    );
                    None
                }
            };

            let mut scene = scene;
            let mut fps_counter = FpsCounter::default();

            loop {
                let shortcuts = KeyboardShortcuts::poll(toggle_key);
                if shortcuts.quit_requested {
                    break;
                }

                macroquad::window::clear_background(to_macroquad_color(clear_color));

                let dt_seconds = macroquad::time::get_frame_time().max(0.0);
                let frame_dt = Duration::from_secs_f32(dt_seconds);
                let frame_input = FrameInput {
                    toggle_overlay: shortcuts.toggle_overlay,
                    descend: shortcuts.descend,
                    dig: shortcuts.dig,
                    pan: shortcuts.pan_direction * PAN_SPEED * dt_seconds,
                };

                update_scene(frame_dt, frame_input, &mut scene);
                draw_scene(&scene, brush.as_ref());

                if show_fps {
                    if let Some(fps) = fps_counter.record_frame(frame_dt) {
                        tracing::info!("fps {fps:.1}");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn draw_scene(scene: &Scene, brush: Option<&PixelBrush>) {
    let viewport = scene.viewport;
    let tile_length = scene.map.tile_length;

    for cell in &scene.cells {
        macroquad::shapes::draw_rectangle(
            cell.column as f32 * tile_length - viewport.x,
            cell.row as f32 * tile_length - viewport.y,
            tile_length,
            tile_length,
            to_macroquad_color(cell.color),
        );
    }

    draw_grid_lines(scene, viewport);

    if let Some(brush) = brush {
        for outline in &scene.outlines {
            draw_outline(brush, outline, viewport);
        }
    }

    draw_hud(scene);
}

fn draw_grid_lines(scene: &Scene, viewport: Vec2) {
    let map = &scene.map;
    let tile_length = map.tile_length;
    let color = to_macroquad_color(map.line_color);

    for column in 0..=map.columns {
        let x = column as f32 * tile_length - viewport.x;
        macroquad::shapes::draw_line(x, -viewport.y, x, map.height() - viewport.y, 1.0, color);
    }
    for row in 0..=map.rows {
        let y = row as f32 * tile_length - viewport.y;
        macroquad::shapes::draw_line(-viewport.x, y, map.width() - viewport.x, y, 1.0, color);
    }
}

fn draw_outline(brush: &PixelBrush, outline: &TileOutline, viewport: Vec2) {
    let color = to_macroquad_color(outline.color);
    for strip in outline.edge_strips() {
        brush.fill_rect(strip.origin - viewport, strip.size, color);
    }
}

fn draw_hud(scene: &Scene) {
    for (index, notice) in scene.notices.iter().enumerate() {
        let _ = macroquad::text::draw_text(
            &notice.text,
            16.0,
            24.0 + 22.0 * index as f32,
            20.0,
            macroquad::color::Color::new(1.0, 1.0, 1.0, 0.92),
        );
    }

    if let Some(status_line) = &scene.status_line {
        let _ = macroquad::text::draw_text(
            status_line,
            16.0,
            macroquad::window::screen_height() - 12.0,
            20.0,
            macroquad::color::Color::new(0.8, 0.8, 0.8, 0.9),
        );
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brush_bytes_satisfy_the_texture_contract() {
        assert_eq!(
            validate_brush_bytes(&BRUSH_BYTES, BRUSH_DIMENSION, BRUSH_DIMENSION),
            Ok(())
        );
    }

    #[test]
    fn brush_validation_rejects_mismatched_buffers() {
        assert_eq!(
            validate_brush_bytes(&[255, 255], 1, 1),
            Err(BrushError::ByteCountMismatch {
                expected: 4,
                actual: 2
            })
        );
        assert_eq!(
            validate_brush_bytes(&[], 0, 1),
            Err(BrushError::EmptyDimensions {
                width: 0,
                height: 1
            })
        );
    }

    #[test]
    fn key_names_parse_case_insensitively() {
        assert_eq!(parse_key_binding("f5"), Some(KeyCode::F5));
        assert_eq!(parse_key_binding("F5"), Some(KeyCode::F5));
        assert_eq!(parse_key_binding(" l "), Some(KeyCode::L));
        assert_eq!(parse_key_binding("tab"), Some(KeyCode::Tab));
    }

    #[test]
    fn unknown_key_names_stay_unbound() {
        assert_eq!(parse_key_binding("Hyper"), None);
        assert_eq!(parse_key_binding(""), None);
    }

    #[test]
    fn fps_counter_reports_once_per_second() {
        let mut counter = FpsCounter::default();
        for _ in 0..59 {
            assert_eq!(counter.record_frame(Duration::from_millis(16)), None);
        }
        let fps = counter
            .record_frame(Duration::from_millis(64))
            .expect("a full second elapsed");
        assert!(fps > 0.0);
    }
}
