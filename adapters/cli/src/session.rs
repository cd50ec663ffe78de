//! Glue between a mine level, the tracker world, and the scanning system.

use std::{
    path::PathBuf,
    sync::mpsc::{self, Receiver, Sender},
    time::Duration,
};

use anyhow::Context;
use glam::Vec2;
use ladder_outline_core::{
    Command, DiscoverySource, Event, LadderDiscovery, LadderKind, LevelId, TileCoord, TileIndex,
    TilePosition, LADDER_TILE_INDEX, TILE_LENGTH,
};
use ladder_outline_rendering::{
    resolve_outline_color, Color, FrameInput, MapCellPresentation, MapPresentation, Notice, Scene,
    TileOutline,
};
use ladder_outline_system_scanning::Scanning;
use ladder_outline_world::{apply, query, World};

use crate::{
    config::OverlayConfig,
    levelgen::{MineLevel, ROCK_TILE_INDEX},
};

const PULSE_INTERVAL: Duration = Duration::from_secs(1);
const NOTICE_DURATION: Duration = Duration::from_secs(2);

const GRID_LINE_COLOR: Color = Color::from_rgb_u8(58, 54, 52);
const LADDER_FILL: Color = Color::from_rgb_u8(196, 164, 96);
const ROCK_FILL: Color = Color::from_rgb_u8(78, 70, 64);
const FLOOR_FILL: Color = Color::from_rgb_u8(126, 118, 108);

/// Live overlay session driving one level at a time.
///
/// Level observers publish ladder creations through an in-process channel;
/// the session drains the channel every step and forwards each creation as a
/// deferred report. Disabling the overlay stops the clock and discards sweep
/// commands but keeps accepting reports, so nothing is lost while hidden.
pub(crate) struct Session {
    world: World,
    scanning: Scanning,
    level: MineLevel,
    config: OverlayConfig,
    config_path: PathBuf,
    discoveries: Receiver<(TileCoord, LadderKind)>,
    discovery_sender: Sender<(TileCoord, LadderKind)>,
    pulse_accumulator: Duration,
    events: Vec<Event>,
    commands: Vec<Command>,
    frame_discoveries: Vec<(TilePosition, DiscoverySource)>,
    pending_notices: Vec<Notice>,
}

impl Session {
    /// Creates a session rooted at the provided level.
    ///
    /// The level entry and any backlog reports are applied immediately; the
    /// resulting entry sweep runs during the first step.
    pub(crate) fn new(level: MineLevel, config: OverlayConfig, config_path: PathBuf) -> Self {
        let (sender, receiver) = mpsc::channel();
        let mut session = Self {
            world: World::new(),
            scanning: Scanning::new(),
            level,
            config,
            config_path,
            discoveries: receiver,
            discovery_sender: sender,
            pulse_accumulator: Duration::ZERO,
            events: Vec::new(),
            commands: Vec::new(),
            frame_discoveries: Vec::new(),
            pending_notices: Vec::new(),
        };
        session.enter_current_level();
        session
    }

    /// Advances the simulation by one frame.
    pub(crate) fn step(&mut self, dt: Duration, input: FrameInput) {
        self.frame_discoveries.clear();

        if input.toggle_overlay {
            self.toggle_overlay();
        }
        if input.descend {
            self.descend();
        }
        if input.dig {
            if let Some((tile, kind)) = self.level.dig() {
                tracing::debug!(
                    column = tile.column(),
                    row = tile.row(),
                    ?kind,
                    "dug a new opening"
                );
            }
        }

        if self.config.enabled {
            apply(&mut self.world, Command::Tick { dt }, &mut self.events);
            self.pulse_accumulator += dt;
            while self.pulse_accumulator >= PULSE_INTERVAL {
                self.pulse_accumulator -= PULSE_INTERVAL;
                apply(&mut self.world, Command::Pulse, &mut self.events);
            }
        }

        while let Ok((tile, kind)) = self.discoveries.try_recv() {
            apply(
                &mut self.world,
                Command::ReportLadder { tile, kind },
                &mut self.events,
            );
        }

        self.pump_scanning();
        self.collect_discoveries();
        self.events.clear();
    }

    /// Rebuilds the scene from the current world and level state.
    pub(crate) fn compose_scene(&mut self, dt: Duration, pan: Vec2, scene: &mut Scene) {
        scene.viewport += pan;

        for notice in &mut scene.notices {
            notice.advance(dt);
        }
        scene.notices.retain(|notice| !notice.expired());
        scene.notices.append(&mut self.pending_notices);

        scene.cells.clear();
        for layer in self.level.map().layers() {
            for column in 0..layer.width() {
                for row in 0..layer.height() {
                    let tile = TileCoord::new(column, row);
                    if let Some(index) = layer.tile(tile) {
                        let cell = MapCellPresentation::new(column, row, tile_fill(index));
                        scene.cells.push(cell);
                    }
                }
            }
        }

        scene.outlines.clear();
        if self.config.enabled {
            let color = resolve_outline_color(&self.config.color, self.config.opacity);
            for position in query::ladder_view(&self.world).iter() {
                scene.outlines.push(TileOutline::for_tile(*position, color));
            }
        }

        scene.status_line = Some(format!(
            "level {} | ladders {} | pending {} | overlay {}",
            query::level(&self.world).get(),
            query::ladder_view(&self.world).len(),
            query::pending_discoveries(&self.world),
            if self.config.enabled { "on" } else { "off" },
        ));
    }

    /// Steps the simulation and refreshes the scene in one call.
    pub(crate) fn advance(&mut self, dt: Duration, input: FrameInput, scene: &mut Scene) {
        self.step(dt, input);
        self.compose_scene(dt, input.pan, scene);
    }

    /// Runs the session without a window at a fixed 60 Hz step.
    ///
    /// A scripted dig fires every two simulated seconds. Returns every ladder
    /// position tracked over the run, in discovery order.
    pub(crate) fn run_headless(&mut self, ticks: u32) -> Vec<(TilePosition, DiscoverySource)> {
        const STEP: Duration = Duration::from_micros(16_667);

        let mut tracked = Vec::new();
        for tick in 0..ticks {
            let input = FrameInput {
                dig: tick > 0 && tick % 120 == 0,
                ..FrameInput::default()
            };
            self.step(STEP, input);
            tracked.extend_from_slice(&self.frame_discoveries);
        }
        tracked
    }

    /// Builds the empty scene the first frame starts from.
    pub(crate) fn initial_scene(&self) -> anyhow::Result<Scene> {
        let map = MapPresentation::new(
            self.level.columns(),
            self.level.rows(),
            TILE_LENGTH as f32,
            GRID_LINE_COLOR,
        )
        .context("level grid does not describe a drawable surface")?;
        Ok(Scene::new(
            map,
            Vec2::ZERO,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            None,
        ))
    }

    /// Number of ladder positions currently tracked.
    pub(crate) fn tracked_positions(&self) -> usize {
        query::ladder_view(&self.world).len()
    }

    /// Number of deferred reports still waiting for a pulse.
    pub(crate) fn pending_discoveries(&self) -> usize {
        query::pending_discoveries(&self.world)
    }

    /// Level the tracker currently follows.
    pub(crate) fn level(&self) -> LevelId {
        query::level(&self.world)
    }

    fn enter_current_level(&mut self) {
        let sender = self.discovery_sender.clone();
        self.level.subscribe(Box::new(move |tile, kind| {
            let _ = sender.send((tile, kind));
        }));

        apply(
            &mut self.world,
            Command::EnterLevel {
                level: self.level.id(),
            },
            &mut self.events,
        );
        for (tile, kind) in self.level.backlog() {
            apply(
                &mut self.world,
                Command::ReportLadder { tile, kind },
                &mut self.events,
            );
        }
    }

    fn toggle_overlay(&mut self) {
        self.config.enabled = !self.config.enabled;
        let state = if self.config.enabled {
            "enabled"
        } else {
            "disabled"
        };
        tracing::info!(state, "overlay toggled");
        self.pending_notices
            .push(Notice::new(format!("Overlay {state}"), NOTICE_DURATION));
        if let Err(error) = self.config.save(&self.config_path) {
            tracing::warn!("failed to persist overlay config: {error:#}");
        }
    }

    fn descend(&mut self) {
        self.level = self.level.descend();
        self.pulse_accumulator = Duration::ZERO;
        self.enter_current_level();
        tracing::info!(level = self.level.id().get(), "descended to a deeper level");
        self.pending_notices.push(Notice::new(
            format!("Level {}", self.level.id().get()),
            NOTICE_DURATION,
        ));
    }

    fn pump_scanning(&mut self) {
        self.scanning
            .handle(&self.events, self.level.map(), &mut self.commands);
        if self.config.enabled {
            for command in self.commands.drain(..) {
                apply(&mut self.world, command, &mut self.events);
            }
        } else {
            self.commands.clear();
        }
    }

    fn collect_discoveries(&mut self) {
        for event in &self.events {
            if let Event::LadderFound { position, source } = event {
                tracing::debug!(x = position.x(), y = position.y(), ?source, "tracking ladder");
                self.frame_discoveries.push((*position, *source));
            }
        }
    }
}

fn tile_fill(index: TileIndex) -> Color {
    if index == LADDER_TILE_INDEX {
        LADDER_FILL
    } else if index == ROCK_TILE_INDEX {
        ROCK_FILL
    } else {
        FLOOR_FILL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(enabled: bool) -> OverlayConfig {
        OverlayConfig {
            enabled,
            ..OverlayConfig::default()
        }
    }

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ladder-outline-session-{name}.toml"))
    }

    #[test]
    fn headless_runs_are_deterministic() {
        let mut first = Session::new(
            MineLevel::generate(LevelId::new(1), 173),
            test_config(true),
            temp_config_path("deterministic-a"),
        );
        let mut second = Session::new(
            MineLevel::generate(LevelId::new(1), 173),
            test_config(true),
            temp_config_path("deterministic-b"),
        );

        let lhs = first.run_headless(240);
        let rhs = second.run_headless(240);

        assert!(!lhs.is_empty());
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn the_entry_sweep_tracks_every_placed_ladder() {
        let level = MineLevel::generate(LevelId::new(1), 42);
        let code = level.share_code();
        let mut session = Session::new(level, test_config(true), temp_config_path("entry-sweep"));

        let tracked = session.run_headless(1);

        let positions: Vec<TilePosition> =
            tracked.iter().map(|(position, _)| *position).collect();
        for tile in &code.ladders {
            assert!(positions.contains(&TilePosition::from_tile(*tile)));
        }
    }

    #[test]
    fn code_loaded_backlog_openings_are_swept_on_entry() {
        let mut origin = MineLevel::generate(LevelId::new(1), 31);
        let (tile, _) = origin.dig().expect("open rock is available");
        let rebuilt = MineLevel::from_code(LevelId::new(1), &origin.share_code());
        let mut session = Session::new(
            rebuilt,
            test_config(true),
            temp_config_path("backlog-sweep"),
        );

        let tracked = session.run_headless(1);

        assert!(tracked.contains(&(TilePosition::from_tile(tile), DiscoverySource::Scan)));
    }

    #[test]
    fn disabled_sessions_track_nothing() {
        let mut session = Session::new(
            MineLevel::generate(LevelId::new(1), 42),
            test_config(false),
            temp_config_path("disabled"),
        );

        let tracked = session.run_headless(240);

        assert!(tracked.is_empty());
        assert_eq!(session.tracked_positions(), 0);
    }

    #[test]
    fn re_enabling_the_overlay_catches_up_on_standing_ladders() {
        let mut session = Session::new(
            MineLevel::generate(LevelId::new(1), 9),
            test_config(false),
            temp_config_path("catch-up"),
        );
        let early = session.run_headless(5);
        assert!(early.is_empty());

        let toggle = FrameInput {
            toggle_overlay: true,
            ..FrameInput::default()
        };
        session.step(Duration::from_millis(16), toggle);

        let caught_up = session.run_headless(40);
        assert!(!caught_up.is_empty());
        assert!(session.tracked_positions() > 0);
    }

    #[test]
    fn descending_resets_tracking_to_the_new_level() {
        let mut session = Session::new(
            MineLevel::generate(LevelId::new(1), 11),
            test_config(true),
            temp_config_path("descend"),
        );
        let _ = session.run_headless(2);
        assert!(session.tracked_positions() > 0);

        let input = FrameInput {
            descend: true,
            ..FrameInput::default()
        };
        session.step(Duration::from_millis(16), input);

        assert_eq!(session.level(), LevelId::new(2));
        assert!(session.tracked_positions() > 0);
    }

    #[test]
    fn toggling_with_an_unwritable_config_still_flips_state() {
        let mut session = Session::new(
            MineLevel::generate(LevelId::new(1), 7),
            test_config(true),
            PathBuf::from("/nonexistent/ladder-outline/overlay.toml"),
        );

        let input = FrameInput {
            toggle_overlay: true,
            ..FrameInput::default()
        };
        session.step(Duration::from_millis(16), input);

        assert!(!session.config.enabled);
    }

    #[test]
    fn scenes_reflect_overlay_visibility() {
        let mut session = Session::new(
            MineLevel::generate(LevelId::new(1), 3),
            test_config(true),
            temp_config_path("scene"),
        );
        let mut scene = session.initial_scene().expect("tile length is positive");

        session.advance(Duration::from_millis(16), FrameInput::default(), &mut scene);
        assert!(!scene.outlines.is_empty());
        assert!(!scene.cells.is_empty());

        let toggle = FrameInput {
            toggle_overlay: true,
            ..FrameInput::default()
        };
        session.advance(Duration::from_millis(16), toggle, &mut scene);
        assert!(scene.outlines.is_empty());
        assert!(scene
            .notices
            .iter()
            .any(|notice| notice.text.contains("Overlay")));
        let status = scene.status_line.as_deref().unwrap_or_default();
        assert!(status.contains("overlay off"));
    }
}
