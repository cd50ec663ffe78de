#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host that runs the ladder outline overlay over synthetic
//! mine levels, either in a window or headless.

mod config;
mod level_code;
mod levelgen;
mod session;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ladder_outline_core::LevelId;
use ladder_outline_rendering::{Color, Presentation, RenderingBackend};
use ladder_outline_rendering_macroquad::MacroquadBackend;
use tracing_subscriber::EnvFilter;

use crate::{config::OverlayConfig, level_code::LevelCode, levelgen::MineLevel, session::Session};

const DEFAULT_SEED: u64 = 173;
const WINDOW_TITLE: &str = "Ladder Outline";
const CLEAR_COLOR: Color = Color::from_rgb_u8(24, 22, 26);

/// Ladder outline overlay host.
#[derive(Debug, Parser)]
#[command(name = "ladder-outline")]
struct Cli {
    /// Path of the overlay configuration file.
    #[arg(long, default_value = "overlay.toml")]
    config: PathBuf,

    /// Seed used when generating a fresh level.
    #[arg(long)]
    seed: Option<u64>,

    /// Share code of a level to rebuild instead of generating one.
    #[arg(long)]
    level_code: Option<String>,

    /// Prints the share code of the starting level before running.
    #[arg(long)]
    emit_level_code: bool,

    /// Runs the session without opening a window.
    #[arg(long)]
    headless: bool,

    /// Number of 60 Hz steps a headless run simulates.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Logs the measured frame rate once per second.
    #[arg(long)]
    show_fps: bool,

    /// Disables vertical sync in the windowed backend.
    #[arg(long)]
    no_vsync: bool,
}

/// Entry point for the ladder outline command-line host.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (overlay, load_error) = OverlayConfig::load_or_default(&cli.config);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if overlay.debug { "debug" } else { "info" })
        }))
        .init();

    if let Some(error) = load_error {
        tracing::warn!("falling back to default overlay config: {error:#}");
    }

    let level = match cli.level_code.as_deref() {
        Some(code) => {
            let decoded = LevelCode::decode(code).context("failed to decode the level code")?;
            MineLevel::from_code(LevelId::new(1), &decoded)
        }
        None => MineLevel::generate(LevelId::new(1), cli.seed.unwrap_or(DEFAULT_SEED)),
    };

    if cli.emit_level_code {
        println!("{}", level.share_code().encode());
    }

    if cli.headless {
        run_headless(level, overlay, cli)
    } else {
        run_windowed(level, overlay, cli)
    }
}

fn run_headless(level: MineLevel, overlay: OverlayConfig, cli: Cli) -> anyhow::Result<()> {
    let mut session = Session::new(level, overlay, cli.config);
    for (position, source) in session.run_headless(cli.ticks) {
        println!(
            "ladder tracked at ({}, {}) via {source:?}",
            position.x(),
            position.y()
        );
    }
    println!(
        "level {} | tracked {} | pending {}",
        session.level().get(),
        session.tracked_positions(),
        session.pending_discoveries(),
    );
    Ok(())
}

fn run_windowed(level: MineLevel, overlay: OverlayConfig, cli: Cli) -> anyhow::Result<()> {
    let mut backend = MacroquadBackend::new()
        .with_show_fps(cli.show_fps)
        .with_toggle_binding(Some(overlay.toggle_key.as_str()));
    if cli.no_vsync {
        backend = backend.with_vsync(false);
    }

    let mut session = Session::new(level, overlay, cli.config);
    let scene = session.initial_scene()?;
    let presentation = Presentation::new(WINDOW_TITLE, CLEAR_COLOR, scene);

    backend.run(presentation, move |dt, input, scene| {
        session.advance(dt, input, scene);
    })
}
