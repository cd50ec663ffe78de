//! Overlay configuration loaded from and persisted to a TOML file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, io::ErrorKind, path::Path};

/// Player-tunable overlay settings.
///
/// Missing fields fall back to their defaults so hand-edited files stay
/// forgiving, and an absent file simply yields the default configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct OverlayConfig {
    /// Whether ladder outlines are drawn at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Whether per-discovery records are logged.
    #[serde(default)]
    pub debug: bool,
    /// Outline color name resolved against the palette.
    #[serde(default = "default_color")]
    pub color: String,
    /// Outline opacity in the range 0.0..=1.0.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Name of the key toggling the overlay, or `None` to leave it unbound.
    #[serde(default = "default_toggle_key")]
    pub toggle_key: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            debug: false,
            color: default_color(),
            opacity: default_opacity(),
            toggle_key: default_toggle_key(),
        }
    }
}

impl OverlayConfig {
    /// Loads the configuration stored at `path`.
    ///
    /// An absent file yields the defaults silently; an unreadable or
    /// unparseable file also yields the defaults but surfaces the error so
    /// the caller can log it once the subscriber is installed.
    pub(crate) fn load_or_default(path: &Path) -> (Self, Option<anyhow::Error>) {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => (config, None),
                Err(error) => (Self::default(), Some(error)),
            },
            Err(error) if error.kind() == ErrorKind::NotFound => (Self::default(), None),
            Err(error) => {
                let error = anyhow::Error::new(error)
                    .context(format!("failed to read overlay config at {}", path.display()));
                (Self::default(), Some(error))
            }
        }
    }

    /// Parses a configuration from raw TOML contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse overlay config toml contents")
    }

    /// Persists the configuration to `path`, replacing any previous contents.
    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).context("failed to serialise overlay config")?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write overlay config to {}", path.display()))?;
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}

fn default_color() -> String {
    "Green".to_owned()
}

fn default_opacity() -> f32 {
    0.5
}

fn default_toggle_key() -> String {
    "None".to_owned()
}
