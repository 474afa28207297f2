use crate::system;
use crate::tracks::TrackId;
use anyhow::{bail, Context};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted poll interval: one minute.
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub on_unparsable: UnparsablePolicy,
    #[serde(default)]
    pub fallback_track: TrackId,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
}

/// External program used to render one pass of a track.
///
/// `args` may contain `{path}`, `{volume}` (0.0-1.0) and `{volume_percent}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// What a tick does when the trigger file does not hold an integer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnparsablePolicy {
    /// Leave playback untouched until the file changes again.
    #[default]
    Ignore,
    /// Act as if `fallback_track` had been written.
    Fallback,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(path) = Self::project_path() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        if let Ok(path) = Self::default_path() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config at {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parse config at {}", path.display()))?;
        Ok(config)
    }

    pub fn init_default() -> anyhow::Result<PathBuf> {
        let path = Self::default_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let config = Self::default();
        fs::write(&path, serde_json::to_string_pretty(&config)?)?;
        Ok(path)
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        let base = BaseDirs::new().context("unable to resolve home directory")?;
        Ok(base.config_dir().join("trackwatch").join("config.json"))
    }

    /// Clamped to [`MAX_POLL_INTERVAL_MS`] so deadline arithmetic in the
    /// control loop cannot overflow, even for an unvalidated config.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.min(MAX_POLL_INTERVAL_MS))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.volume) {
            bail!("volume must be between 0.0 and 1.0");
        }

        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than 0");
        }

        if self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            bail!("poll_interval_ms must be at most {MAX_POLL_INTERVAL_MS}");
        }

        if self.player.command.trim().is_empty() {
            bail!("player.command must not be empty");
        }

        if !self.player.args.iter().any(|arg| arg.contains("{path}")) {
            bail!("player.args must contain a {{path}} placeholder");
        }

        Ok(())
    }

    fn project_path() -> Option<PathBuf> {
        Some(PathBuf::from("trackwatch.json"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            on_unparsable: UnparsablePolicy::default(),
            fallback_track: TrackId(0),
            volume: default_volume(),
            player: PlayerConfig::default(),
            settings_path: None,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        system::detect().player
    }
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_volume() -> f32 {
    0.8
}
