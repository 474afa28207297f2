use crate::error::SettingsError;
use anyhow::Context;
use directories::BaseDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Paths remembered from the last successful `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub trigger_path: PathBuf,
    pub tracks_path: PathBuf,
}

impl SessionSettings {
    /// Both referenced files still exist on disk.
    pub fn is_usable(&self) -> bool {
        self.trigger_path.exists() && self.tracks_path.exists()
    }
}

/// Two-line text file: trigger path, then track map path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        let base = BaseDirs::new().context("unable to resolve home directory")?;
        Ok(base
            .config_dir()
            .join("trackwatch")
            .join("previous_settings.txt"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<SessionSettings>, SettingsError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        let lines: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        match lines.as_slice() {
            [trigger, tracks] => Ok(Some(SessionSettings {
                trigger_path: PathBuf::from(trigger),
                tracks_path: PathBuf::from(tracks),
            })),
            other => Err(SettingsError::Malformed {
                path: self.path.clone(),
                lines: other.len(),
            }),
        }
    }

    pub fn save(&self, settings: &SessionSettings) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let body = format!(
            "{}\n{}\n",
            settings.trigger_path.display(),
            settings.tracks_path.display()
        );
        fs::write(&self.path, body).map_err(io_err)
    }

    pub fn clear(&self) -> Result<bool, SettingsError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SettingsError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
