//! Domain errors surfaced to the user.

use std::path::PathBuf;

use crate::tracks::TrackId;

#[derive(Debug, thiserror::Error)]
pub enum TrackMapError {
    #[error("failed to read track map at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load JSON content from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not find song for track {track} at path {path}. Please fix the JSON file")]
    MissingSong { track: TrackId, path: PathBuf },
}

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("audio file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to start player `{command}` for {path}: {source}")]
    Spawn {
        command: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("playback of {path} failed: {reason}")]
    Failed { path: PathBuf, reason: String },
}

/// Reasons a `start` intent is refused. The messages are shown verbatim.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StartError {
    #[error("Before proceeding, please specify a path to the trigger file")]
    MissingTrigger,

    #[error("Please specify a path to the config file")]
    MissingConfig,

    #[error("Song Paths weren't loaded properly.")]
    TracksNotLoaded,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings file {path} is malformed: expected two lines, found {lines}")]
    Malformed { path: PathBuf, lines: usize },

    #[error("settings I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
