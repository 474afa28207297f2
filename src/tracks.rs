use crate::error::TrackMapError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Track number written to the trigger file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TrackId {
    type Err = ParseIntError;

    /// Accepts surrounding whitespace and a leading byte-order mark, so
    /// `" 3\n"` and `"\u{feff}3\r\n"` both parse as track 3.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        s.strip_prefix('\u{feff}')
            .unwrap_or(s)
            .trim()
            .parse::<u32>()
            .map(TrackId)
    }
}

/// Validated mapping from track id to an existing audio file.
///
/// A map is all-or-nothing: if any referenced file is missing the loader
/// rejects the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMap {
    tracks: BTreeMap<TrackId, PathBuf>,
}

impl TrackMap {
    /// Loads a JSON object of `"<id>": "<path>"` entries. Relative paths are
    /// resolved against the directory holding the JSON file.
    pub fn load(path: &Path) -> Result<Self, TrackMapError> {
        let raw = fs::read_to_string(path).map_err(|source| TrackMapError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let root = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_json(&raw, &root).map_err(|err| match err {
            TrackMapError::Parse { source, .. } => TrackMapError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(raw: &str, root: &Path) -> Result<Self, TrackMapError> {
        let parsed: BTreeMap<u32, PathBuf> =
            serde_json::from_str(raw).map_err(|source| TrackMapError::Parse {
                path: root.to_path_buf(),
                source,
            })?;

        let mut tracks = BTreeMap::new();
        for (id, song) in parsed {
            let track = TrackId(id);
            let resolved = if song.is_absolute() {
                song
            } else {
                root.join(song)
            };
            if !resolved.is_file() {
                return Err(TrackMapError::MissingSong {
                    track,
                    path: resolved,
                });
            }
            let resolved = absolutize(resolved);
            tracing::debug!(track = %track, path = %resolved.display(), "song bound");
            tracks.insert(track, resolved);
        }

        Ok(Self { tracks })
    }

    pub fn resolve(&self, track: TrackId) -> Option<&Path> {
        self.tracks.get(&track).map(|p| p.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrackId, &Path)> + '_ {
        self.tracks.iter().map(|(id, p)| (*id, p.as_path()))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl FromIterator<(TrackId, PathBuf)> for TrackMap {
    /// Builds a map without touching the file system.
    fn from_iter<I: IntoIterator<Item = (TrackId, PathBuf)>>(iter: I) -> Self {
        Self {
            tracks: iter.into_iter().collect(),
        }
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    fs::canonicalize(&path).unwrap_or(path)
}
