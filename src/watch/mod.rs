//! Trigger-file polling: change detection, parsing, debounce and resolution.

use crate::config::UnparsablePolicy;
use crate::events::{Notice, NoticeKind, StatusSink};
use crate::tracks::{TrackId, TrackMap};
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Read access to the trigger file.
pub trait TriggerSource {
    fn modified(&self, path: &Path) -> io::Result<FileTime>;
    fn read(&self, path: &Path) -> io::Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiskTrigger;

impl TriggerSource for DiskTrigger {
    fn modified(&self, path: &Path) -> io::Result<FileTime> {
        let meta = fs::metadata(path)?;
        Ok(FileTime::from_last_modification_time(&meta))
    }

    /// Undecodable bytes become U+FFFD, so the content reaches the parser
    /// and is reported as unparsable instead of looking like a locked file.
    fn read(&self, path: &Path) -> io::Result<String> {
        let bytes = fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Mutable state of one watch run.
#[derive(Debug, Clone, Default)]
pub struct WatchSession {
    pub trigger_path: Option<PathBuf>,
    pub last_seen_mtime: Option<FileTime>,
    /// Last id that was played or confirmed unmapped. `None` until the
    /// first decision.
    pub last_acted_track: Option<TrackId>,
    pub last_track_failed: bool,
    /// Keep-running flag for the poll loop.
    pub running: bool,
}

impl WatchSession {
    pub fn new(trigger_path: PathBuf) -> Self {
        Self {
            trigger_path: Some(trigger_path),
            ..Self::default()
        }
    }

    /// Forget everything observed so the next tick reads the file afresh.
    pub fn forget(&mut self) {
        self.last_seen_mtime = None;
        self.last_acted_track = None;
        self.last_track_failed = false;
    }
}

/// What a tick decided. Only `Play` and `Unmapped` require the caller to
/// touch playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// The poll loop is not running.
    Idle,
    NotConfigured,
    Unchanged,
    Unreadable,
    Unparsable,
    Repeated(TrackId),
    Play { track: TrackId, path: PathBuf },
    Unmapped { track: TrackId },
}

pub struct Watchdog<T: TriggerSource> {
    source: T,
    on_unparsable: UnparsablePolicy,
    fallback_track: TrackId,
}

impl<T: TriggerSource> Watchdog<T> {
    pub fn new(source: T, on_unparsable: UnparsablePolicy, fallback_track: TrackId) -> Self {
        Self {
            source,
            on_unparsable,
            fallback_track,
        }
    }

    pub fn source(&self) -> &T {
        &self.source
    }

    pub fn tick(
        &self,
        session: &mut WatchSession,
        tracks: Option<&TrackMap>,
        sink: &mut dyn StatusSink,
    ) -> Tick {
        let (trigger, tracks) = match (session.trigger_path.as_deref(), tracks) {
            (Some(trigger), Some(tracks)) => (trigger, tracks),
            _ => return Tick::NotConfigured,
        };

        let mtime = match self.source.modified(trigger) {
            Ok(mtime) => mtime,
            Err(err) => {
                tracing::debug!(error = %err, path = %trigger.display(), "trigger stat failed");
                return Tick::Unreadable;
            }
        };
        if session.last_seen_mtime == Some(mtime) {
            return Tick::Unchanged;
        }

        // The writer may hold the file at this instant; leave the mtime
        // uncommitted so the next tick tries again.
        let content = match self.source.read(trigger) {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!(error = %err, path = %trigger.display(), "trigger read failed");
                return Tick::Unreadable;
            }
        };
        session.last_seen_mtime = Some(mtime);

        let track = match self.parse(&content, sink) {
            Some(track) => track,
            None => return Tick::Unparsable,
        };

        if session.last_acted_track == Some(track) {
            return Tick::Repeated(track);
        }
        session.last_acted_track = Some(track);

        match tracks.resolve(track) {
            Some(path) => {
                session.last_track_failed = false;
                Tick::Play {
                    track,
                    path: path.to_path_buf(),
                }
            }
            None => {
                // One report per run of failures; a successful play clears it.
                if !session.last_track_failed {
                    tracing::info!(track = %track, "no song bound");
                    sink.notify(Notice::new(NoticeKind::TrackUnmapped { track }));
                }
                session.last_track_failed = true;
                Tick::Unmapped { track }
            }
        }
    }

    /// Reads the trigger content once without touching any session state.
    pub fn peek(&self, trigger: &Path, sink: &mut dyn StatusSink) -> io::Result<Option<TrackId>> {
        let content = self.source.read(trigger)?;
        Ok(self.parse(&content, sink))
    }

    fn parse(&self, content: &str, sink: &mut dyn StatusSink) -> Option<TrackId> {
        match content.parse::<TrackId>() {
            Ok(track) => Some(track),
            Err(err) => {
                let shown = content.trim().to_string();
                tracing::warn!(
                    content = %shown,
                    error = %err,
                    policy = ?self.on_unparsable,
                    "unparsable trigger content"
                );
                sink.notify(Notice::new(NoticeKind::UnparsableTrigger { content: shown }));
                match self.on_unparsable {
                    UnparsablePolicy::Ignore => None,
                    UnparsablePolicy::Fallback => Some(self.fallback_track),
                }
            }
        }
    }
}
