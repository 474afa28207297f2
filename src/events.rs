use crate::tracks::TrackId;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Everything the control loop reacts to. Output threads and the input
/// reader only ever send these; state is mutated by the loop alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    StreamEnded { generation: u64, end: StreamEnd },
    Intent(Intent),
    InputClosed,
}

/// How a pass of a track finished on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    Natural,
    Failed(String),
}

/// User requests forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SelectTrigger(PathBuf),
    SelectTracks(PathBuf),
    Start,
    Stop,
    PlayOnce,
    Status,
    Quit,
}

impl Intent {
    /// Parses one line typed on stdin, e.g. `trigger /tmp/scene.txt`.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let needs_path = |name: &str| -> Result<PathBuf, String> {
            if rest.is_empty() {
                Err(format!("`{name}` expects a path"))
            } else {
                Ok(PathBuf::from(rest))
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "trigger" => needs_path("trigger").map(Intent::SelectTrigger),
            "tracks" | "config" => needs_path("tracks").map(Intent::SelectTracks),
            "start" => Ok(Intent::Start),
            "stop" => Ok(Intent::Stop),
            "play" => Ok(Intent::PlayOnce),
            "status" => Ok(Intent::Status),
            "quit" | "exit" => Ok(Intent::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    SettingsRestored { path: PathBuf },
    SettingsUnusable { path: PathBuf },
    TriggerSelected { path: PathBuf },
    TracksLoaded { path: PathBuf, count: usize },
    TracksRejected { reason: String },
    StartRefused { reason: String },
    WatchStarted { trigger: PathBuf },
    TrackStarted { track: Option<TrackId>, path: PathBuf },
    TrackUnmapped { track: TrackId },
    UnparsableTrigger { content: String },
    PlaybackFailed { reason: String },
    Stopped,
    Status { line: String },
}

impl NoticeKind {
    pub fn severity(&self) -> Severity {
        match self {
            NoticeKind::SettingsUnusable { .. } | NoticeKind::UnparsableTrigger { .. } => {
                Severity::Warning
            }
            NoticeKind::TracksRejected { .. }
            | NoticeKind::StartRefused { .. }
            | NoticeKind::PlaybackFailed { .. } => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::SettingsRestored { path } => {
                write!(f, "Loaded previous settings from {}", path.display())
            }
            NoticeKind::SettingsUnusable { path } => write!(
                f,
                "Tried loading previous settings from {} but some of the files referenced couldn't be found",
                path.display()
            ),
            NoticeKind::TriggerSelected { path } => {
                write!(f, "Trigger file loaded from {}", path.display())
            }
            NoticeKind::TracksLoaded { path, count } => {
                write!(f, "Loaded {count} song(s) from {}", path.display())
            }
            NoticeKind::TracksRejected { reason } => write!(f, "{reason}"),
            NoticeKind::StartRefused { reason } => write!(f, "{reason}"),
            NoticeKind::WatchStarted { trigger } => {
                write!(f, "Watching {}", trigger.display())
            }
            NoticeKind::TrackStarted { track, path } => match track {
                Some(track) => write!(f, "Playing track {track}: {}", song_name(path)),
                None => write!(f, "Playing: {}", song_name(path)),
            },
            NoticeKind::TrackUnmapped { track } => write!(f, "No song bound to track {track}"),
            NoticeKind::UnparsableTrigger { content } => {
                write!(f, "Trigger file content {content:?} is not a track number")
            }
            NoticeKind::PlaybackFailed { reason } => write!(f, "{reason}"),
            NoticeKind::Stopped => write!(f, "Stopped"),
            NoticeKind::Status { line } => write!(f, "{line}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub timestamp: DateTime<Utc>,
}

impl Notice {
    pub fn new(kind: NoticeKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Presentation layer: receives the human-readable event list.
pub trait StatusSink {
    fn notify(&mut self, notice: Notice);
}

impl StatusSink for Vec<Notice> {
    fn notify(&mut self, notice: Notice) {
        self.push(notice);
    }
}

/// Prints one timestamped line per notice to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn notify(&mut self, notice: Notice) {
        let stamp = notice.timestamp.with_timezone(&Local).format("%H:%M:%S");
        let marker = match notice.kind.severity() {
            Severity::Info => "",
            Severity::Warning => "warning: ",
            Severity::Error => "error: ",
        };
        println!("[{stamp}] {marker}{}", notice.kind);
    }
}

fn song_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
