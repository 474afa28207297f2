#![allow(dead_code)]

use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use trackwatch::audio::{ActiveStream, AudioOutput, EndSignal};
use trackwatch::config::Config;
use trackwatch::controller::Controller;
use trackwatch::error::PlaybackError;
use trackwatch::events::{Notice, NoticeKind};
use trackwatch::watch::DiskTrigger;

pub type TestController = Controller<FakeOutput, DiskTrigger, Vec<Notice>>;

#[derive(Default)]
pub struct OutputLog {
    pub started: Vec<PathBuf>,
    pub halted: usize,
    pub signals: Vec<EndSignal>,
    pub refuse: bool,
}

/// Records every pass instead of producing sound.
#[derive(Clone, Default)]
pub struct FakeOutput {
    pub log: Arc<Mutex<OutputLog>>,
}

impl FakeOutput {
    pub fn started(&self) -> Vec<PathBuf> {
        self.log.lock().unwrap().started.clone()
    }

    pub fn started_names(&self) -> Vec<String> {
        self.started()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    pub fn halted(&self) -> usize {
        self.log.lock().unwrap().halted
    }

    pub fn latest_signal(&self) -> EndSignal {
        self.log.lock().unwrap().signals.last().cloned().unwrap()
    }

    /// Simulates the current pass running out of audio.
    pub fn finish_latest(&self) {
        self.latest_signal().natural();
    }

    pub fn refuse_next(&self) {
        self.log.lock().unwrap().refuse = true;
    }
}

impl AudioOutput for FakeOutput {
    fn start(
        &mut self,
        path: &Path,
        signal: EndSignal,
    ) -> Result<Box<dyn ActiveStream>, PlaybackError> {
        let mut log = self.log.lock().unwrap();
        if log.refuse {
            log.refuse = false;
            return Err(PlaybackError::Failed {
                path: path.to_path_buf(),
                reason: "corrupt file".to_string(),
            });
        }
        log.started.push(path.to_path_buf());
        log.signals.push(signal);
        Ok(Box::new(FakeStream {
            log: Arc::clone(&self.log),
            halted: false,
        }))
    }
}

struct FakeStream {
    log: Arc<Mutex<OutputLog>>,
    halted: bool,
}

impl ActiveStream for FakeStream {
    fn halt(&mut self) {
        if !self.halted {
            self.halted = true;
            self.log.lock().unwrap().halted += 1;
        }
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Scratch directory with `a.wav`, `b.wav`, a track map binding them to 1
/// and 2, and a trigger file path.
pub struct Fixture {
    pub dir: TempDir,
    pub trigger: PathBuf,
    pub tracks: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.wav"), b"RIFF").unwrap();
        fs::write(dir.path().join("b.wav"), b"RIFF").unwrap();
        let tracks = dir.path().join("tracks.json");
        fs::write(&tracks, r#"{"1": "a.wav", "2": "b.wav"}"#).unwrap();
        let trigger = dir.path().join("scene.txt");
        Self {
            dir,
            trigger,
            tracks,
        }
    }

    /// Rewrites the trigger file and pins its mtime to `secs`.
    pub fn write_trigger(&self, content: &str, secs: i64) {
        fs::write(&self.trigger, content).unwrap();
        set_file_mtime(&self.trigger, FileTime::from_unix_time(secs, 0)).unwrap();
    }

    pub fn write_trigger_bytes(&self, content: &[u8], secs: i64) {
        fs::write(&self.trigger, content).unwrap();
        set_file_mtime(&self.trigger, FileTime::from_unix_time(secs, 0)).unwrap();
    }

    pub fn controller(&self, output: &FakeOutput) -> TestController {
        self.controller_with(&Config::default(), output)
    }

    pub fn controller_with(&self, config: &Config, output: &FakeOutput) -> TestController {
        let mut controller = Controller::new(config, output.clone(), DiskTrigger, Vec::new());
        controller.select_trigger(self.trigger.clone());
        assert!(controller.select_tracks(self.tracks.clone()));
        controller
    }
}

pub fn count(notices: &[Notice], pred: impl Fn(&NoticeKind) -> bool) -> usize {
    notices.iter().filter(|n| pred(&n.kind)).count()
}
