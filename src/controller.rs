//! The single control thread: owns all mutable state and serializes poll
//! ticks, end-of-stream events and user intents.

use crate::audio::engine::PlaybackEngine;
use crate::audio::supervisor::{LoopSupervisor, LoopVerdict};
use crate::audio::AudioOutput;
use crate::config::Config;
use crate::error::StartError;
use crate::events::{ControlEvent, Intent, Notice, NoticeKind, StatusSink, StreamEnd};
use crate::settings::{SessionSettings, SettingsStore};
use crate::tracks::{TrackId, TrackMap};
use crate::watch::{Tick, TriggerSource, WatchSession, Watchdog};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Controller<O: AudioOutput, T: TriggerSource, S: StatusSink> {
    session: WatchSession,
    tracks_path: Option<PathBuf>,
    tracks: Option<TrackMap>,
    watchdog: Watchdog<T>,
    engine: PlaybackEngine<O>,
    supervisor: LoopSupervisor,
    settings: Option<SettingsStore>,
    sink: S,
    poll_interval: Duration,
    events_tx: Sender<ControlEvent>,
    events_rx: Receiver<ControlEvent>,
    input_open: bool,
}

impl<O: AudioOutput, T: TriggerSource, S: StatusSink> Controller<O, T, S> {
    pub fn new(config: &Config, output: O, source: T, sink: S) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            session: WatchSession::default(),
            tracks_path: None,
            tracks: None,
            watchdog: Watchdog::new(source, config.on_unparsable, config.fallback_track),
            engine: PlaybackEngine::new(output, events_tx.clone()),
            supervisor: LoopSupervisor::new(),
            settings: None,
            sink,
            poll_interval: config.poll_interval(),
            events_tx,
            events_rx,
            input_open: true,
        }
    }

    pub fn with_settings(mut self, store: SettingsStore) -> Self {
        self.settings = Some(store);
        self
    }

    /// Queue handle for threads that feed the control loop.
    pub fn sender(&self) -> Sender<ControlEvent> {
        self.events_tx.clone()
    }

    pub fn session(&self) -> &WatchSession {
        &self.session
    }

    pub fn tracks(&self) -> Option<&TrackMap> {
        self.tracks.as_ref()
    }

    pub fn engine(&self) -> &PlaybackEngine<O> {
        &self.engine
    }

    pub fn supervisor(&self) -> &LoopSupervisor {
        &self.supervisor
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_active(&self) -> bool {
        self.supervisor.is_looping()
    }

    pub fn is_running(&self) -> bool {
        self.session.running
    }

    /// Re-applies the paths saved by the last successful start. Returns
    /// whether anything was applied.
    pub fn restore_settings(&mut self) -> anyhow::Result<bool> {
        let store = match &self.settings {
            Some(store) => store.clone(),
            None => return Ok(false),
        };
        let saved = match store.load()? {
            Some(saved) => saved,
            None => return Ok(false),
        };

        if !saved.is_usable() {
            self.report(NoticeKind::SettingsUnusable {
                path: store.path().to_path_buf(),
            });
            return Ok(false);
        }

        self.report(NoticeKind::SettingsRestored {
            path: store.path().to_path_buf(),
        });
        self.select_trigger(saved.trigger_path);
        self.select_tracks(saved.tracks_path);
        Ok(true)
    }

    pub fn select_trigger(&mut self, path: PathBuf) {
        if path.as_os_str().is_empty() {
            self.session.trigger_path = None;
            return;
        }
        self.report(NoticeKind::TriggerSelected { path: path.clone() });
        self.session.trigger_path = Some(path);
        self.session.last_seen_mtime = None;
    }

    /// Loads a track map. On any failure no map is kept.
    pub fn select_tracks(&mut self, path: PathBuf) -> bool {
        self.tracks = None;
        let result = TrackMap::load(&path);
        self.tracks_path = Some(path.clone());

        match result {
            Ok(tracks) => {
                for (track, song) in tracks.iter() {
                    tracing::info!(track = %track, path = %song.display(), "song bound");
                }
                self.report(NoticeKind::TracksLoaded {
                    path,
                    count: tracks.len(),
                });
                self.tracks = Some(tracks);
                // A new map may bind the id already on screen differently.
                self.session.forget();
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "track map rejected");
                self.report(NoticeKind::TracksRejected {
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    pub fn start(&mut self) -> Result<(), StartError> {
        if let Err(err) = self.check_ready() {
            self.report(NoticeKind::StartRefused {
                reason: err.to_string(),
            });
            return Err(err);
        }

        self.session.running = true;
        self.session.last_seen_mtime = None;
        self.persist_settings();

        if let Some(trigger) = self.session.trigger_path.clone() {
            tracing::info!(
                trigger = %trigger.display(),
                poll_ms = self.poll_interval.as_millis() as u64,
                "watch started"
            );
            self.report(NoticeKind::WatchStarted { trigger });
        }
        Ok(())
    }

    /// Halts playback and the poll loop. Late end events are ignored.
    pub fn stop(&mut self) {
        self.supervisor.halt(&mut self.engine);
        self.session.running = false;
        self.session.forget();
        self.report(NoticeKind::Stopped);
    }

    /// Resolves the current trigger content once and plays it, whether or
    /// not the poll loop is running.
    pub fn play_once(&mut self) {
        if let Err(err) = self.check_ready() {
            self.report(NoticeKind::StartRefused {
                reason: err.to_string(),
            });
            return;
        }
        let Some(trigger) = self.session.trigger_path.clone() else {
            return;
        };

        let track = match self.watchdog.peek(&trigger, &mut self.sink) {
            Ok(Some(track)) => track,
            Ok(None) => return,
            Err(err) => {
                self.report(NoticeKind::PlaybackFailed {
                    reason: format!("read trigger file {}: {err}", trigger.display()),
                });
                return;
            }
        };

        let song = self
            .tracks
            .as_ref()
            .and_then(|tracks| tracks.resolve(track))
            .map(Path::to_path_buf);
        let already_failed = self.session.last_track_failed;
        self.session.last_acted_track = Some(track);
        match song {
            Some(song) => {
                self.session.last_track_failed = false;
                self.start_track(Some(track), &song);
            }
            None => {
                self.session.last_track_failed = true;
                self.supervisor.halt(&mut self.engine);
                if !already_failed {
                    self.report(NoticeKind::TrackUnmapped { track });
                }
            }
        }
    }

    /// One poll step. Does nothing unless the loop is running.
    pub fn tick(&mut self) -> Tick {
        if !self.session.running {
            return Tick::Idle;
        }

        let tick = self
            .watchdog
            .tick(&mut self.session, self.tracks.as_ref(), &mut self.sink);

        match &tick {
            Tick::Play { track, path } => {
                let path = path.clone();
                self.start_track(Some(*track), &path);
            }
            Tick::Unmapped { .. } => self.supervisor.halt(&mut self.engine),
            _ => {}
        }
        tick
    }

    pub fn handle(&mut self, event: ControlEvent) -> Flow {
        match event {
            ControlEvent::StreamEnded { generation, end } => self.on_stream_end(generation, end),
            ControlEvent::Intent(intent) => {
                if self.apply(intent) == Flow::Quit {
                    return Flow::Quit;
                }
            }
            ControlEvent::InputClosed => {
                tracing::debug!("input closed");
                self.input_open = false;
            }
        }

        if !self.input_open && !self.session.running && !self.is_active() {
            return Flow::Quit;
        }
        Flow::Continue
    }

    /// Handles every event already queued without blocking.
    pub fn pump(&mut self) -> Flow {
        while let Ok(event) = self.events_rx.try_recv() {
            if self.handle(event) == Flow::Quit {
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Blocks until a quit intent, ticking every poll interval and handling
    /// events in between.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut next_tick = Instant::now();

        loop {
            let now = Instant::now();
            if now >= next_tick {
                self.tick();
                next_tick = now + self.poll_interval;
            }

            let wait = next_tick.saturating_duration_since(Instant::now());
            match self.events_rx.recv_timeout(wait) {
                Ok(event) => {
                    if self.handle(event) == Flow::Quit {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.supervisor.halt(&mut self.engine);
        Ok(())
    }

    fn apply(&mut self, intent: Intent) -> Flow {
        match intent {
            Intent::SelectTrigger(path) => self.select_trigger(path),
            Intent::SelectTracks(path) => {
                self.select_tracks(path);
            }
            Intent::Start => {
                let _ = self.start();
            }
            Intent::Stop => self.stop(),
            Intent::PlayOnce => self.play_once(),
            Intent::Status => {
                let line = self.status_line();
                self.report(NoticeKind::Status { line });
            }
            Intent::Quit => {
                self.supervisor.halt(&mut self.engine);
                self.session.running = false;
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    fn on_stream_end(&mut self, generation: u64, end: StreamEnd) {
        match self
            .supervisor
            .on_stream_end(&mut self.engine, generation, end)
        {
            LoopVerdict::Ignored | LoopVerdict::Restarted { .. } => {}
            LoopVerdict::Halted(err) => {
                tracing::error!(error = %err, "playback halted");
                self.report(NoticeKind::PlaybackFailed {
                    reason: err.to_string(),
                });
            }
        }
    }

    fn start_track(&mut self, track: Option<TrackId>, path: &Path) {
        match self.supervisor.begin(&mut self.engine, path) {
            Ok(generation) => {
                tracing::info!(
                    track = ?track.map(|t| t.0),
                    generation,
                    path = %path.display(),
                    "track started"
                );
                self.report(NoticeKind::TrackStarted {
                    track,
                    path: path.to_path_buf(),
                });
            }
            Err(err) => {
                tracing::error!(error = %err, "playback failed");
                self.session.last_track_failed = true;
                self.report(NoticeKind::PlaybackFailed {
                    reason: err.to_string(),
                });
            }
        }
    }

    fn check_ready(&self) -> Result<(), StartError> {
        if self.session.trigger_path.is_none() {
            return Err(StartError::MissingTrigger);
        }
        if self.tracks_path.is_none() {
            return Err(StartError::MissingConfig);
        }
        if self.tracks.is_none() {
            return Err(StartError::TracksNotLoaded);
        }
        Ok(())
    }

    fn persist_settings(&self) {
        let (Some(store), Some(trigger), Some(tracks)) = (
            &self.settings,
            &self.session.trigger_path,
            &self.tracks_path,
        ) else {
            return;
        };
        let saved = SessionSettings {
            trigger_path: absolute(trigger),
            tracks_path: absolute(tracks),
        };
        if let Err(err) = store.save(&saved) {
            tracing::warn!(error = %err, "could not save session settings");
        }
    }

    fn status_line(&self) -> String {
        let playing = self
            .engine
            .current_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "nothing".to_string());
        let last = self
            .session
            .last_acted_track
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "watching: {}, playing: {playing}, last track: {last}, restarts: {}",
            if self.session.running { "yes" } else { "no" },
            self.supervisor.restarts()
        )
    }

    fn report(&mut self, kind: NoticeKind) {
        self.sink.notify(Notice::new(kind));
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
