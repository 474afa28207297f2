use super::engine::PlaybackEngine;
use super::AudioOutput;
use crate::error::PlaybackError;
use crate::events::StreamEnd;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Looping { path: PathBuf, generation: u64 },
}

/// Outcome of handling an end-of-stream event.
#[derive(Debug)]
pub enum LoopVerdict {
    /// Stale or unwanted event: the stream was stopped or replaced.
    Ignored,
    Restarted { generation: u64 },
    Halted(PlaybackError),
}

/// Keeps the current track looping until it is explicitly stopped.
#[derive(Debug)]
pub struct LoopSupervisor {
    state: LoopState,
    restarts: u64,
}

impl Default for LoopSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopSupervisor {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            restarts: 0,
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn is_looping(&self) -> bool {
        matches!(self.state, LoopState::Looping { .. })
    }

    /// Number of automatic restarts performed since creation.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Idle -> Looping (or Looping -> Looping on a new track).
    pub fn begin<O: AudioOutput>(
        &mut self,
        engine: &mut PlaybackEngine<O>,
        path: &Path,
    ) -> Result<u64, PlaybackError> {
        match engine.play(path) {
            Ok(generation) => {
                self.state = LoopState::Looping {
                    path: path.to_path_buf(),
                    generation,
                };
                Ok(generation)
            }
            Err(err) => {
                self.state = LoopState::Idle;
                Err(err)
            }
        }
    }

    /// Looping -> Idle. Any end event still in flight is ignored afterwards.
    pub fn halt<O: AudioOutput>(&mut self, engine: &mut PlaybackEngine<O>) {
        self.state = LoopState::Idle;
        engine.stop();
    }

    pub fn on_stream_end<O: AudioOutput>(
        &mut self,
        engine: &mut PlaybackEngine<O>,
        generation: u64,
        end: StreamEnd,
    ) -> LoopVerdict {
        let path = match &self.state {
            LoopState::Looping {
                path,
                generation: current,
            } if *current == generation => path.clone(),
            _ => {
                tracing::debug!(generation, "ignoring end of stale stream");
                return LoopVerdict::Ignored;
            }
        };

        match end {
            StreamEnd::Natural => match self.begin(engine, &path) {
                Ok(generation) => {
                    self.restarts += 1;
                    tracing::debug!(generation, path = %path.display(), "looping track");
                    LoopVerdict::Restarted { generation }
                }
                Err(err) => LoopVerdict::Halted(err),
            },
            StreamEnd::Failed(reason) => {
                self.halt(engine);
                LoopVerdict::Halted(PlaybackError::Failed { path, reason })
            }
        }
    }
}
