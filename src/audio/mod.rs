//! Audio output capability and the two-state loop built on top of it.

pub mod engine;
pub mod renderer;
pub mod supervisor;

use crate::error::PlaybackError;
use crate::events::{ControlEvent, StreamEnd};
use std::path::Path;
use std::sync::mpsc::Sender;

/// Something that can render an audio file once, from offset 0.
pub trait AudioOutput {
    /// Begins playback of `path`. The output must fire `signal` exactly once
    /// if the pass ends by itself, and never after `ActiveStream::halt`.
    fn start(
        &mut self,
        path: &Path,
        signal: EndSignal,
    ) -> Result<Box<dyn ActiveStream>, PlaybackError>;
}

/// One open decode/output binding. Dropping it must release the device.
pub trait ActiveStream: Send {
    fn halt(&mut self);
}

/// Handle given to an output so it can report the end of a pass back onto
/// the control loop.
#[derive(Debug, Clone)]
pub struct EndSignal {
    generation: u64,
    tx: Sender<ControlEvent>,
}

impl EndSignal {
    pub fn new(generation: u64, tx: Sender<ControlEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn natural(self) {
        self.send(StreamEnd::Natural);
    }

    pub fn failed(self, reason: impl Into<String>) {
        self.send(StreamEnd::Failed(reason.into()));
    }

    fn send(self, end: StreamEnd) {
        let event = ControlEvent::StreamEnded {
            generation: self.generation,
            end,
        };
        // The loop may already be gone during shutdown.
        let _ = self.tx.send(event);
    }
}
