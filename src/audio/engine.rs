use super::{ActiveStream, AudioOutput, EndSignal};
use crate::error::PlaybackError;
use crate::events::ControlEvent;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

/// Holds at most one open stream and replaces it on every `play`.
pub struct PlaybackEngine<O: AudioOutput> {
    output: O,
    events: Sender<ControlEvent>,
    generation: u64,
    current: Option<Loaded>,
}

struct Loaded {
    path: PathBuf,
    generation: u64,
    stream: Box<dyn ActiveStream>,
}

impl<O: AudioOutput> PlaybackEngine<O> {
    pub fn new(output: O, events: Sender<ControlEvent>) -> Self {
        Self {
            output,
            events,
            generation: 0,
            current: None,
        }
    }

    /// Releases whatever is playing, then starts `path` from offset 0.
    /// Returns the generation that end events for this pass will carry.
    pub fn play(&mut self, path: &Path) -> Result<u64, PlaybackError> {
        self.stop();

        self.generation += 1;
        let generation = self.generation;
        let signal = EndSignal::new(generation, self.events.clone());
        let stream = self.output.start(path, signal)?;

        self.current = Some(Loaded {
            path: path.to_path_buf(),
            generation,
            stream,
        });
        Ok(generation)
    }

    pub fn stop(&mut self) {
        if let Some(mut loaded) = self.current.take() {
            tracing::debug!(
                generation = loaded.generation,
                path = %loaded.path.display(),
                "releasing stream"
            );
            loaded.stream.halt();
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|loaded| loaded.path.as_path())
    }
}

impl<O: AudioOutput> Drop for PlaybackEngine<O> {
    fn drop(&mut self) {
        self.stop();
    }
}
