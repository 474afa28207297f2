use super::{ActiveStream, AudioOutput, EndSignal};
use crate::config::PlayerConfig;
use crate::error::PlaybackError;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const MONITOR_INTERVAL: Duration = Duration::from_millis(25);

/// Renders each pass by spawning the configured player program.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    player: PlayerConfig,
    volume: f32,
}

impl CommandOutput {
    pub fn new(player: PlayerConfig, volume: f32) -> Self {
        Self { player, volume }
    }
}

impl AudioOutput for CommandOutput {
    fn start(
        &mut self,
        path: &Path,
        signal: EndSignal,
    ) -> Result<Box<dyn ActiveStream>, PlaybackError> {
        if !path.is_file() {
            return Err(PlaybackError::NotFound(path.to_path_buf()));
        }

        let child = Command::new(&self.player.command)
            .args(expand_args(&self.player.args, path, self.volume))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| PlaybackError::Spawn {
                command: self.player.command.clone(),
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(
            pid = child.id(),
            generation = signal.generation(),
            path = %path.display(),
            "player started"
        );

        Ok(Box::new(CommandStream::watch(child, signal)))
    }
}

struct CommandStream {
    child: Arc<Mutex<Child>>,
    halted: Arc<AtomicBool>,
    monitor: Option<JoinHandle<()>>,
}

impl CommandStream {
    fn watch(child: Child, signal: EndSignal) -> Self {
        let child = Arc::new(Mutex::new(child));
        let halted = Arc::new(AtomicBool::new(false));

        let monitor = {
            let child = Arc::clone(&child);
            let halted = Arc::clone(&halted);
            thread::spawn(move || monitor(child, halted, signal))
        };

        Self {
            child,
            halted,
            monitor: Some(monitor),
        }
    }
}

fn monitor(child: Arc<Mutex<Child>>, halted: Arc<AtomicBool>, signal: EndSignal) {
    loop {
        if halted.load(Ordering::SeqCst) {
            return;
        }

        let status = lock_child(&child).try_wait();

        match status {
            Ok(Some(status)) => {
                if halted.load(Ordering::SeqCst) {
                    return;
                }
                if status.success() {
                    signal.natural();
                } else {
                    signal.failed(format!("player exited with status {status}"));
                }
                return;
            }
            Ok(None) => {}
            Err(err) => {
                signal.failed(format!("poll player: {err}"));
                return;
            }
        }

        thread::sleep(MONITOR_INTERVAL);
    }
}

/// A panic while the lock was held leaves the process handle itself intact,
/// so poisoning is ignored and the child is still polled and reaped.
fn lock_child(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ActiveStream for CommandStream {
    fn halt(&mut self) {
        if self.halted.swap(true, Ordering::SeqCst) {
            return;
        }

        {
            let mut child = lock_child(&self.child);
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }

        if let Some(monitor) = self.monitor.take() {
            let _ = monitor.join();
        }
    }
}

impl Drop for CommandStream {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Substitutes `{path}`, `{volume}` and `{volume_percent}` in player args.
pub fn expand_args(args: &[String], path: &Path, volume: f32) -> Vec<OsString> {
    let volume = volume.clamp(0.0, 1.0);
    let percent = (volume * 100.0).round() as u32;

    args.iter()
        .map(|arg| {
            if arg == "{path}" {
                return path.as_os_str().to_os_string();
            }
            let expanded = arg
                .replace("{path}", &path.to_string_lossy())
                .replace("{volume_percent}", &percent.to_string())
                .replace("{volume}", &volume.to_string());
            OsString::from(expanded)
        })
        .collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::events::{ControlEvent, StreamEnd};
    use std::sync::mpsc;

    #[test]
    fn poisoned_child_lock_still_reports_the_end() {
        let child = Command::new("sh").args(["-c", "exit 0"]).spawn().unwrap();
        let child = Arc::new(Mutex::new(child));
        {
            let child = Arc::clone(&child);
            let _ = thread::spawn(move || {
                let _guard = child.lock().unwrap();
                panic!("poison the child lock");
            })
            .join();
        }
        assert!(child.is_poisoned());

        let (tx, rx) = mpsc::channel();
        monitor(
            Arc::clone(&child),
            Arc::new(AtomicBool::new(false)),
            EndSignal::new(7, tx),
        );

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            ControlEvent::StreamEnded { generation, end } => {
                assert_eq!(generation, 7);
                assert_eq!(end, StreamEnd::Natural);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
