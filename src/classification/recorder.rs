//! Fixed-duration audio capture

use crate::config::RecorderConfig;
use crate::error::{Error, Result};
use crossbeam_channel::{RecvTimeoutError, bounded};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use std::thread;
use std::time::Duration;

/// Records one utterance and returns the audio file path
pub trait Recorder {
    fn record(&mut self) -> Result<PathBuf>;
}

/// Capture through ALSA `arecord` (S16_LE, fixed duration)
pub struct ArecordRecorder {
    config: RecorderConfig,
}

impl ArecordRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self { config }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.arg("-D")
            .arg(&self.config.device)
            .args(["-f", "S16_LE"])
            .arg("-r")
            .arg(self.config.sample_rate.to_string())
            .arg("-c")
            .arg(self.config.channels.to_string())
            .arg("-d")
            .arg(self.config.duration_secs.to_string())
            .arg(&self.config.audio_path);
        cmd
    }
}

impl Recorder for ArecordRecorder {
    fn record(&mut self) -> Result<PathBuf> {
        log::info!(
            "Recording {}s from {} -> {}",
            self.config.duration_secs,
            self.config.device,
            self.config.audio_path.display()
        );

        let progress = if self.config.show_progress {
            ProgressDisplay::start(self.config.duration_secs)
        } else {
            None
        };
        let output = self.command().output();
        if let Some(progress) = progress {
            progress.finish();
        }

        let output = output.map_err(|e| {
            Error::Classification(format!("failed to run {}: {}", self.config.program, e))
        })?;
        if !output.status.success() {
            return Err(Error::Classification(format!(
                "{} exited with {}: {}",
                self.config.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(self.config.audio_path.clone())
    }
}

/// Elapsed-seconds display on stderr while a recording runs.
///
/// Purely cosmetic: it never affects the recording result.
struct ProgressDisplay {
    stop: crossbeam_channel::Sender<()>,
    handle: thread::JoinHandle<()>,
}

impl ProgressDisplay {
    fn start(total_secs: u64) -> Option<Self> {
        let (stop, stop_rx) = bounded::<()>(1);
        let spawned = thread::Builder::new()
            .name("record-progress".to_string())
            .spawn(move || {
                let mut elapsed = 0;
                loop {
                    match stop_rx.recv_timeout(Duration::from_secs(1)) {
                        Err(RecvTimeoutError::Timeout) => {
                            elapsed += 1;
                            let mut err = std::io::stderr();
                            let _ = write!(err, "\r[REC] {}/{}s", elapsed.min(total_secs), total_secs);
                            let _ = err.flush();
                        }
                        _ => break,
                    }
                }
                eprintln!();
            });

        match spawned {
            Ok(handle) => Some(Self { stop, handle }),
            Err(e) => {
                log::warn!("Recording progress display unavailable: {}", e);
                None
            }
        }
    }

    /// Stop the display and wait for it to exit
    fn finish(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            log::warn!("Recording progress display panicked");
        }
    }
}
