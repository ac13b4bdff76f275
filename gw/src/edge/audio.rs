//! Audio playback and capture via the kiosk's ALSA tools
//!
//! Both calls block the control loop on purpose: the kiosk speaks, then
//! listens, one thing at a time.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::config::AudioConfig;
use crate::speech::SpeechError;

/// Subprocess-backed playback and capture
pub struct AudioIo {
    config: AudioConfig,
}

impl AudioIo {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    /// Play one audio file, returning when playback ends
    pub async fn play(&self, file: &Path) -> Result<(), SpeechError> {
        debug!(file = %file.display(), "play: starting");
        let status = Command::new(&self.config.play_command)
            .arg("-q")
            .arg(file)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| SpeechError::Spawn {
                program: self.config.play_command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(SpeechError::Command {
                program: self.config.play_command.clone(),
                status,
            });
        }
        Ok(())
    }

    /// Record a fixed-length clip from the microphone
    pub async fn record(&self, out: &Path, seconds: u64) -> Result<(), SpeechError> {
        debug!(out = %out.display(), seconds, "record: starting");
        let status = Command::new(&self.config.record_command)
            .arg("-D")
            .arg(&self.config.mic_device)
            .arg("-d")
            .arg(seconds.to_string())
            .arg("-f")
            .arg("S16_LE")
            .arg("-r")
            .arg(self.config.sample_rate.to_string())
            .arg("-t")
            .arg("wav")
            .arg("-N")
            .arg(out)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| SpeechError::Spawn {
                program: self.config.record_command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(SpeechError::Command {
                program: self.config.record_command.clone(),
                status,
            });
        }
        if !out.exists() {
            return Err(SpeechError::MissingOutput {
                program: self.config.record_command.clone(),
                path: out.to_path_buf(),
            });
        }
        Ok(())
    }
}
