//! Synthesizer seam and the espeak-ng implementation

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{sanitize_for_speech, SpeechError};
use crate::config::{AudioConfig, SpeechConfig};

/// Renders an utterance to a playable audio file
///
/// One utterance at a time; each call overwrites the previous output file.
/// The session machine only ever needs the most recent utterance, and the
/// frame codec copies the bytes onto the wire before the next call.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<PathBuf, SpeechError>;
}

/// espeak-ng subprocess synthesizer
pub struct EspeakSynthesizer {
    command: String,
    voice: String,
    out_path: PathBuf,
}

impl EspeakSynthesizer {
    pub fn new(speech: &SpeechConfig, audio: &AudioConfig) -> Self {
        Self {
            command: speech.synth_command.clone(),
            voice: speech.voice.clone(),
            out_path: audio.synth_output_path(),
        }
    }
}

#[async_trait]
impl Synthesizer for EspeakSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<PathBuf, SpeechError> {
        let clean = sanitize_for_speech(text);
        debug!(chars = clean.len(), "synthesize: rendering utterance");

        let status = Command::new(&self.command)
            .arg("-v")
            .arg(&self.voice)
            .arg("-w")
            .arg(&self.out_path)
            .arg(&clean)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| SpeechError::Spawn {
                program: self.command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(SpeechError::Command {
                program: self.command.clone(),
                status,
            });
        }

        if !self.out_path.exists() {
            return Err(SpeechError::MissingOutput {
                program: self.command.clone(),
                path: self.out_path.clone(),
            });
        }

        Ok(self.out_path.clone())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Mock synthesizer for session tests
    ///
    /// Records every text it was asked to speak and writes a tiny stand-in
    /// audio file so blob plumbing stays exercised.
    pub struct MockSynthesizer {
        out_path: PathBuf,
        spoken: Mutex<Vec<String>>,
        fail: bool,
    }

    impl MockSynthesizer {
        pub fn new(out_path: PathBuf) -> Self {
            Self {
                out_path,
                spoken: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        /// A synthesizer whose every call fails
        pub fn failing(out_path: PathBuf) -> Self {
            Self {
                out_path,
                spoken: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        /// Every text synthesized so far, in order
        pub fn spoken(&self) -> Vec<String> {
            self.spoken.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Synthesizer for MockSynthesizer {
        async fn synthesize(&self, text: &str) -> Result<PathBuf, SpeechError> {
            self.spoken.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(SpeechError::MissingOutput {
                    program: "mock-synth".to_string(),
                    path: self.out_path.clone(),
                });
            }
            tokio::fs::write(&self.out_path, b"mock audio").await?;
            Ok(self.out_path.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn synthesizer(command: &str, temp: &TempDir) -> EspeakSynthesizer {
        let speech = SpeechConfig {
            synth_command: command.to_string(),
            ..Default::default()
        };
        let audio = AudioConfig {
            work_dir: temp.path().to_path_buf(),
            ..Default::default()
        };
        EspeakSynthesizer::new(&speech, &audio)
    }

    #[tokio::test]
    async fn test_failing_command_reported() {
        let temp = TempDir::new().unwrap();
        let synth = synthesizer("false", &temp);

        let err = synth.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, SpeechError::Command { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary_reported() {
        let temp = TempDir::new().unwrap();
        let synth = synthesizer("/nonexistent/espeak-ng", &temp);

        let err = synth.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, SpeechError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_mock_records_spoken_texts() {
        let temp = TempDir::new().unwrap();
        let mock = mock::MockSynthesizer::new(temp.path().join("out.wav"));

        let path = mock.synthesize("first line").await.unwrap();
        mock.synthesize("second line").await.unwrap();

        assert!(path.exists());
        assert_eq!(mock.spoken(), vec!["first line", "second line"]);
    }
}
