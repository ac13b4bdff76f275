//! Transcriber seam and the whisper-cli implementation

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::SpeechError;
use crate::config::SpeechConfig;

/// Turns a recorded clip into text
///
/// Callers apply the empty-on-failure policy: a transcriber error becomes an
/// empty transcript at the session layer, never a dropped conversation.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String, SpeechError>;
}

/// whisper.cpp CLI transcriber, transcript on stdout
pub struct WhisperTranscriber {
    command: String,
    model: Option<PathBuf>,
}

impl WhisperTranscriber {
    pub fn new(speech: &SpeechConfig) -> Self {
        Self {
            command: speech.transcribe_command.clone(),
            model: speech.transcribe_model.clone(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, SpeechError> {
        debug!(audio = %audio.display(), "transcribe: starting");

        let mut command = Command::new(&self.command);
        if let Some(model) = &self.model {
            command.arg("-m").arg(model);
        }
        let output = command
            .arg("-np")
            .arg("-nt")
            .arg("-f")
            .arg(audio)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| SpeechError::Spawn {
                program: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            warn!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "transcribe: tool failed"
            );
            return Err(SpeechError::Command {
                program: self.command.clone(),
                status: output.status,
            });
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(chars = transcript.len(), "transcribe: done");
        Ok(transcript)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stdout_is_the_transcript() {
        // `echo` stands in for the tool: it prints its arguments, which is
        // enough to prove stdout capture and trimming.
        let speech = SpeechConfig {
            transcribe_command: "echo".to_string(),
            ..Default::default()
        };
        let transcriber = WhisperTranscriber::new(&speech);

        let transcript = transcriber.transcribe(Path::new("clip.wav")).await.unwrap();
        assert!(transcript.contains("clip.wav"));
    }

    #[tokio::test]
    async fn test_failing_tool_reported() {
        let speech = SpeechConfig {
            transcribe_command: "false".to_string(),
            ..Default::default()
        };
        let transcriber = WhisperTranscriber::new(&speech);

        let err = transcriber.transcribe(Path::new("clip.wav")).await.unwrap_err();
        assert!(matches!(err, SpeechError::Command { .. }));
    }

    #[tokio::test]
    async fn test_mock_script_plays_in_order() {
        let mock = mock::MockTranscriber::new(vec!["hello wall", ""]);

        assert_eq!(mock.transcribe(Path::new("a.wav")).await.unwrap(), "hello wall");
        assert_eq!(mock.transcribe(Path::new("b.wav")).await.unwrap(), "");
        assert!(mock.transcribe(Path::new("c.wav")).await.is_err());
    }
}
