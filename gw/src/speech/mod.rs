//! Speech capabilities: synthesis and transcription
//!
//! Both are external tools reached over subprocess seams. The traits keep the
//! session logic testable; the implementations shell out the way the kiosk
//! hardware expects.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

mod sanitize;
mod synth;
mod transcribe;

pub use sanitize::sanitize_for_speech;
pub use synth::{EspeakSynthesizer, Synthesizer};
pub use transcribe::{Transcriber, WhisperTranscriber};

#[cfg(test)]
pub use synth::mock::MockSynthesizer;
#[cfg(test)]
pub use transcribe::mock::MockTranscriber;

/// Errors from the speech and audio tools
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}")]
    Command { program: String, status: ExitStatus },

    #[error("{program} produced no output at {path}")]
    MissingOutput { program: String, path: PathBuf },

    #[error(transparent)]
    Io(#[from] io::Error),
}
