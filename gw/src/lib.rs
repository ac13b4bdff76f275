//! Greenwall - conversational plant-wall kiosk
//!
//! Two processes share this crate. The `brain` binary listens for one edge
//! device and drives each conversation end-to-end: motion trigger, spoken
//! intro, consent wait with a single reminder, fresh-soil recheck, then a
//! turn-taking chat loop until the visitor leaves or a wait expires. The
//! `edge` binary runs on the sensor device: it polls the serial sensor link,
//! debounces motion triggers, watches for the consent key, plays synthesized
//! replies, records the visitor, and reconnects whenever the link drops.
//!
//! Speech synthesis, transcription, reply generation, audio capture and
//! playback, and the serial link itself are external capabilities behind
//! narrow trait or subprocess seams; everything here is the coordination.
//!
//! # Modules
//!
//! - [`brain`] - accept loop and the session state machine
//! - [`edge`] - event multiplexer, sensor feed, consent latch, audio I/O
//! - [`speech`] - text sanitizer, synthesizer and transcriber seams
//! - [`llm`] - dialogue history types and the reply generator seam
//! - [`config`] - YAML configuration with defaults for every knob
//! - [`logging`] - tracing subscriber setup shared by both binaries

pub mod brain;
pub mod config;
pub mod edge;
pub mod llm;
pub mod logging;
pub mod speech;

// Re-export commonly used types
pub use brain::{BrainServer, Session, SessionError, SessionOutcome};
pub use config::{AudioConfig, Config, LlmConfig, NetConfig, SensorConfig, SessionConfig, SpeechConfig};
pub use edge::{AudioIo, ConsentLatch, EdgeClient, SensorHub, SensorSnapshot};
pub use llm::{ChatMessage, ChatRole, LlmError, OllamaClient, Responder};
pub use speech::{sanitize_for_speech, EspeakSynthesizer, SpeechError, Synthesizer, Transcriber, WhisperTranscriber};
