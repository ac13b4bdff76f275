//! Message vocabulary and envelope header for the kiosk link
//!
//! The header is JSON on the wire: `{"type": ..., "payload": {...}, "blob_size": N}`.
//! `blob_size` is owned by the frame codec - senders never set it by hand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// The closed set of message kinds on the kiosk link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// Presence detected on the edge device; payload carries the soil reading
    MotionTrigger,
    /// Spoken line the client plays and never records after (intro, reminder, farewell)
    IntroUtterance,
    /// Spoken line the client plays, then records and submits a reply to
    ChatTurn,
    /// Recorded user speech; the audio rides in the blob
    AudioSubmission,
    /// Server asks for a fresh sensor reading
    SoilQuery,
    /// Client answers a soil query; payload carries the reading
    SoilReading,
    /// User pressed the consent control
    Consent,
    /// Conversation over; client resets its local session flags
    SessionEnd,
}

/// One frame header: kind, payload map, declared blob length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: MessageKind,

    #[serde(default)]
    pub payload: Map<String, Value>,

    /// Length of the blob that follows the header, in bytes
    #[serde(default)]
    pub blob_size: u32,
}

impl Envelope {
    /// Create an envelope with an empty payload and no blob
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            payload: Map::new(),
            blob_size: 0,
        }
    }

    /// Trigger message carrying the soil reading at detection time
    pub fn motion_trigger(soil_percent: i64) -> Self {
        let mut envelope = Self::new(MessageKind::MotionTrigger);
        envelope.payload.insert("soil".to_string(), Value::from(soil_percent));
        envelope
    }

    /// Play-only spoken line (intro, reminder, farewell)
    pub fn intro_utterance() -> Self {
        Self::new(MessageKind::IntroUtterance)
    }

    /// Spoken line that opens a recording turn on the client
    pub fn chat_turn() -> Self {
        Self::new(MessageKind::ChatTurn)
    }

    /// Recorded user speech; the codec fills in the blob
    pub fn audio_submission() -> Self {
        Self::new(MessageKind::AudioSubmission)
    }

    /// Request for a fresh sensor reading
    pub fn soil_query() -> Self {
        Self::new(MessageKind::SoilQuery)
    }

    /// Answer to a soil query
    pub fn soil_reading(soil_percent: i64) -> Self {
        let mut envelope = Self::new(MessageKind::SoilReading);
        envelope.payload.insert("soil".to_string(), Value::from(soil_percent));
        envelope
    }

    /// User pressed the consent control
    pub fn consent() -> Self {
        Self::new(MessageKind::Consent)
    }

    /// Conversation over
    pub fn session_end() -> Self {
        Self::new(MessageKind::SessionEnd)
    }

    /// Read the soil reading out of the payload
    ///
    /// A missing, non-numeric, or unparseable value reads as 0: the kiosk
    /// treats an unknown reading as dry rather than failing the session.
    pub fn soil_percent(&self) -> i64 {
        let value = match self.payload.get("soil") {
            Some(value) => value,
            None => {
                debug!(kind = ?self.kind, "soil_percent: no soil key in payload");
                return 0;
            }
        };

        match value {
            Value::Number(n) => n.as_i64().unwrap_or(0),
            Value::String(s) => s.trim().parse().unwrap_or_else(|_| {
                debug!(raw = %s, "soil_percent: unparseable soil value");
                0
            }),
            _ => {
                debug!(kind = ?self.kind, "soil_percent: soil value is not a number");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&MessageKind::MotionTrigger).unwrap();
        assert_eq!(json, r#""motion-trigger""#);

        let json = serde_json::to_string(&MessageKind::AudioSubmission).unwrap();
        assert_eq!(json, r#""audio-submission""#);

        let kind: MessageKind = serde_json::from_str(r#""session-end""#).unwrap();
        assert_eq!(kind, MessageKind::SessionEnd);
    }

    #[test]
    fn test_trigger_wire_shape() {
        let envelope = Envelope::motion_trigger(42);
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"type":"motion-trigger","payload":{"soil":42},"blob_size":0}"#);
    }

    #[test]
    fn test_header_defaults_apply() {
        // A minimal header from an older peer still decodes
        let envelope: Envelope = serde_json::from_str(r#"{"type":"consent"}"#).unwrap();
        assert_eq!(envelope.kind, MessageKind::Consent);
        assert!(envelope.payload.is_empty());
        assert_eq!(envelope.blob_size, 0);
    }

    #[test]
    fn test_soil_percent_reads_number() {
        assert_eq!(Envelope::motion_trigger(15).soil_percent(), 15);
        assert_eq!(Envelope::soil_reading(100).soil_percent(), 100);
    }

    #[test]
    fn test_soil_percent_reads_numeric_string() {
        let mut envelope = Envelope::new(MessageKind::SoilReading);
        envelope.payload.insert("soil".to_string(), Value::from("37"));
        assert_eq!(envelope.soil_percent(), 37);
    }

    #[test]
    fn test_soil_percent_missing_is_dry() {
        let envelope = Envelope::new(MessageKind::MotionTrigger);
        assert_eq!(envelope.soil_percent(), 0);
    }

    #[test]
    fn test_soil_percent_garbage_is_dry() {
        let mut envelope = Envelope::new(MessageKind::MotionTrigger);
        envelope.payload.insert("soil".to_string(), Value::from("damp"));
        assert_eq!(envelope.soil_percent(), 0);

        envelope.payload.insert("soil".to_string(), Value::Bool(true));
        assert_eq!(envelope.soil_percent(), 0);
    }

    #[test]
    fn test_roundtrip_all_kinds() {
        let envelopes = vec![
            Envelope::motion_trigger(12),
            Envelope::intro_utterance(),
            Envelope::chat_turn(),
            Envelope::audio_submission(),
            Envelope::soil_query(),
            Envelope::soil_reading(55),
            Envelope::consent(),
            Envelope::session_end(),
        ];

        for envelope in envelopes {
            let json = serde_json::to_string(&envelope).unwrap();
            let parsed: Envelope = serde_json::from_str(&json).unwrap();
            assert_eq!(envelope, parsed);
        }
    }
}
