//! Everything the wall says, and the words it listens for
//!
//! Fixed utterances live here so the state machine reads as control flow.
//! Keyword matching is case-insensitive substring matching: "goodbye" ends
//! the chat just like "bye" does, which is what a kiosk microphone needs.

/// Persona handed to the reply generator as the first history entry
pub const SYSTEM_PROMPT: &str = "You are a sentient vertical green wall, a living, breathing plant \
     chatting with a visitor by voice. Keep your responses concise and friendly. You may mention \
     your need for water when your soil is dry, and you can refer to yourself as a plant wall or \
     green wall.";

pub const BASE_INTRO: &str = "Welcome. I am a vertical living green wall.";

pub const CONSENT_PROMPT: &str = "Would you like to speak with me? Please press the button to start.";

pub const REMINDER: &str = "I am still waiting. Press the button if you wish to speak.";

pub const FAREWELL: &str = "I understand. Have a peaceful day.";

pub const APOLOGY: &str = "I am having trouble thinking right now.";

pub const DIDNT_HEAR: &str = "I didn't hear anything. Please try again.";

pub const READY: &str = "Great. I am ready.";

/// Words that end the conversation
pub const EXIT_KEYWORDS: &[&str] = &["bye", "stop", "exit"];

/// Words that make the wall check its sensors mid-conversation
pub const STATUS_KEYWORDS: &[&str] = &["soil", "moisture", "water", "status"];

/// The spoken introduction, framed by how thirsty the wall is
pub fn intro_line(soil_percent: i64, dry_threshold: i64) -> String {
    if soil_percent < dry_threshold {
        format!(
            "{BASE_INTRO} My soil moisture is low at {soil_percent} percent. It is dry. \
             Could you please help water me? {CONSENT_PROMPT}"
        )
    } else {
        format!(
            "{BASE_INTRO} My soil moisture is a healthy {soil_percent} percent. \
             I do not need water. {CONSENT_PROMPT}"
        )
    }
}

/// The remark after the post-consent soil recheck of a dry wall
pub fn recheck_line(soil_percent: i64, dry_threshold: i64) -> String {
    if soil_percent < dry_threshold {
        format!(
            "I see my soil is still dry at {soil_percent} percent. \
             Perhaps the water needs time to soak in. We can talk anyway."
        )
    } else {
        format!(
            "Thank you! I sense the water. My moisture is now {soil_percent} percent. \
             I feel much better."
        )
    }
}

/// The remark that opens the chat loop
pub fn opening_line(remark: &str) -> String {
    format!("{remark} I am listening.")
}

/// History-only note carrying a fresh reading to the generator
pub fn soil_note(soil_percent: i64) -> String {
    format!("Sensor note: current soil moisture is {soil_percent} percent.")
}

pub fn wants_exit(transcript: &str) -> bool {
    contains_any(transcript, EXIT_KEYWORDS)
}

pub fn wants_status(transcript: &str) -> bool {
    contains_any(transcript, STATUS_KEYWORDS)
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    let lower = text.to_lowercase();
    words.iter().any(|word| lower.contains(word))
}
