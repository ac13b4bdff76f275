//! Text cleanup before synthesis
//!
//! Generator output arrives with markup asterisks, emoji, and whatever else
//! the model felt like; the synthesizer reads all of it aloud verbatim unless
//! it is stripped first.

/// Characters allowed through besides alphanumerics and whitespace
const SAFE_PUNCTUATION: &str = ".,!?'\"()-";

/// Reduce text to what the synthesizer should speak
///
/// Strips markup asterisks, drops any character outside the safe
/// alphanumeric/punctuation set, and collapses runs of whitespace.
pub fn sanitize_for_speech(text: &str) -> String {
    let filtered: String = text
        .chars()
        .filter(|c| *c != '*')
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || SAFE_PUNCTUATION.contains(*c))
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(sanitize_for_speech("I am a green wall."), "I am a green wall.");
    }

    #[test]
    fn test_strips_action_asterisks() {
        assert_eq!(
            sanitize_for_speech("*rustles leaves* Hello there!"),
            "rustles leaves Hello there!"
        );
    }

    #[test]
    fn test_drops_emoji_and_symbols() {
        assert_eq!(sanitize_for_speech("Water me 🌱 please — soon™"), "Water me please soon");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(sanitize_for_speech("so   much\n\n  air"), "so much air");
    }

    #[test]
    fn test_keeps_safe_punctuation() {
        assert_eq!(
            sanitize_for_speech("Really? Yes, \"really\" (honest) - truly!"),
            "Really? Yes, \"really\" (honest) - truly!"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize_for_speech(""), "");
        assert_eq!(sanitize_for_speech("🌿🌿🌿"), "");
    }
}
