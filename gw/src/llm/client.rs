//! Responder trait definition

use async_trait::async_trait;

use super::{ChatMessage, LlmError};

/// Generates the wall's next line from the running dialogue
///
/// Stateless between calls: the full history travels with every request, so
/// the generator holds nothing when a session is discarded.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, history: &[ChatMessage]) -> Result<String, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Mock responder for session tests
    ///
    /// Hands out scripted replies and keeps a copy of every history it was
    /// shown, so tests can assert what context reached the generator.
    pub struct MockResponder {
        replies: Vec<String>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl MockResponder {
        pub fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: replies.into_iter().map(String::from).collect(),
                seen: Mutex::new(Vec::new()),
            }
        }

        /// A responder whose every call fails
        pub fn failing() -> Self {
            Self::new(vec![])
        }

        pub fn call_count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        /// The history passed to the most recent call
        pub fn last_history(&self) -> Option<Vec<ChatMessage>> {
            self.seen.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl Responder for MockResponder {
        async fn respond(&self, history: &[ChatMessage]) -> Result<String, LlmError> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(history.to_vec());
            self.replies
                .get(seen.len() - 1)
                .cloned()
                .ok_or_else(|| LlmError::InvalidResponse("No more mock replies".to_string()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_replies_in_order() {
            let responder = MockResponder::new(vec!["first", "second"]);
            let history = vec![ChatMessage::user("hello")];

            assert_eq!(responder.respond(&history).await.unwrap(), "first");
            assert_eq!(responder.respond(&history).await.unwrap(), "second");
            assert!(responder.respond(&history).await.is_err());
            assert_eq!(responder.call_count(), 3);
            assert_eq!(responder.last_history().unwrap(), history);
        }
    }
}
