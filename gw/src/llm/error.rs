//! Reply generator error types

use thiserror::Error;

/// Errors from the reply generator
///
/// All of these are non-fatal at the session layer: a failed generation is
/// replaced by a fixed apology line and the conversation continues.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
