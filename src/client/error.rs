//! Client error types.

/// Errors surfaced by the learner client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response; `message` comes from the server's error body
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Sign in required")]
    Unauthenticated,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Gateway protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Message suitable for a notification banner
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } if !message.is_empty() => message.clone(),
            Self::Unauthenticated => "Please sign in to continue.".into(),
            _ => "Something went wrong. Please try again.".into(),
        }
    }
}
