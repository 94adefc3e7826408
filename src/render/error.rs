//! Render error types

use thiserror::Error;

/// Why a render attempt failed.
///
/// The kind is only logged; users see a generic failure notice.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid render endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("render request failed: {0}")]
    Network(String),
    #[error("render service answered with status {0}")]
    Status(u16),
    #[error("render service returned an empty body")]
    EmptyBody,
}

impl RenderError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }
}

impl From<reqwest::Error> for RenderError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::network(e.to_string()),
        }
    }
}
