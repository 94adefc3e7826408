//! Trait abstractions for the chat transport
//!
//! The engine only talks to the outside world through these, so it can be
//! driven by mock implementations in tests.

use crate::catalog::Prompt;
use crate::state_machine::{MessageHandle, SessionId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// What the engine asks the transport to show or remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// A question, with buttons when the prompt has options
    ShowPrompt(Prompt),
    /// Status shown while the render is outstanding
    ShowGenerating(String),
    /// The rendered diary
    DeliverImage { image: Vec<u8>, caption: String },
    /// Generic notice that rendering failed
    ReportFailure(String),
    /// "Make another?" prompt shown after every render attempt
    OfferRestart(Prompt),
    /// Plain informational text
    Notice(String),
    /// Remove messages shown earlier for the session
    Discard(Vec<MessageHandle>),
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::ShowPrompt(_) => "show_prompt",
            Directive::ShowGenerating(_) => "show_generating",
            Directive::DeliverImage { .. } => "deliver_image",
            Directive::ReportFailure(_) => "report_failure",
            Directive::OfferRestart(_) => "offer_restart",
            Directive::Notice(_) => "notice",
            Directive::Discard(_) => "discard",
        }
    }
}

/// Delivery failed. Always best-effort: logged, never fatal to a session.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outbound side of the chat transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one directive. Returns a handle when a message was created
    /// that the engine may later ask to discard.
    async fn deliver(
        &self,
        session: &SessionId,
        directive: Directive,
    ) -> Result<Option<MessageHandle>, TransportError>;

    /// Clear the pending indicator of a button press, whether or not the
    /// press is used
    async fn acknowledge(&self, callback_id: &str) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn deliver(
        &self,
        session: &SessionId,
        directive: Directive,
    ) -> Result<Option<MessageHandle>, TransportError> {
        (**self).deliver(session, directive).await
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), TransportError> {
        (**self).acknowledge(callback_id).await
    }
}
