//! Telegram transport adapter
//!
//! Turns Bot API updates into engine events and engine directives into Bot
//! API calls. Updates arrive either by long polling or through a webhook;
//! both feed the same dispatcher channel.

mod client;
mod polling;
pub mod types;
mod updates;
mod webhook;

pub use client::TelegramClient;
pub use polling::run_polling;
pub use updates::run_dispatcher;
pub use webhook::{webhook_router, WebhookState};

use crate::catalog::Prompt;
use crate::engine::{Directive, Transport, TransportError};
use crate::state_machine::{MessageHandle, SessionId};
use async_trait::async_trait;
use client::TelegramError;
use types::{InlineKeyboardButton, InlineKeyboardMarkup};

impl From<TelegramError> for TransportError {
    fn from(e: TelegramError) -> Self {
        TransportError::new(e.to_string())
    }
}

/// One button per row, in catalog order
fn keyboard(prompt: &Prompt) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<_> = prompt
        .callbacks()
        .into_iter()
        .map(|(text, callback_data)| {
            vec![InlineKeyboardButton {
                text,
                callback_data,
            }]
        })
        .collect();

    (!rows.is_empty()).then_some(InlineKeyboardMarkup {
        inline_keyboard: rows,
    })
}

/// `Transport` backed by the Bot API. The session id is the chat id.
#[derive(Debug, Clone)]
pub struct TelegramTransport {
    client: TelegramClient,
}

impl TelegramTransport {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }

    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<Option<MessageHandle>, TransportError> {
        let message = self.client.send_message(chat_id, text, markup).await?;
        Ok(Some(MessageHandle(message.message_id)))
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn deliver(
        &self,
        session: &SessionId,
        directive: Directive,
    ) -> Result<Option<MessageHandle>, TransportError> {
        let chat_id = session.as_str();
        match directive {
            Directive::ShowPrompt(prompt) | Directive::OfferRestart(prompt) => {
                self.send_text(chat_id, &prompt.text, keyboard(&prompt)).await
            }
            Directive::ShowGenerating(text)
            | Directive::ReportFailure(text)
            | Directive::Notice(text) => self.send_text(chat_id, &text, None).await,
            Directive::DeliverImage { image, caption } => {
                let message = self.client.send_photo(chat_id, image, &caption).await?;
                Ok(Some(MessageHandle(message.message_id)))
            }
            Directive::Discard(handles) => {
                let mut failed = 0;
                for handle in &handles {
                    if let Err(e) = self.client.delete_message(chat_id, handle.0).await {
                        tracing::debug!(session = %session, message_id = handle.0, error = %e, "deleteMessage failed");
                        failed += 1;
                    }
                }
                if failed > 0 {
                    return Err(TransportError::new(format!(
                        "{failed} of {} messages could not be deleted",
                        handles.len()
                    )));
                }
                Ok(None)
            }
        }
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), TransportError> {
        self.client.answer_callback_query(callback_id).await?;
        Ok(())
    }
}
