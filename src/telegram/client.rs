//! Thin typed client for the Telegram Bot API

use super::types::{
    AnswerCallbackQueryRequest, ApiResponse, DeleteMessageRequest, GetUpdatesRequest,
    InlineKeyboardMarkup, Message, SendMessageRequest, Update, User,
};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Slack on top of the long-poll window before the HTTP request gives up
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Timeout for every call other than `getUpdates`
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

const PHOTO_FILE_NAME: &str = "diary.png";

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
    #[error("Bot API error: {description}")]
    Api { description: String },
    #[error("Bot API response had no result")]
    MissingResult,
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs embed the bot token
        TelegramError::Http(e.without_url())
    }
}

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_API_BASE, token)
    }

    /// Point the client at another Bot API server (local API server, tests)
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.token)
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.method_url(method))
            .timeout(CALL_TIMEOUT)
            .json(body)
            .send()
            .await?;
        unpack(response.json().await?)
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdatesRequest {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: &["message", "callback_query"],
        };
        let response = self
            .http
            .post(self.method_url("getUpdates"))
            .timeout(timeout + POLL_GRACE)
            .json(&body)
            .send()
            .await?;
        unpack(response.json().await?)
    }

    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        let body = SendMessageRequest {
            chat_id,
            text,
            reply_markup,
        };
        self.call("sendMessage", &body).await
    }

    /// Upload an image as a photo message
    pub async fn send_photo(
        &self,
        chat_id: &str,
        image: Vec<u8>,
        caption: &str,
    ) -> Result<Message, TelegramError> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("photo", Part::bytes(image).file_name(PHOTO_FILE_NAME));

        let response = self
            .http
            .post(self.method_url("sendPhoto"))
            .timeout(CALL_TIMEOUT)
            .multipart(form)
            .send()
            .await?;
        unpack(response.json().await?)
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TelegramError> {
        let body = AnswerCallbackQueryRequest { callback_query_id };
        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    pub async fn delete_message(&self, chat_id: &str, message_id: i64) -> Result<(), TelegramError> {
        let body = DeleteMessageRequest {
            chat_id,
            message_id,
        };
        let _: bool = self.call("deleteMessage", &body).await?;
        Ok(())
    }
}

fn unpack<T>(response: ApiResponse<T>) -> Result<T, TelegramError> {
    if !response.ok {
        return Err(TelegramError::Api {
            description: response
                .description
                .unwrap_or_else(|| "unknown error".to_string()),
        });
    }
    response.result.ok_or(TelegramError::MissingResult)
}
