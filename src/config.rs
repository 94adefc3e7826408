//! Runtime configuration from environment variables

use crate::render::{RenderEndpoints, RenderError, DEFAULT_RENDER_TIMEOUT};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_RENDER_URL: &str = "DIARY_RENDER_URL";
pub const ENV_RENDER_URL_NO_HW: &str = "DIARY_RENDER_URL_NO_HW";
pub const ENV_RENDER_TIMEOUT: &str = "DIARY_RENDER_TIMEOUT_SECS";
pub const ENV_WEBHOOK_PORT: &str = "DIARY_WEBHOOK_PORT";
pub const ENV_WEBHOOK_SECRET: &str = "DIARY_WEBHOOK_SECRET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error(transparent)]
    Endpoint(#[from] RenderError),
}

/// How updates reach the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMode {
    Polling,
    Webhook { port: u16, secret: Option<String> },
}

#[derive(Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub render_endpoints: RenderEndpoints,
    pub render_timeout: Duration,
    pub mode: DeliveryMode,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match &self.mode {
            DeliveryMode::Polling => "polling".to_string(),
            DeliveryMode::Webhook { port, .. } => format!("webhook:{port}"),
        };
        f.debug_struct("BotConfig")
            .field("bot_token", &"<redacted>")
            .field("render_endpoints", &self.render_endpoints)
            .field("render_timeout", &self.render_timeout)
            .field("mode", &mode)
            .finish()
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name -> value lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let bot_token = require(ENV_BOT_TOKEN)?;
        let render_endpoints =
            RenderEndpoints::parse(&require(ENV_RENDER_URL)?, &require(ENV_RENDER_URL_NO_HW)?)?;

        let render_timeout = match get(ENV_RENDER_TIMEOUT) {
            None => DEFAULT_RENDER_TIMEOUT,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: ENV_RENDER_TIMEOUT,
                        reason: format!("expected a positive number of seconds, got {raw:?}"),
                    })
                }
            },
        };

        let mode = match get(ENV_WEBHOOK_PORT) {
            None => DeliveryMode::Polling,
            Some(raw) => {
                let port = raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                    name: ENV_WEBHOOK_PORT,
                    reason: e.to_string(),
                })?;
                DeliveryMode::Webhook {
                    port,
                    secret: get(ENV_WEBHOOK_SECRET),
                }
            }
        };

        Ok(Self {
            bot_token,
            render_endpoints,
            render_timeout,
            mode,
        })
    }
}
