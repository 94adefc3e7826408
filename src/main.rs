//! Diary Bot - Telegram bot that builds a class diary image
//!
//! Walks a teacher through a short form (class, subject, teacher, classwork,
//! optional homework and remarks), sends the answers to an external render
//! service and posts the resulting image back to the chat.

mod catalog;
mod config;
mod engine;
mod render;
mod state_machine;
mod telegram;

use catalog::PromptCatalog;
use config::{BotConfig, DeliveryMode};
use engine::ConversationEngine;
use render::{HttpRenderClient, LoggingRenderer};
use std::net::SocketAddr;
use std::sync::Arc;
use telegram::{run_dispatcher, run_polling, webhook_router, TelegramClient, TelegramTransport, WebhookState};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type ProductionEngine = ConversationEngine<LoggingRenderer<HttpRenderClient>, TelegramTransport>;

/// Updates buffered between the update source and the dispatcher
const UPDATE_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diary_bot=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env()?;
    tracing::info!(config = ?config, "Configuration loaded");

    let client = TelegramClient::new(config.bot_token.clone());
    let me = client.get_me().await?;
    tracing::info!(bot_id = me.id, username = ?me.username, "Connected to Telegram");

    let renderer = LoggingRenderer::new(HttpRenderClient::new(
        config.render_endpoints.clone(),
        config.render_timeout,
    )?);
    let engine: Arc<ProductionEngine> = Arc::new(ConversationEngine::new(
        PromptCatalog::default(),
        renderer,
        TelegramTransport::new(client.clone()),
    ));

    let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
    let dispatcher = tokio::spawn(run_dispatcher(rx, engine, me.username));

    match config.mode {
        DeliveryMode::Polling => {
            tokio::select! {
                () = run_polling(client, tx) => {}
                result = tokio::signal::ctrl_c() => {
                    result?;
                    tracing::info!("Shutdown signal received");
                }
            }
        }
        DeliveryMode::Webhook { port, secret } => {
            let app = webhook_router(WebhookState::new(tx, secret)).layer(TraceLayer::new_for_http());

            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            tracing::info!("Webhook server listening on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    tokio::signal::ctrl_c().await.ok();
                    tracing::info!("Shutdown signal received");
                })
                .await?;
        }
    }

    // The update sender is gone, so the dispatcher drains and stops
    dispatcher.await?;
    Ok(())
}
