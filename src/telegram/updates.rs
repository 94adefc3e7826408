//! Update classification and dispatch

use super::types::{CallbackQuery, Message, Update};
use crate::catalog::{decode_callback, COMMAND_SENTINEL};
use crate::engine::{ConversationEngine, Disposition, DropReason, InboundEvent, Transport};
use crate::render::Renderer;
use crate::state_machine::SessionId;
use std::sync::Arc;
use tokio::sync::mpsc;

/// What an update means to the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    /// Callback query to acknowledge, whether or not it is routed
    pub callback_id: Option<String>,
    /// Event to hand to the engine
    pub routed: Option<(SessionId, InboundEvent)>,
}

/// Classify an update. `bot_username` is this bot's own username; commands
/// addressed to any other bot are ignored.
pub fn classify(update: &Update, bot_username: Option<&str>) -> Classified {
    if let Some(query) = &update.callback_query {
        return Classified {
            callback_id: Some(query.id.clone()),
            routed: classify_callback(query),
        };
    }

    Classified {
        callback_id: None,
        routed: update
            .message
            .as_ref()
            .and_then(|message| classify_message(message, bot_username)),
    }
}

fn classify_callback(query: &CallbackQuery) -> Option<(SessionId, InboundEvent)> {
    // Private chats share their id with the user
    let chat_id = query.message.as_ref().map_or(query.from.id, |m| m.chat.id);
    let (kind, value) = decode_callback(query.data.as_deref()?)?;
    let event = InboundEvent::Choice {
        kind,
        value: value.to_string(),
    };
    Some((SessionId::from(chat_id), event))
}

fn classify_message(
    message: &Message,
    bot_username: Option<&str>,
) -> Option<(SessionId, InboundEvent)> {
    let text = message.text.as_deref()?;
    let event = match parse_command(text, bot_username) {
        Some(Command::Start) => InboundEvent::Begin,
        Some(Command::Cancel) => InboundEvent::Cancel,
        Some(Command::Unknown) => return None,
        None => InboundEvent::Text {
            text: text.to_string(),
        },
    };
    Some((SessionId::from(message.chat.id), event))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Cancel,
    Unknown,
}

/// Parse `/name` or `/name@bot` from the first token of the text
fn parse_command(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let token = text.split_whitespace().next()?;
    let command = token.strip_prefix(COMMAND_SENTINEL)?;
    let (name, addressee) = match command.split_once('@') {
        Some((name, addressee)) => (name, Some(addressee)),
        None => (command, None),
    };

    // Usernames are case-insensitive
    if let (Some(addressee), Some(bot)) = (addressee, bot_username) {
        if !addressee.eq_ignore_ascii_case(bot) {
            return Some(Command::Unknown);
        }
    }

    Some(match name {
        "start" => Command::Start,
        "cancel" => Command::Cancel,
        _ => Command::Unknown,
    })
}

/// Acknowledge and route one update. Returns the engine's disposition, or
/// `None` when the update carried nothing for the engine.
pub async fn dispatch_update<R, T>(
    engine: &ConversationEngine<R, T>,
    update: Update,
    bot_username: Option<&str>,
) -> Option<Disposition>
where
    R: Renderer + 'static,
    T: Transport + 'static,
{
    let classified = classify(&update, bot_username);

    if let Some(callback_id) = &classified.callback_id {
        if let Err(e) = engine.transport().acknowledge(callback_id).await {
            tracing::warn!(update_id = update.update_id, error = %e, "Failed to acknowledge callback");
        }
    }

    let Some((session, event)) = classified.routed else {
        tracing::debug!(update_id = update.update_id, "Ignoring update");
        return None;
    };

    let disposition = engine.handle(&session, event).await;
    match &disposition {
        Disposition::Accepted => {}
        Disposition::Dropped(DropReason::NoSession) => {
            tracing::debug!(update_id = update.update_id, session = %session, "Update dropped, no active session");
        }
        Disposition::Dropped(DropReason::Rejected(e)) => {
            tracing::debug!(update_id = update.update_id, session = %session, reason = %e, "Update dropped");
        }
    }
    Some(disposition)
}

/// Consume updates until every sender is gone. Each update runs in its own
/// task so a slow render never holds up other chats.
pub async fn run_dispatcher<R, T>(
    mut rx: mpsc::Receiver<Update>,
    engine: Arc<ConversationEngine<R, T>>,
    bot_username: Option<String>,
) where
    R: Renderer + 'static,
    T: Transport + 'static,
{
    let bot_username: Option<Arc<str>> = bot_username.map(Arc::from);
    while let Some(update) = rx.recv().await {
        let engine = Arc::clone(&engine);
        let bot_username = bot_username.clone();
        tokio::spawn(async move {
            dispatch_update(&engine, update, bot_username.as_deref()).await;
        });
    }
    tracing::info!("Update channel closed, dispatcher stopping");
}
