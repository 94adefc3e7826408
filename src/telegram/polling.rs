//! Long-polling update source

use super::client::TelegramClient;
use super::types::Update;
use std::time::Duration;
use tokio::sync::mpsc;

/// Seconds the Bot API holds a `getUpdates` call open
const LONG_POLL: Duration = Duration::from_secs(30);

/// Pause after a failed poll
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Poll `getUpdates` and forward every update to `tx`. Returns once the
/// receiving side has gone away.
pub async fn run_polling(client: TelegramClient, tx: mpsc::Sender<Update>) {
    let mut offset: i64 = 0;
    tracing::info!("Polling Telegram for updates");

    loop {
        let updates = match client.get_updates(offset, LONG_POLL).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, "Telegram poll failed");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            // Confirms everything up to this update on the next call
            offset = offset.max(update.update_id + 1);
            if tx.send(update).await.is_err() {
                tracing::info!("Update channel closed, polling stopped");
                return;
            }
        }
    }
}
