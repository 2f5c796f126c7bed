use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

use qarelay_core::messaging::types::SessionEvent;

use crate::handlers;
use crate::TelegramConnector;

/// Classify a failed `getMe` as an auth failure or a plain disconnect.
pub fn startup_failure_event(e: &teloxide::RequestError) -> SessionEvent {
    match e {
        // teloxide reports Telegram's "Unauthorized" (bad bot token) as `NotFound`.
        teloxide::RequestError::Api(teloxide::ApiError::NotFound) => {
            SessionEvent::AuthFailure(format!("telegram rejected the bot token: {e}"))
        }
        other => SessionEvent::Disconnected(format!("telegram unreachable: {other}")),
    }
}

/// Long-poll Telegram and forward updates as session events until `shutdown` fires.
///
/// Session failures are reported as events and never retried. The events sender is held
/// until shutdown so the relay loop stays up, as the process does not exit on its own.
pub async fn run_polling(
    connector: Arc<TelegramConnector>,
    events: mpsc::Sender<SessionEvent>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let bot = connector.bot();

    match bot.get_me().await {
        Ok(me) => {
            info!(username = %me.username(), "telegram session authenticated");
            let _ = events.send(SessionEvent::Ready).await;
        }
        Err(e) => {
            let _ = events.send(startup_failure_event(&e)).await;
            shutdown.cancelled().await;
            return Ok(());
        }
    }

    let handler = Update::filter_message().endpoint(handlers::handle_message);

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![events.clone()])
        .default_handler(|upd| async move {
            trace!(update_id = upd.id, "ignoring non-message update");
        })
        .build();

    tokio::select! {
        _ = dispatcher.dispatch() => {
            let _ = events
                .send(SessionEvent::Disconnected("telegram dispatcher stopped".to_string()))
                .await;
            shutdown.cancelled().await;
        }
        _ = shutdown.cancelled() => {
            info!("telegram connector shutting down");
        }
    }

    Ok(())
}
