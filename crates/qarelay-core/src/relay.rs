//! Session event loop: one cancellable task per inbound message.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, error, info, warn};

use crate::{dispatcher::RelayDispatcher, messaging::types::SessionEvent};

/// Counters reported when the loop exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub messages: usize,
    pub disconnects: usize,
    pub auth_failures: usize,
}

/// Consume connector events until the stream closes or `shutdown` fires.
///
/// Lifecycle events are logged only; they never stop the loop. On exit the loop waits for
/// in-flight message tasks. Tasks still running when `shutdown` fires end without replying.
pub async fn run(
    mut events: mpsc::Receiver<SessionEvent>,
    dispatcher: Arc<RelayDispatcher>,
    shutdown: CancellationToken,
) -> RelayStats {
    let tracker = TaskTracker::new();
    let mut stats = RelayStats::default();

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!("shutdown requested; relay stops accepting events");
                break;
            }

            ev = events.recv() => {
                let Some(ev) = ev else {
                    info!("session event stream closed");
                    break;
                };
                on_event(ev, &dispatcher, &tracker, &shutdown, &mut stats);
            }
        }
    }

    tracker.close();
    if !tracker.is_empty() {
        info!(in_flight = tracker.len(), "waiting for in-flight messages");
    }
    tracker.wait().await;
    stats
}

fn on_event(
    ev: SessionEvent,
    dispatcher: &Arc<RelayDispatcher>,
    tracker: &TaskTracker,
    shutdown: &CancellationToken,
    stats: &mut RelayStats,
) {
    debug!(kind = ev.kind(), "session event");
    match ev {
        SessionEvent::Ready => info!("client is ready"),
        SessionEvent::QrCode(payload) => {
            info!("pairing code issued; scan it with the chat app");
            println!("{payload}");
        }
        SessionEvent::AuthFailure(reason) => {
            stats.auth_failures += 1;
            error!(%reason, "authentication failure");
        }
        SessionEvent::Disconnected(reason) => {
            stats.disconnects += 1;
            warn!(%reason, "client was logged out");
        }
        SessionEvent::Message(msg) => {
            stats.messages += 1;
            let dispatcher = dispatcher.clone();
            let cancel = shutdown.child_token();
            tracker.spawn(async move {
                let sender = msg.sender.clone();
                tokio::select! {
                    _ = cancel.cancelled() => debug!(%sender, "message task cancelled"),
                    outcome = dispatcher.handle_message(msg) => {
                        debug!(%sender, ?outcome, "message handled");
                    }
                }
            });
        }
    }
}
