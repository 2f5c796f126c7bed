//! Telegram update handlers.
//!
//! Handlers only translate updates into session events; the relay loop does the rest.

use teloxide::{prelude::*, types::Message};
use tokio::sync::mpsc;
use tracing::warn;

use qarelay_core::messaging::types::SessionEvent;

mod text;

pub use text::inbound_from_parts;

pub async fn handle_message(
    msg: Message,
    events: mpsc::Sender<SessionEvent>,
) -> ResponseResult<()> {
    let inbound = inbound_from_parts(msg.chat.id, msg.text(), msg.caption());
    if events.send(SessionEvent::Message(inbound)).await.is_err() {
        warn!(chat_id = msg.chat.id.0, "relay loop closed; dropping telegram message");
    }
    Ok(())
}
