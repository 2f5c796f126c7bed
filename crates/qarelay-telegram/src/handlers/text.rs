use qarelay_core::messaging::types::InboundMessage;

use crate::sender_for_chat;

/// Build the relay message for a Telegram update.
///
/// Text wins over a caption. Anything else (stickers, voice, ...) is relayed as empty text.
pub fn inbound_from_parts(
    chat_id: teloxide::types::ChatId,
    text: Option<&str>,
    caption: Option<&str>,
) -> InboundMessage {
    InboundMessage {
        sender: sender_for_chat(chat_id),
        text: text.or(caption).unwrap_or_default().to_string(),
    }
}
