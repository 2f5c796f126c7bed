use async_trait::async_trait;

use crate::{domain::SenderId, Result};

/// Cross-transport session port.
///
/// The relay only ever needs to reply with plain text. Inbound traffic and lifecycle
/// notifications travel the other way as [`SessionEvent`](super::types::SessionEvent)s
/// over a channel owned by the adapter's run loop.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    /// Short adapter name used in logs.
    fn name(&self) -> &str;

    async fn send_text(&self, to: &SenderId, text: &str) -> Result<()>;
}
