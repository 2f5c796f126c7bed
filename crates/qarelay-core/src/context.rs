use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::SenderId;

/// Per-sender placeholder state.
///
/// `previous_message` is overwritten on every inbound message and not consulted by the relay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SenderContext {
    pub previous_message: String,
}

/// In-memory sender context map owned by the dispatcher.
///
/// Entries are created lazily and never evicted, so the map lives as long as the process.
#[derive(Debug, Default)]
pub struct SenderContextStore {
    inner: Mutex<HashMap<SenderId, SenderContext>>,
}

impl SenderContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a context exists for `sender`. Returns `true` if it was just created.
    pub async fn ensure(&self, sender: &SenderId) -> bool {
        let mut map = self.inner.lock().await;
        if map.contains_key(sender) {
            return false;
        }
        map.insert(sender.clone(), SenderContext::default());
        true
    }

    /// Overwrite the sender's last message, creating the context if needed.
    pub async fn record_message(&self, sender: &SenderId, text: &str) {
        let mut map = self.inner.lock().await;
        map.entry(sender.clone()).or_default().previous_message = text.to_string();
    }

    pub async fn contains(&self, sender: &SenderId) -> bool {
        self.inner.lock().await.contains_key(sender)
    }

    pub async fn get(&self, sender: &SenderId) -> Option<SenderContext> {
        self.inner.lock().await.get(sender).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
