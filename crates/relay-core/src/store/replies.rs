//! Last-known reply per number

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::phone::normalize;

/// Last-write-wins board of inbound replies keyed by normalized number.
#[derive(Debug, Default, Clone)]
pub struct ReplyStore {
    replies: Arc<RwLock<BTreeMap<String, String>>>,
}

impl ReplyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reply, overwriting any previous one for the same number
    pub async fn record(&self, number: &str, text: &str) {
        let mut replies = self.replies.write().await;
        replies.insert(normalize(number), text.to_string());
    }

    /// Latest reply from a number, if any
    pub async fn get(&self, number: &str) -> Option<String> {
        let replies = self.replies.read().await;
        replies.get(&normalize(number)).cloned()
    }

    /// Snapshot of every recorded reply
    pub async fn all(&self) -> BTreeMap<String, String> {
        self.replies.read().await.clone()
    }

    /// Number of numbers with a recorded reply
    pub async fn len(&self) -> usize {
        self.replies.read().await.len()
    }

    /// Whether no reply has been recorded yet
    pub async fn is_empty(&self) -> bool {
        self.replies.read().await.is_empty()
    }
}
