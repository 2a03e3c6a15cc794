//! Allow-list of numbers that may trigger auto-replies

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::phone::normalize;

/// Set of normalized numbers we have messaged ourselves.
///
/// Membership is monotonic: there is no removal.
#[derive(Debug, Default, Clone)]
pub struct AllowList {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    members: HashSet<String>,
    // insertion order for snapshots
    order: Vec<String>,
}

impl AllowList {
    /// Create an empty allow-list
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a number. Returns `true` if it was not present before.
    pub async fn add(&self, number: &str) -> bool {
        let key = normalize(number);
        if key.is_empty() {
            return false;
        }

        let mut inner = self.inner.write().await;
        if inner.members.insert(key.clone()) {
            inner.order.push(key);
            true
        } else {
            false
        }
    }

    /// Check membership of a number
    pub async fn contains(&self, number: &str) -> bool {
        let key = normalize(number);
        self.inner.read().await.members.contains(&key)
    }

    /// Members in the order they were first added
    pub async fn snapshot(&self) -> Vec<String> {
        self.inner.read().await.order.clone()
    }

    /// Number of members
    pub async fn len(&self) -> usize {
        self.inner.read().await.order.len()
    }

    /// Whether the allow-list is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
