use std::collections::HashSet;
use tokio::sync::Mutex;

/// Addresses already admitted to the frontier during one run.
#[derive(Default)]
pub struct VisitedSet {
    inner: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `url` if it is not present yet. Only the call that performed
    /// the insertion gets `true`.
    pub async fn try_admit(&self, url: &str) -> bool {
        let mut visited = self.inner.lock().await;
        if visited.contains(url) {
            false
        } else {
            visited.insert(url.to_string())
        }
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.inner.lock().await.contains(url)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
