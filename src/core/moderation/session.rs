// Session-scoped state for the moderation client.
//
// One `ModerationSession` per workspace session: the live connection handle and the
// invocation history. It is created by the caller and handed to the client, so several
// independent sessions can coexist in one process.

use super::moderation_models::{ConnectionHandle, InvocationResult};
use arc_swap::ArcSwap;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Ordered record of invocation outcomes, newest first.
#[derive(Debug, Default)]
pub struct InvocationHistory {
    entries: RwLock<VecDeque<Arc<InvocationResult>>>,
}

impl InvocationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, result: Arc<InvocationResult>) {
        self.entries.write().await.push_front(result);
    }

    /// Copy of the current entries, newest first.
    pub async fn snapshot(&self) -> Vec<Arc<InvocationResult>> {
        self.entries.read().await.iter().cloned().collect()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

pub struct ModerationSession {
    connection: ArcSwap<ConnectionHandle>,
    history: InvocationHistory,
}

impl ModerationSession {
    pub fn new(endpoint_address: impl Into<String>, service_identifier: impl Into<String>) -> Self {
        Self {
            connection: ArcSwap::from_pointee(ConnectionHandle::new(
                endpoint_address,
                service_identifier,
            )),
            history: InvocationHistory::new(),
        }
    }

    /// The live handle. Readers may observe a handle that is replaced right after.
    pub fn connection(&self) -> Arc<ConnectionHandle> {
        self.connection.load_full()
    }

    pub(crate) fn replace_connection(&self, handle: ConnectionHandle) {
        self.connection.store(Arc::new(handle));
    }

    pub fn history(&self) -> &InvocationHistory {
        &self.history
    }

    /// Drop all recorded results, e.g. when the user returns to the dashboard.
    pub async fn reset(&self) {
        self.history.clear().await;
    }
}
