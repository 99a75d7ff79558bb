//! In-memory hub

use crate::{Hub, HubResult, ServiceRegistry, StateStore};
use async_trait::async_trait;
use ench_core::{ServiceCall, State};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A hub living entirely in process memory
///
/// States come from a [`StateStore`], service calls are routed through a
/// [`ServiceRegistry`]. Calling a service nobody registered fails the same
/// way a real hub would reject an unknown notifier.
#[derive(Default)]
pub struct MemoryHub {
    store: Arc<StateStore>,
    services: Arc<ServiceRegistry>,
}

impl MemoryHub {
    /// Create an empty hub with no states and no services
    pub fn new() -> Self {
        Self::default()
    }

    /// The state store backing this hub
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Register a notification service that records every call it receives
    pub fn record_service(&self, domain: &str, service: &str) -> NotificationLog {
        let log = NotificationLog::default();
        let sink = log.clone();
        self.services.register(domain, service, move |call| {
            let sink = sink.clone();
            async move {
                sink.calls.lock().await.push(call);
                Ok(())
            }
        });
        log
    }
}

#[async_trait]
impl Hub for MemoryHub {
    async fn states(&self) -> HubResult<Vec<State>> {
        Ok(self.store.all())
    }

    async fn call_service(&self, call: ServiceCall) -> HubResult<()> {
        self.services.call(call).await
    }
}

/// Calls captured by a recording service
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    calls: Arc<Mutex<Vec<ServiceCall>>>,
}

impl NotificationLog {
    /// All calls received so far, oldest first
    pub async fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().await.clone()
    }

    /// The `message` field of every call received so far
    pub async fn messages(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| call.get::<String>("message"))
            .collect()
    }

    /// Number of calls received so far
    pub async fn len(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Whether no call was received
    pub async fn is_empty(&self) -> bool {
        self.calls.lock().await.is_empty()
    }
}
