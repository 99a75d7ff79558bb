//! Service registry with async handlers
//!
//! Stands in for the hub's service layer inside [`crate::MemoryHub`]:
//! notification services are registered as handlers and called by key.

use crate::{HubError, HubResult};
use dashmap::DashMap;
use ench_core::ServiceCall;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Future type for async service handlers
pub type ServiceFuture = Pin<Box<dyn Future<Output = HubResult<()>> + Send>>;

/// Service handler function type
pub type ServiceHandler = Arc<dyn Fn(ServiceCall) -> ServiceFuture + Send + Sync>;

/// Registered services keyed by `domain.service`
#[derive(Default)]
pub struct ServiceRegistry {
    services: DashMap<String, ServiceHandler>,
}

impl ServiceRegistry {
    /// Create a new empty service registry
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Register a service handler, replacing any previous one
    #[instrument(skip(self, domain, service, handler))]
    pub fn register<F, Fut>(
        &self,
        domain: impl Into<String>,
        service: impl Into<String>,
        handler: F,
    ) where
        F: Fn(ServiceCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HubResult<()>> + Send + 'static,
    {
        let domain = domain.into();
        let service = service.into();
        let key = format!("{}.{}", domain, service);

        debug!(domain = %domain, service = %service, "Registering service");

        let handler: ServiceHandler =
            Arc::new(move |call| Box::pin(handler(call)) as ServiceFuture);
        self.services.insert(key, handler);
    }

    /// Call a registered service
    #[instrument(
        skip(self, call),
        fields(service = %call.service_id(), context = %call.context.id)
    )]
    pub async fn call(&self, call: ServiceCall) -> HubResult<()> {
        let key = call.service_id();

        let handler = match self.services.get(&key) {
            Some(handler) => handler.clone(),
            None => {
                warn!("Service not found");
                return Err(HubError::ServiceNotFound {
                    domain: call.domain,
                    service: call.service,
                });
            }
        };
        // The map guard is released before awaiting the handler

        debug!("Calling service");
        handler(call).await
    }
}
