//! Hub boundary for EnCh
//!
//! EnCh never owns entity state; it reads a point-in-time snapshot from the
//! hub and asks the hub to deliver notifications. The [`Hub`] trait is that
//! boundary. Implementations:
//!
//! - [`RestHub`] talks to a running hub over its REST API
//! - [`MemoryHub`] keeps states in a [`StateStore`] and dispatches service
//!   calls through a [`ServiceRegistry`]; used by tests
//! - [`DryRunHub`] wraps another hub and only logs service calls

mod dry_run;
mod memory;
mod rest;
mod services;
mod store;

pub use dry_run::DryRunHub;
pub use memory::{MemoryHub, NotificationLog};
pub use rest::RestHub;
pub use services::{ServiceFuture, ServiceHandler, ServiceRegistry};
pub use store::StateStore;

use async_trait::async_trait;
use ench_core::{ServiceCall, State};
use std::sync::Arc;
use thiserror::Error;

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;

/// Errors returned by a hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("request to hub failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("hub returned HTTP {status} for {path}")]
    Status { status: u16, path: String },

    #[error("unexpected response from hub: {0}")]
    Decode(String),

    #[error("service not found: {domain}.{service}")]
    ServiceNotFound { domain: String, service: String },

    #[error("service call failed: {0}")]
    CallFailed(String),
}

/// Read access to entity states and write access to services
#[async_trait]
pub trait Hub: Send + Sync {
    /// Every entity state currently known to the hub
    ///
    /// Entries the hub reports but that cannot be decoded are skipped.
    async fn states(&self) -> HubResult<Vec<State>>;

    /// Call a hub service (e.g. `notify.me`)
    async fn call_service(&self, call: ServiceCall) -> HubResult<()>;
}

#[async_trait]
impl<H: Hub + ?Sized> Hub for Arc<H> {
    async fn states(&self) -> HubResult<Vec<State>> {
        (**self).states().await
    }

    async fn call_service(&self, call: ServiceCall) -> HubResult<()> {
        (**self).call_service(call).await
    }
}

/// Shared, type-erased hub
pub type SharedHub = Arc<dyn Hub>;
