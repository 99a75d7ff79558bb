//! Read-through hub that never delivers notifications

use crate::{Hub, HubResult};
use async_trait::async_trait;
use ench_core::{ServiceCall, State};
use tracing::info;

/// Wraps a hub, forwarding reads and logging service calls instead of making them
pub struct DryRunHub<H> {
    inner: H,
}

impl<H: Hub> DryRunHub<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: Hub> Hub for DryRunHub<H> {
    async fn states(&self) -> HubResult<Vec<State>> {
        self.inner.states().await
    }

    async fn call_service(&self, call: ServiceCall) -> HubResult<()> {
        info!(
            service = %call.service_id(),
            context = %call.context.id,
            data = %call.service_data,
            "Dry run, not calling service"
        );
        Ok(())
    }
}
