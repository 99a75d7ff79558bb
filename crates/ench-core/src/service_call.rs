//! Service call type for invoking hub services

use crate::{Context, DOMAIN_NOTIFY};
use serde::{Deserialize, Serialize};

/// A call to a hub service
///
/// EnCh only ever calls notification services, but the call is kept generic
/// so a target such as `persistent_notification.create` works as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    /// The domain the service belongs to (e.g., "notify")
    pub domain: String,

    /// The service name (e.g., "mobile_app_phone")
    pub service: String,

    /// Data passed to the service (e.g., message, title)
    pub service_data: serde_json::Value,

    /// Context of the check cycle that issued this call
    pub context: Context,
}

impl ServiceCall {
    /// Create a new service call
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        service_data: serde_json::Value,
        context: Context,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data,
            context,
        }
    }

    /// Build a call from a notification target string
    ///
    /// Returns `None` when the target cannot be split, see [`Self::split_target`].
    pub fn for_target(
        target: &str,
        service_data: serde_json::Value,
        context: Context,
    ) -> Option<Self> {
        let (domain, service) = Self::split_target(target)?;
        Some(Self::new(domain, service, service_data, context))
    }

    /// Split a notification target into domain and service
    ///
    /// Accepts `notify.me`, `notify/me` and the bare service name `me`.
    /// Returns `None` when the target is empty or has an empty part.
    pub fn split_target(target: &str) -> Option<(&str, &str)> {
        let target = target.trim();
        let (domain, service) = match target.split_once(['.', '/']) {
            Some((domain, service)) => (domain, service),
            None => (DOMAIN_NOTIFY, target),
        };
        if domain.is_empty() || service.is_empty() {
            return None;
        }
        Some((domain, service))
    }

    /// Get the full service identifier (domain.service)
    pub fn service_id(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }

    /// Get a value from service_data
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.service_data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
