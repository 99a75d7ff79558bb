//! Notification dispatch through the hub

use crate::Report;
use ench_core::{Context, ServiceCall, APP_NAME};
use ench_hub::{HubError, SharedHub};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while sending a notification
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid notification target '{0}'")]
    InvalidTarget(String),

    #[error("sending notification to '{target}' failed: {source}")]
    Send {
        target: String,
        #[source]
        source: HubError,
    },
}

/// What happened to a report's notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The hub accepted the notification
    Sent { target: String },
    /// Sending failed; logged and not retried
    Failed { target: String, reason: String },
    /// No notification target is configured
    NoTarget,
    /// The report was empty
    NothingToReport,
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent { .. })
    }
}

/// The target a check notifies: its own, else the global one
pub fn resolve_target<'a>(check: Option<&'a str>, global: Option<&'a str>) -> Option<&'a str> {
    check.or(global)
}

/// Sends report messages as hub service calls
#[derive(Clone)]
pub struct Notifier {
    hub: SharedHub,
}

impl Notifier {
    pub fn new(hub: SharedHub) -> Self {
        Self { hub }
    }

    /// Send one message to `target`
    ///
    /// The service receives `{"message": <message>, "title": "EnCh"}`.
    pub async fn send(
        &self,
        target: &str,
        message: &str,
        context: Context,
    ) -> Result<(), DispatchError> {
        let data = json!({ "message": message, "title": APP_NAME });
        let call = ServiceCall::for_target(target, data, context)
            .ok_or_else(|| DispatchError::InvalidTarget(target.to_string()))?;

        debug!(service = %call.service_id(), context = %call.context.id, "Sending notification");
        self.hub
            .call_service(call)
            .await
            .map_err(|source| DispatchError::Send {
                target: target.to_string(),
                source,
            })
    }

    /// Notify `target` about `report`
    ///
    /// Empty reports and missing targets send nothing. A failed send is
    /// logged and reported as [`Delivery::Failed`], never as an error.
    pub async fn dispatch(
        &self,
        report: &Report,
        target: Option<&str>,
        context: Context,
    ) -> Delivery {
        let message = match report.message() {
            Some(message) => message,
            None => return Delivery::NothingToReport,
        };
        let target = match target {
            Some(target) => target,
            None => {
                debug!(check = %report.kind, "No notification target configured");
                return Delivery::NoTarget;
            }
        };

        match self.send(target, &message, context).await {
            Ok(()) => {
                info!(check = %report.kind, target, count = report.len(), "Notification sent");
                Delivery::Sent {
                    target: target.to_string(),
                }
            }
            Err(e) => {
                warn!(check = %report.kind, target, error = %e, "Notification failed");
                Delivery::Failed {
                    target: target.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }
}
