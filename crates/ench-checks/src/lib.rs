//! Entity checks for EnCh
//!
//! Three independent checks scan a snapshot of the hub's entities:
//!
//! - **battery**: battery level at or below a threshold
//! - **unavailable**: state is `unavailable` or `unknown`
//! - **stale**: not updated for longer than a threshold
//!
//! Every entity is first run through the [`ExclusionFilter`]. Each scan is a
//! pure function of the snapshot (and, for staleness, the current time); the
//! [`CheckEngine`] wraps a scan with the hub read and the notification sent
//! through the [`Notifier`].

pub mod battery;
mod engine;
mod exclude;
mod notify;
mod report;
pub mod stale;
pub mod unavailable;

pub use engine::{CheckEngine, CheckOutcome};
pub use exclude::{glob_to_regex, is_excluded, ExclusionFilter};
pub use notify::{resolve_target, Delivery, DispatchError, Notifier};
pub use report::{Detail, Finding, Icon, Report};

use ench_hub::HubError;
use std::fmt;
use thiserror::Error;

/// The kinds of checks EnCh runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckKind {
    Battery,
    Unavailable,
    Stale,
}

impl CheckKind {
    /// All kinds, in scheduling order
    pub const ALL: [CheckKind; 3] = [CheckKind::Battery, CheckKind::Unavailable, CheckKind::Stale];

    /// Configuration key of the check
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Battery => "battery",
            CheckKind::Unavailable => "unavailable",
            CheckKind::Stale => "stale",
        }
    }

    /// Heading used in notifications
    pub fn title(&self) -> &'static str {
        match self {
            CheckKind::Battery => "Battery low",
            CheckKind::Unavailable => "Unavailable entities",
            CheckKind::Stale => "Stale entities",
        }
    }

    /// Icon prefixed to notifications
    pub fn icon(&self) -> Icon {
        match self {
            CheckKind::Battery => Icon::Battery,
            CheckKind::Unavailable => Icon::App,
            CheckKind::Stale => Icon::Stale,
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building or running a check
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("reading entity states failed: {0}")]
    Snapshot(#[source] HubError),

    #[error("{0} check is not configured")]
    NotConfigured(CheckKind),
}
