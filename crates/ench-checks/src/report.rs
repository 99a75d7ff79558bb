//! Plain-text formatting of check results
//!
//! Nothing here knows about terminals or log colors: a finding renders to a
//! line of text plus an [`Icon`] tag, a report renders to the notification
//! message.

use crate::CheckKind;
use chrono::{DateTime, Duration, Utc};
use ench_core::{EntityId, State, APP_ICON};
use std::fmt;

/// Icon tag attached to log lines and notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    App,
    Battery,
    Unavailable,
    Unknown,
    Stale,
}

impl Icon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::App => APP_ICON,
            Icon::Battery => "🔋",
            Icon::Unavailable => "⁉️",
            Icon::Unknown => "❓",
            Icon::Stale => "⏳",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an entity was reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detail {
    /// Parsed battery level in percent
    BatteryLevel(i64),
    /// The sentinel state the entity is in
    State(String),
    /// Time since the last update
    Stale(Duration),
}

/// One entity matched by a check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub entity_id: EntityId,
    pub friendly_name: Option<String>,
    pub detail: Detail,
    /// Shown alongside the finding, never used for matching
    pub last_updated: DateTime<Utc>,
}

impl Finding {
    pub fn new(state: &State, detail: Detail) -> Self {
        Self {
            entity_id: state.entity_id.clone(),
            friendly_name: state.friendly_name().map(String::from),
            detail,
            last_updated: state.last_updated,
        }
    }

    pub fn icon(&self) -> Icon {
        match &self.detail {
            Detail::BatteryLevel(_) => Icon::Battery,
            Detail::State(state) if state == ench_core::STATE_UNKNOWN => Icon::Unknown,
            Detail::State(_) => Icon::Unavailable,
            Detail::Stale(_) => Icon::Stale,
        }
    }

    /// Single log line describing the finding, without icon
    pub fn log_line(&self, show_friendly_name: bool) -> String {
        let id = self.entity_id.as_str();
        let label = match (&self.friendly_name, show_friendly_name) {
            (Some(name), true) => format!("{} ({})", id, name),
            _ => id.to_string(),
        };
        match &self.detail {
            Detail::BatteryLevel(level) => format!("Battery low! {} - {}%", label, level),
            Detail::State(state) => format!("State of {} is {}!", label, state),
            Detail::Stale(elapsed) => format!(
                "{} not updated for {} min (last update {})",
                label,
                elapsed.num_minutes(),
                self.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
            ),
        }
    }
}

/// Result of one check run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: CheckKind,
    /// Sorted by entity ID, each entity at most once
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn new(kind: CheckKind, findings: Vec<Finding>) -> Self {
        Self { kind, findings }
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    /// IDs of the matched entities, in report order
    pub fn entity_ids(&self) -> Vec<&str> {
        self.findings.iter().map(|f| f.entity_id.as_str()).collect()
    }

    /// Notification text, `None` when there is nothing to report
    ///
    /// Format: `<icon> <title> (<count>): <entity_id>, <entity_id>, ...`.
    /// Friendly names only ever appear in log lines.
    pub fn message(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(format!(
            "{} {} ({}): {}",
            self.kind.icon(),
            self.kind.title(),
            self.len(),
            self.entity_ids().join(", ")
        ))
    }
}
