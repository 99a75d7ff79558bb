//! State type representing an entity's current state

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntityId, ATTR_FRIENDLY_NAME, STATE_UNAVAILABLE, STATE_UNKNOWN};

/// The state of an entity at the moment the hub was read
///
/// Matches the JSON objects returned by the hub's `/api/states` endpoint.
/// Fields the hub sends that EnCh does not use (context, last_reported)
/// are ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    /// The entity this state belongs to
    pub entity_id: EntityId,

    /// The state value (e.g., "on", "off", "23.5", "unavailable")
    pub state: String,

    /// Additional attributes associated with the state
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,

    /// When the state was last changed (different from previous state)
    pub last_changed: DateTime<Utc>,

    /// When the state was last updated (even if value didn't change)
    pub last_updated: DateTime<Utc>,
}

impl State {
    /// Create a new state stamped with the current time
    pub fn new(
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self::at(entity_id, state, attributes, Utc::now())
    }

    /// Create a new state whose timestamps are both `timestamp`
    pub fn at(
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: HashMap<String, serde_json::Value>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id,
            state: state.into(),
            attributes,
            last_changed: timestamp,
            last_updated: timestamp,
        }
    }

    /// Create an updated state, preserving last_changed if state value is the same
    pub fn with_update(
        &self,
        new_state: impl Into<String>,
        new_attributes: HashMap<String, serde_json::Value>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let new_state = new_state.into();
        let state_changed = self.state != new_state;

        Self {
            entity_id: self.entity_id.clone(),
            state: new_state,
            attributes: new_attributes,
            last_changed: if state_changed {
                timestamp
            } else {
                self.last_changed
            },
            last_updated: timestamp,
        }
    }

    /// Check if the state value represents an unavailable entity
    pub fn is_unavailable(&self) -> bool {
        self.state == STATE_UNAVAILABLE
    }

    /// Check if the state value represents an unknown state
    pub fn is_unknown(&self) -> bool {
        self.state == STATE_UNKNOWN
    }

    /// Get the raw JSON value of an attribute
    pub fn raw_attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    /// The human label of the entity, if the hub provides one
    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes
            .get(ATTR_FRIENDLY_NAME)
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Time elapsed between the last update and `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_updated
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        // Timestamps are not compared
        self.entity_id == other.entity_id
            && self.state == other.state
            && self.attributes == other.attributes
    }
}
