//! In-memory entity state storage

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ench_core::{EntityId, State};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Entity states held in memory
///
/// Backs [`crate::MemoryHub`]. States can be written with an explicit
/// timestamp so staleness can be reproduced without waiting.
#[derive(Debug, Default)]
pub struct StateStore {
    states: DashMap<EntityId, State>,
}

impl StateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
        }
    }

    /// Set the state of an entity, stamped with the current time
    pub fn set(
        &self,
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: HashMap<String, serde_json::Value>,
    ) -> State {
        self.set_at(entity_id, state, attributes, Utc::now())
    }

    /// Set the state of an entity as of `timestamp`
    ///
    /// If the entity already has a state, `last_changed` is only moved when
    /// the state value actually changed.
    #[instrument(skip(self, state, attributes), fields(entity_id = %entity_id))]
    pub fn set_at(
        &self,
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: HashMap<String, serde_json::Value>,
        timestamp: DateTime<Utc>,
    ) -> State {
        let new_state = match self.states.get(&entity_id) {
            Some(existing) => existing.with_update(state, attributes, timestamp),
            None => State::at(entity_id.clone(), state, attributes, timestamp),
        };

        debug!(state = %new_state.state, "Setting entity state");

        self.states.insert(entity_id, new_state.clone());
        new_state
    }

    /// All states, sorted by entity ID
    pub fn all(&self) -> Vec<State> {
        let mut states: Vec<State> = self.states.iter().map(|r| r.value().clone()).collect();
        states.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        states
    }
}
