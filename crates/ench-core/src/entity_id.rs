//! Entity ID type representing a domain.object_id pair

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid entity IDs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("entity_id must contain exactly one '.' separator")]
    InvalidFormat,

    #[error("domain cannot be empty")]
    EmptyDomain,

    #[error("object_id cannot be empty")]
    EmptyObjectId,

    #[error("entity_id cannot contain whitespace")]
    Whitespace,
}

/// An entity ID as exposed by the hub (e.g., "sensor.kitchen_temp")
///
/// The ID is kept exactly as the hub reported it. Ordering and equality use
/// the full string, so sorting a list of IDs matches sorting their string
/// forms. Case folding is left to callers that need it (exclusion matching).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    full: String,
    dot: usize,
}

impl EntityId {
    /// Create a new EntityId from domain and object_id parts
    pub fn new(domain: &str, object_id: &str) -> Result<Self, EntityIdError> {
        format!("{}.{}", domain, object_id).parse()
    }

    /// Get the domain part of the entity ID
    pub fn domain(&self) -> &str {
        &self.full[..self.dot]
    }

    /// Get the object_id part of the entity ID
    pub fn object_id(&self) -> &str {
        &self.full[self.dot + 1..]
    }

    /// Get the full ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The ID lower-cased, as used for exclusion matching
    pub fn folded(&self) -> String {
        self.full.to_lowercase()
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.chars().any(char::is_whitespace) {
            return Err(EntityIdError::Whitespace);
        }
        let dot = match s.find('.') {
            Some(dot) if s[dot + 1..].find('.').is_none() => dot,
            _ => return Err(EntityIdError::InvalidFormat),
        };
        if dot == 0 {
            return Err(EntityIdError::EmptyDomain);
        }
        if dot + 1 == s.len() {
            return Err(EntityIdError::EmptyObjectId);
        }

        Ok(Self {
            full: s.to_string(),
            dot,
        })
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> String {
        id.full
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}
