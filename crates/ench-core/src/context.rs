//! Context type for correlating a check cycle with the calls it makes

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifies one check cycle
///
/// Every scan gets a fresh Context; the notification it sends carries the
/// same id so log lines of a cycle can be tied together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Unique identifier for this context (ULID)
    pub id: String,
}

impl Context {
    /// Create a new context with a fresh ULID
    pub fn new() -> Self {
        Self {
            id: Ulid::new().to_string(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
