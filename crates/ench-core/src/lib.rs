//! Core types for EnCh
//!
//! This crate provides the types shared by every other EnCh crate: the
//! entity identifier, the point-in-time entity state read from the hub,
//! and the service call used to deliver notifications.

mod context;
mod entity_id;
mod service_call;
mod state;

pub use context::Context;
pub use entity_id::{EntityId, EntityIdError};
pub use service_call::ServiceCall;
pub use state::State;

/// Application name, used as notification title and in the startup banner
pub const APP_NAME: &str = "EnCh";

/// Application icon
pub const APP_ICON: &str = "👩‍⚕️";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// State value reported by the hub when an entity cannot be reached
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// State value reported by the hub when an entity has no known state
pub const STATE_UNKNOWN: &str = "unknown";

/// Attribute holding the human label of an entity
pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";

/// Attribute most integrations use for the battery charge
pub const ATTR_BATTERY_LEVEL: &str = "battery_level";

pub const ATTR_UNIT_OF_MEASUREMENT: &str = "unit_of_measurement";

pub const ATTR_DEVICE_CLASS: &str = "device_class";

/// Domain of the hub's notification services
pub const DOMAIN_NOTIFY: &str = "notify";
