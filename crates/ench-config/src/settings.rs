//! Typed EnCh settings
//!
//! The YAML file is deserialized into `raw` structs mirroring the file
//! layout, then resolved into [`EnchConfig`]: defaults applied, the
//! exclusion list merged, durations converted and values validated. The
//! resolved value is immutable and shared by every check.

use crate::error::{ConfigError, ConfigResult};
use ench_core::{EntityId, ServiceCall, ATTR_BATTERY_LEVEL};
use indexmap::IndexSet;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Entities excluded from every check in addition to the configured ones
pub const DEFAULT_EXCLUDE: &[&str] = &[
    "binary_sensor.updater",
    "persistent_notification.config_entry_discovery",
];

/// Configuration file looked up in the configuration directory
pub const DEFAULT_CONFIG_FILE: &str = "ench.yaml";

pub const DEFAULT_HUB_URL: &str = "http://localhost:8123";
pub const DEFAULT_HUB_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_INITIAL_DELAY_SECS: u64 = 60;

pub const DEFAULT_BATTERY_INTERVAL_MIN: u64 = 180;
pub const DEFAULT_BATTERY_MIN_LEVEL: i64 = 20;
pub const DEFAULT_UNAVAILABLE_INTERVAL_MIN: u64 = 60;
pub const DEFAULT_STALE_INTERVAL_MIN: u64 = 60;

/// Upper bound of the default staleness window
pub const MAX_STALE_CEILING_MIN: u64 = 60;

/// Longest accepted check interval or staleness window, one year
pub const MAX_INTERVAL_MIN: u64 = 366 * 24 * 60;
pub const MAX_INITIAL_DELAY_SECS: u64 = 24 * 60 * 60;
pub const MAX_HUB_TIMEOUT_SECS: u64 = 60 * 60;

/// Attribute names tried, in order, when the battery level is not the state itself
pub fn default_battery_attributes() -> Vec<String> {
    vec![ATTR_BATTERY_LEVEL.to_string(), "Battery Level".to_string()]
}

// ----------------------------------------------------------------------------
// Raw file layout
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    hub: RawHub,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default = "default_true")]
    show_friendly_name: bool,
    initial_delay_secs: Option<u64>,
    notify: Option<String>,
    #[serde(default, deserialize_with = "enabled_block")]
    battery: Option<RawBattery>,
    #[serde(default, deserialize_with = "enabled_block")]
    unavailable: Option<RawUnavailable>,
    #[serde(default, deserialize_with = "enabled_block")]
    stale: Option<RawStale>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            hub: RawHub::default(),
            exclude: Vec::new(),
            show_friendly_name: true,
            initial_delay_secs: None,
            notify: None,
            battery: None,
            unavailable: None,
            stale: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHub {
    url: Option<String>,
    token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBattery {
    interval_min: Option<u64>,
    min_level: Option<i64>,
    attributes: Option<Vec<String>>,
    notify: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUnavailable {
    interval_min: Option<u64>,
    notify: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStale {
    interval_min: Option<u64>,
    max_stale_min: Option<u64>,
    #[serde(default)]
    entities: Vec<EntityId>,
    notify: Option<String>,
}

/// A check block that is present enables the check, even when it is empty
/// (`battery:` parses as null). An absent block never reaches this function.
fn enabled_block<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?.unwrap_or_default()))
}

// ----------------------------------------------------------------------------
// Resolved settings
// ----------------------------------------------------------------------------

/// Connection settings for the hub REST API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

/// Battery check settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatteryConfig {
    pub interval: Duration,
    /// Entities at or below this level are reported
    pub min_level: i64,
    /// Candidate attribute names, first parseable one wins
    pub attributes: Vec<String>,
    pub notify: Option<String>,
}

/// Unavailable check settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnavailableConfig {
    pub interval: Duration,
    pub notify: Option<String>,
}

/// Stale check settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleConfig {
    /// Scan period, never longer than `max_stale`
    pub interval: Duration,
    pub max_stale: Duration,
    /// Explicit candidates; empty means every entity
    pub entities: Vec<EntityId>,
    pub notify: Option<String>,
}

/// Complete, validated EnCh configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnchConfig {
    pub hub: HubConfig,
    /// Lower-cased, deduplicated glob patterns: defaults first, then user patterns
    pub exclude: Vec<String>,
    pub show_friendly_name: bool,
    /// Delay before the first scan of any check
    pub initial_delay: Duration,
    /// Default notification target for checks without their own
    pub notify: Option<String>,
    pub battery: Option<BatteryConfig>,
    pub unavailable: Option<UnavailableConfig>,
    pub stale: Option<StaleConfig>,
}

impl EnchConfig {
    /// Build the configuration from an already tag-processed YAML value
    pub fn from_value(value: serde_yaml::Value) -> ConfigResult<Self> {
        // An empty file parses as null
        let raw: RawConfig = if value.is_null() {
            RawConfig::default()
        } else {
            serde_yaml::from_value(value).map_err(|source| ConfigError::Schema { source })?
        };
        Self::resolve(raw)
    }

    /// Parse a YAML document without tag processing
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Schema { source })?;
        Self::from_value(value)
    }

    fn resolve(raw: RawConfig) -> ConfigResult<Self> {
        let hub = HubConfig {
            url: raw
                .hub
                .url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_HUB_URL.to_string()),
            token: raw.hub.token.filter(|t| !t.is_empty()),
            timeout: Duration::from_secs(bounded(
                "hub.timeout_secs",
                raw.hub.timeout_secs.unwrap_or(DEFAULT_HUB_TIMEOUT_SECS),
                MAX_HUB_TIMEOUT_SECS,
            )?),
        };

        let notify = target("notify", raw.notify)?;

        let battery = raw
            .battery
            .map(|b| -> ConfigResult<BatteryConfig> {
                let min_level = b.min_level.unwrap_or(DEFAULT_BATTERY_MIN_LEVEL);
                if !(0..=100).contains(&min_level) {
                    return Err(ConfigError::InvalidValue {
                        key: "battery.min_level".to_string(),
                        reason: format!("{} is not a percentage", min_level),
                    });
                }
                let attributes = b.attributes.unwrap_or_else(default_battery_attributes);
                if attributes.iter().any(|a| a.trim().is_empty()) {
                    return Err(ConfigError::InvalidValue {
                        key: "battery.attributes".to_string(),
                        reason: "attribute names cannot be empty".to_string(),
                    });
                }
                Ok(BatteryConfig {
                    interval: minutes(
                        "battery.interval_min",
                        b.interval_min.unwrap_or(DEFAULT_BATTERY_INTERVAL_MIN),
                    )?,
                    min_level,
                    attributes,
                    notify: target("battery.notify", b.notify)?,
                })
            })
            .transpose()?;

        let unavailable = raw
            .unavailable
            .map(|u| -> ConfigResult<UnavailableConfig> {
                Ok(UnavailableConfig {
                    interval: minutes(
                        "unavailable.interval_min",
                        u.interval_min.unwrap_or(DEFAULT_UNAVAILABLE_INTERVAL_MIN),
                    )?,
                    notify: target("unavailable.notify", u.notify)?,
                })
            })
            .transpose()?;

        let stale = raw
            .stale
            .map(|s| -> ConfigResult<StaleConfig> {
                let interval_min = bounded(
                    "stale.interval_min",
                    s.interval_min.unwrap_or(DEFAULT_STALE_INTERVAL_MIN),
                    MAX_INTERVAL_MIN,
                )?;
                let max_stale_min = bounded(
                    "stale.max_stale_min",
                    s.max_stale_min
                        .unwrap_or_else(|| interval_min.min(MAX_STALE_CEILING_MIN)),
                    MAX_INTERVAL_MIN,
                )?;
                let mut entities = s.entities;
                entities.sort();
                entities.dedup();
                Ok(StaleConfig {
                    // Scanning less often than the window would miss entities
                    interval: Duration::from_secs(interval_min.min(max_stale_min) * 60),
                    max_stale: Duration::from_secs(max_stale_min * 60),
                    entities,
                    notify: target("stale.notify", s.notify)?,
                })
            })
            .transpose()?;

        let initial_delay_secs = raw.initial_delay_secs.unwrap_or(DEFAULT_INITIAL_DELAY_SECS);
        if initial_delay_secs > MAX_INITIAL_DELAY_SECS {
            return Err(ConfigError::InvalidValue {
                key: "initial_delay_secs".to_string(),
                reason: format!("must be at most {}", MAX_INITIAL_DELAY_SECS),
            });
        }

        Ok(Self {
            hub,
            exclude: merge_exclude(&raw.exclude),
            show_friendly_name: raw.show_friendly_name,
            initial_delay: Duration::from_secs(initial_delay_secs),
            notify,
            battery,
            unavailable,
            stale,
        })
    }

    /// Whether at least one check is configured
    pub fn has_checks(&self) -> bool {
        self.battery.is_some() || self.unavailable.is_some() || self.stale.is_some()
    }
}

/// Merge the built-in exclusions with user patterns
///
/// Patterns are trimmed and lower-cased; duplicates keep their first position.
pub fn merge_exclude(user: &[String]) -> Vec<String> {
    let merged: IndexSet<String> = DEFAULT_EXCLUDE
        .iter()
        .map(|p| p.to_string())
        .chain(user.iter().map(|p| p.trim().to_lowercase()))
        .filter(|p| !p.is_empty())
        .collect();
    merged.into_iter().collect()
}

/// `value` if it lies within `1..=max`
fn bounded(key: &str, value: u64, max: u64) -> ConfigResult<u64> {
    if !(1..=max).contains(&value) {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("{} is not between 1 and {}", value, max),
        });
    }
    Ok(value)
}

fn minutes(key: &str, value: u64) -> ConfigResult<Duration> {
    Ok(Duration::from_secs(bounded(key, value, MAX_INTERVAL_MIN)? * 60))
}

fn target(key: &str, value: Option<String>) -> ConfigResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(t) => {
            let t = t.trim().to_string();
            if ServiceCall::split_target(&t).is_none() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: format!("'{}' is not a notification target", t),
                });
            }
            Ok(Some(t))
        }
    }
}
