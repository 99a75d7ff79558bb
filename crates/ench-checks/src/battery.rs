//! Low battery check

use crate::report::{Detail, Finding};
use ench_config::BatteryConfig;
use ench_core::{State, ATTR_DEVICE_CLASS, ATTR_UNIT_OF_MEASUREMENT};
use serde_json::Value;
use tracing::{debug, trace};

/// Report entities whose battery level is at or below `config.min_level`
///
/// `states` must already be filtered and sorted; order is preserved.
pub fn scan<'a>(
    states: impl IntoIterator<Item = &'a State>,
    config: &BatteryConfig,
) -> Vec<Finding> {
    states
        .into_iter()
        .filter_map(|state| {
            let level = match battery_level(state, &config.attributes) {
                Some(level) => level,
                None => {
                    trace!(entity_id = %state.entity_id, "No battery reading");
                    return None;
                }
            };
            if level > config.min_level {
                return None;
            }
            debug!(entity_id = %state.entity_id, level, "Battery below threshold");
            Some(Finding::new(state, Detail::BatteryLevel(level)))
        })
        .collect()
}

/// Battery level of an entity, if it has a readable one
///
/// Candidates are tried in order and the first integer reading wins:
/// the entity's own state when it is a battery percentage sensor, then each
/// attribute in `attributes`.
pub fn battery_level(state: &State, attributes: &[String]) -> Option<i64> {
    let own_state = is_battery_sensor(state)
        .then(|| parse_str(&state.state))
        .flatten();

    own_state.or_else(|| {
        attributes
            .iter()
            .find_map(|name| state.raw_attribute(name).and_then(parse_value))
    })
}

/// Whether the entity's own state is a battery percentage
///
/// The object id must name a battery and the state must be measured in
/// percent or carry the battery device class.
fn is_battery_sensor(state: &State) -> bool {
    let names_battery = state
        .entity_id
        .object_id()
        .to_lowercase()
        .contains("battery");
    let is_attr = |name: &str, expected: &str| {
        state.raw_attribute(name).and_then(Value::as_str) == Some(expected)
    };
    names_battery
        && (is_attr(ATTR_UNIT_OF_MEASUREMENT, "%") || is_attr(ATTR_DEVICE_CLASS, "battery"))
}

/// Integer reading of an attribute value
///
/// Integers are taken as is, floats are truncated toward zero, strings must
/// hold an integer. Anything else is not a reading.
fn parse_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_str(s),
        _ => None,
    }
}

fn parse_str(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ench_config::default_battery_attributes;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config(min_level: i64) -> BatteryConfig {
        BatteryConfig {
            interval: Duration::from_secs(60),
            min_level,
            attributes: default_battery_attributes(),
            notify: None,
        }
    }

    fn entity(id: &str, state: &str, attributes: Value) -> State {
        let attributes: HashMap<String, Value> = serde_json::from_value(attributes).unwrap();
        State::new(id.parse().unwrap(), state, attributes)
    }

    fn ids(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.entity_id.as_str()).collect()
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let states = vec![
            entity("sensor.a", "on", json!({"battery_level": 19})),
            entity("sensor.b", "on", json!({"battery_level": 20})),
            entity("sensor.c", "on", json!({"battery_level": 21})),
            entity("sensor.d", "on", json!({"battery_level": 0})),
        ];

        let findings = scan(&states, &config(20));
        assert_eq!(ids(&findings), vec!["sensor.a", "sensor.b", "sensor.d"]);
        assert_eq!(findings[1].detail, Detail::BatteryLevel(20));
    }

    #[test]
    fn test_non_numeric_and_missing_readings_skipped() {
        let states = vec![
            entity("sensor.a", "on", json!({"battery_level": "low"})),
            entity("sensor.b", "on", json!({"battery_level": null})),
            entity("sensor.c", "on", json!({})),
            entity("sensor.d", "on", json!({"battery_level": [5]})),
            entity("sensor.e", "on", json!({"battery_level": "12.5"})),
        ];

        assert!(scan(&states, &config(100)).is_empty());
    }

    #[test]
    fn test_reading_forms() {
        let attrs = default_battery_attributes();
        assert_eq!(
            battery_level(&entity("sensor.a", "on", json!({"battery_level": " 7 "})), &attrs),
            Some(7)
        );
        assert_eq!(
            battery_level(&entity("sensor.a", "on", json!({"battery_level": 7.9})), &attrs),
            Some(7)
        );
        assert_eq!(
            battery_level(&entity("sensor.a", "on", json!({"Battery Level": 33})), &attrs),
            Some(33)
        );
    }

    #[test]
    fn test_first_parseable_candidate_wins() {
        let attrs = default_battery_attributes();
        let state = entity(
            "sensor.a",
            "on",
            json!({"battery_level": "n/a", "Battery Level": 40}),
        );
        assert_eq!(battery_level(&state, &attrs), Some(40));

        let state = entity(
            "sensor.a",
            "on",
            json!({"battery_level": 10, "Battery Level": 40}),
        );
        assert_eq!(battery_level(&state, &attrs), Some(10));
    }

    #[test]
    fn test_battery_sensor_uses_own_state() {
        let attrs = default_battery_attributes();
        let sensor = entity(
            "sensor.door_Battery",
            "12",
            json!({"unit_of_measurement": "%", "battery_level": 90}),
        );
        assert_eq!(battery_level(&sensor, &attrs), Some(12));

        let by_class = entity("sensor.phone_battery", "8", json!({"device_class": "battery"}));
        assert_eq!(battery_level(&by_class, &attrs), Some(8));

        // Non-numeric state falls back to attributes
        let binary = entity("binary_sensor.door_battery_low", "off", json!({"battery_level": 90}));
        assert_eq!(battery_level(&binary, &attrs), Some(90));

        // A numeric state does not count unless the id names a battery
        let temp = entity("sensor.kitchen_temp", "12", json!({"unit_of_measurement": "%"}));
        assert_eq!(battery_level(&temp, &attrs), None);
    }

    #[test]
    fn test_battery_named_sensor_in_other_units_is_not_read() {
        let attrs = default_battery_attributes();
        let voltage = entity(
            "sensor.remote_battery_voltage",
            "3",
            json!({"unit_of_measurement": "V", "device_class": "voltage"}),
        );
        assert_eq!(battery_level(&voltage, &attrs), None);
        assert!(scan(&[voltage], &config(20)).is_empty());

        let bare = entity("sensor.remote_battery", "3", json!({}));
        assert_eq!(battery_level(&bare, &attrs), None);
    }

    #[test]
    fn test_custom_attribute_list() {
        let state = entity("sensor.a", "on", json!({"battery_level": 5, "charge": 50}));
        assert_eq!(battery_level(&state, &["charge".to_string()]), Some(50));
    }
}
