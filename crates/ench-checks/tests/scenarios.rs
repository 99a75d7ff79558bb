//! End-to-end check cycles against an in-memory hub

use chrono::{Duration, Utc};
use ench_checks::{CheckEngine, CheckError, CheckKind, Delivery};
use ench_config::EnchConfig;
use ench_core::{EntityId, ServiceCall, State};
use ench_hub::{Hub, HubError, HubResult, MemoryHub, NotificationLog};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

fn id(s: &str) -> EntityId {
    s.parse().unwrap()
}

fn attrs(value: Value) -> HashMap<String, Value> {
    serde_json::from_value(value).unwrap()
}

fn setup(yaml: &str) -> (Arc<MemoryHub>, NotificationLog, CheckEngine) {
    let hub = Arc::new(MemoryHub::new());
    let log = hub.record_service("notify", "me");
    let config = EnchConfig::from_yaml_str(yaml).unwrap();
    let engine = CheckEngine::new(Arc::new(config), hub.clone()).unwrap();
    (hub, log, engine)
}

#[tokio::test]
async fn test_excluded_entity_never_reported() {
    let (hub, log, engine) = setup(
        "notify: notify.me\nexclude: ['binary_sensor.updater']\nbattery:\n  min_level: 20\n",
    );
    hub.store().set(id("sensor.a"), "on", attrs(json!({"battery_level": 15})));
    hub.store()
        .set(id("binary_sensor.updater"), "on", attrs(json!({"battery_level": 5})));

    let outcome = engine.run(CheckKind::Battery, Utc::now()).await.unwrap();
    assert_eq!(outcome.report.entity_ids(), vec!["sensor.a"]);
    assert_eq!(log.messages().await, vec!["🔋 Battery low (1): sensor.a".to_string()]);
}

#[tokio::test]
async fn test_glob_exclusion_applies_to_every_check() {
    let (hub, _log, engine) = setup(
        "exclude: ['sensor.garage_*']\nbattery:\nunavailable:\nstale:\n  max_stale_min: 15\n",
    );
    let old = Utc::now() - Duration::hours(2);
    hub.store().set_at(
        id("sensor.garage_door"),
        "unavailable",
        attrs(json!({"battery_level": 1})),
        old,
    );

    for kind in CheckKind::ALL {
        let outcome = engine.run(kind, Utc::now()).await.unwrap();
        assert!(outcome.report.is_empty(), "{} reported an excluded entity", kind);
    }
}

#[tokio::test]
async fn test_battery_threshold_and_unreadable_levels() {
    let (hub, log, engine) = setup("notify: notify.me\nbattery:\n  min_level: 20\n");
    hub.store().set(id("sensor.low"), "on", attrs(json!({"battery_level": 20})));
    hub.store().set(id("sensor.ok"), "on", attrs(json!({"battery_level": 21})));
    hub.store().set(id("sensor.text"), "on", attrs(json!({"battery_level": "unknown"})));
    hub.store().set(id("sensor.none"), "on", HashMap::new());
    hub.store()
        .set(id("sensor.phone_battery"), "4", attrs(json!({"unit_of_measurement": "%"})));
    hub.store().set(id("sensor.phone_battery_voltage"), "3", HashMap::new());

    let outcome = engine.run(CheckKind::Battery, Utc::now()).await.unwrap();
    assert_eq!(outcome.report.entity_ids(), vec!["sensor.low", "sensor.phone_battery"]);
    assert!(outcome.delivery.is_sent());
    assert_eq!(log.len().await, 1);
}

#[tokio::test]
async fn test_unavailable_scenario() {
    let (hub, log, engine) = setup("unavailable:\n  notify: notify.me\n");
    hub.store().set(id("sensor.x"), "unknown", HashMap::new());
    hub.store().set(id("sensor.y"), "on", HashMap::new());

    let outcome = engine.run(CheckKind::Unavailable, Utc::now()).await.unwrap();
    assert_eq!(outcome.report.entity_ids(), vec!["sensor.x"]);

    let calls = log.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].get::<String>("title").as_deref(), Some("EnCh"));
    assert!(calls[0]
        .get::<String>("message")
        .unwrap()
        .ends_with("Unavailable entities (1): sensor.x"));
}

#[tokio::test]
async fn test_stale_window() {
    let (hub, _log, engine) = setup("stale:\n  max_stale_min: 15\n");
    let now = Utc::now();
    hub.store()
        .set_at(id("sensor.z"), "21.5", HashMap::new(), now - Duration::minutes(20));
    hub.store()
        .set_at(id("sensor.w"), "21.5", HashMap::new(), now - Duration::minutes(10));

    let outcome = engine.run(CheckKind::Stale, now).await.unwrap();
    assert_eq!(outcome.report.entity_ids(), vec!["sensor.z"]);

    // Ten minutes earlier sensor.z was still fresh
    let earlier = engine.run(CheckKind::Stale, now - Duration::minutes(10)).await.unwrap();
    assert!(earlier.report.is_empty());
}

#[tokio::test]
async fn test_stale_allow_list() {
    let (hub, _log, engine) = setup(
        "exclude: ['sensor.b']\nstale:\n  max_stale_min: 15\n  \
         entities: [sensor.a, sensor.b, sensor.gone]\n",
    );
    let old = Utc::now() - Duration::hours(1);
    for entity in ["sensor.a", "sensor.b", "sensor.c"] {
        hub.store().set_at(id(entity), "on", HashMap::new(), old);
    }

    let outcome = engine.run(CheckKind::Stale, Utc::now()).await.unwrap();
    assert_eq!(outcome.report.entity_ids(), vec!["sensor.a"]);
}

#[tokio::test]
async fn test_scan_is_idempotent() {
    let (hub, _log, engine) = setup("battery:\nunavailable:\nstale:\n");
    let now = Utc::now();
    hub.store().set_at(
        id("sensor.a"),
        "unavailable",
        attrs(json!({"battery_level": 3})),
        now - Duration::hours(3),
    );
    hub.store().set_at(id("light.b"), "on", HashMap::new(), now);

    let snapshot = hub.states().await.unwrap();
    for kind in CheckKind::ALL {
        let first = engine.scan(kind, &snapshot, now).unwrap();
        let second = engine.scan(kind, &snapshot, now).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.entity_ids(), vec!["sensor.a"]);
    }
}

#[tokio::test]
async fn test_empty_result_sends_nothing() {
    let (hub, log, engine) = setup("notify: notify.me\nunavailable:\n");
    hub.store().set(id("sensor.a"), "on", HashMap::new());

    let outcome = engine.run(CheckKind::Unavailable, Utc::now()).await.unwrap();
    assert_eq!(outcome.delivery, Delivery::NothingToReport);
    assert!(log.is_empty().await);
}

#[tokio::test]
async fn test_no_target_means_no_dispatch() {
    let (hub, log, engine) = setup("unavailable:\n");
    hub.store().set(id("sensor.a"), "unknown", HashMap::new());

    let outcome = engine.run(CheckKind::Unavailable, Utc::now()).await.unwrap();
    assert_eq!(outcome.report.len(), 1);
    assert_eq!(outcome.delivery, Delivery::NoTarget);
    assert!(log.is_empty().await);
}

#[tokio::test]
async fn test_failed_dispatch_does_not_fail_the_cycle() {
    let (hub, log, engine) = setup("notify: notify.nobody\nunavailable:\n");
    hub.store().set(id("sensor.a"), "unknown", HashMap::new());

    let outcome = engine.run(CheckKind::Unavailable, Utc::now()).await.unwrap();
    assert!(matches!(
        outcome.delivery,
        Delivery::Failed { ref target, .. } if target == "notify.nobody"
    ));
    assert!(log.is_empty().await);

    // The next cycle runs normally
    let again = engine.run(CheckKind::Unavailable, Utc::now()).await.unwrap();
    assert_eq!(again.report.len(), 1);
}

#[tokio::test]
async fn test_friendly_names_stay_out_of_message() {
    let (hub, log, engine) = setup("notify: me\nshow_friendly_name: true\nunavailable:\n");
    hub.store().set(
        id("sensor.a"),
        "unavailable",
        attrs(json!({"friendly_name": "Attic sensor"})),
    );
    hub.store().set(id("sensor.b"), "unknown", HashMap::new());

    let outcome = engine.run(CheckKind::Unavailable, Utc::now()).await.unwrap();
    let messages = log.messages().await;
    assert!(messages[0].ends_with("(2): sensor.a, sensor.b"));
    assert!(!messages[0].contains("Attic sensor"));
    assert_eq!(
        outcome.report.findings[0].log_line(true),
        "State of sensor.a (Attic sensor) is unavailable!"
    );
}

struct BrokenHub;

#[async_trait::async_trait]
impl Hub for BrokenHub {
    async fn states(&self) -> HubResult<Vec<State>> {
        Err(HubError::Status {
            status: 502,
            path: "/api/states".to_string(),
        })
    }

    async fn call_service(&self, _call: ServiceCall) -> HubResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_snapshot_failure_skips_cycle() {
    let config = EnchConfig::from_yaml_str("notify: notify.me\nbattery:\n").unwrap();
    let engine = CheckEngine::new(Arc::new(config), Arc::new(BrokenHub)).unwrap();

    let err = engine.run(CheckKind::Battery, Utc::now()).await.unwrap_err();
    assert!(matches!(err, CheckError::Snapshot(HubError::Status { status: 502, .. })));
}
