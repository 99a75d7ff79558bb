//! Startup banner

use ench_config::EnchConfig;
use ench_core::{APP_ICON, APP_NAME, APP_VERSION};
use tracing::info;

/// Lines describing the effective configuration
pub fn lines(config: &EnchConfig, dry_run: bool) -> Vec<String> {
    let mut lines = vec![format!("{} {} v{}", APP_ICON, APP_NAME, APP_VERSION)];

    lines.push(format!(
        "hub: {} (token {})",
        config.hub.url,
        if config.hub.token.is_some() { "set" } else { "not set" }
    ));
    if dry_run {
        lines.push("dry run: notifications are logged, not sent".to_string());
    }
    lines.push(format!(
        "notify: {}",
        config.notify.as_deref().unwrap_or("-")
    ));
    lines.push(format!("initial delay: {}s", config.initial_delay.as_secs()));

    if let Some(battery) = &config.battery {
        lines.push(format!(
            "battery: every {} min, min level {}%, attributes [{}]{}",
            battery.interval.as_secs() / 60,
            battery.min_level,
            battery.attributes.join(", "),
            notify_suffix(battery.notify.as_deref()),
        ));
    }
    if let Some(unavailable) = &config.unavailable {
        lines.push(format!(
            "unavailable: every {} min{}",
            unavailable.interval.as_secs() / 60,
            notify_suffix(unavailable.notify.as_deref()),
        ));
    }
    if let Some(stale) = &config.stale {
        let scope = if stale.entities.is_empty() {
            "all entities".to_string()
        } else {
            format!("{} entities", stale.entities.len())
        };
        lines.push(format!(
            "stale: every {} min, max stale {} min, {}{}",
            stale.interval.as_secs() / 60,
            stale.max_stale.as_secs() / 60,
            scope,
            notify_suffix(stale.notify.as_deref()),
        ));
    }

    lines.push(format!("exclude: {}", config.exclude.join(", ")));
    lines
}

/// Log the banner at info level
pub fn log(config: &EnchConfig, dry_run: bool) {
    for line in lines(config, dry_run) {
        info!("{}", line);
    }
}

fn notify_suffix(target: Option<&str>) -> String {
    target.map(|t| format!(" -> {}", t)).unwrap_or_default()
}
