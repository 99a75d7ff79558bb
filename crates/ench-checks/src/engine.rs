//! Check engine: snapshot, scan, notify

use crate::notify::{resolve_target, Delivery, Notifier};
use crate::{battery, stale, unavailable, CheckError, CheckKind, ExclusionFilter, Report};
use chrono::{DateTime, Utc};
use ench_config::EnchConfig;
use ench_core::{Context, State};
use ench_hub::SharedHub;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Result of one check cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub report: Report,
    pub delivery: Delivery,
}

/// Runs the configured checks against a hub
///
/// The engine holds no state between cycles; two scans of the same
/// snapshot at the same time produce the same report.
pub struct CheckEngine {
    config: Arc<EnchConfig>,
    hub: SharedHub,
    filter: ExclusionFilter,
    notifier: Notifier,
}

impl CheckEngine {
    /// Build an engine, compiling the exclusion patterns
    pub fn new(config: Arc<EnchConfig>, hub: SharedHub) -> Result<Self, CheckError> {
        let filter = ExclusionFilter::new(&config.exclude)?;
        let notifier = Notifier::new(hub.clone());
        Ok(Self {
            config,
            hub,
            filter,
            notifier,
        })
    }

    pub fn config(&self) -> &EnchConfig {
        &self.config
    }

    pub fn filter(&self) -> &ExclusionFilter {
        &self.filter
    }

    /// Configured checks with their scan period, in scheduling order
    pub fn configured_checks(&self) -> Vec<(CheckKind, Duration)> {
        CheckKind::ALL
            .into_iter()
            .filter_map(|kind| self.interval(kind).map(|period| (kind, period)))
            .collect()
    }

    /// Scan period of a check, `None` if it is not configured
    pub fn interval(&self, kind: CheckKind) -> Option<Duration> {
        match kind {
            CheckKind::Battery => self.config.battery.as_ref().map(|c| c.interval),
            CheckKind::Unavailable => self.config.unavailable.as_ref().map(|c| c.interval),
            CheckKind::Stale => self.config.stale.as_ref().map(|c| c.interval),
        }
    }

    /// Notification target of a check, its own or the global one
    pub fn target(&self, kind: CheckKind) -> Option<&str> {
        let own = match kind {
            CheckKind::Battery => self.config.battery.as_ref().and_then(|c| c.notify.as_deref()),
            CheckKind::Unavailable => self
                .config
                .unavailable
                .as_ref()
                .and_then(|c| c.notify.as_deref()),
            CheckKind::Stale => self.config.stale.as_ref().and_then(|c| c.notify.as_deref()),
        };
        resolve_target(own, self.config.notify.as_deref())
    }

    /// Scan a snapshot without touching the hub
    ///
    /// Excluded entities are dropped, the rest is sorted by entity ID with
    /// duplicates removed before the check runs.
    pub fn scan(
        &self,
        kind: CheckKind,
        snapshot: &[State],
        now: DateTime<Utc>,
    ) -> Result<Report, CheckError> {
        let mut candidates: Vec<&State> = snapshot
            .iter()
            .filter(|state| !self.filter.is_excluded(&state.entity_id))
            .collect();
        candidates.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        candidates.dedup_by(|a, b| a.entity_id == b.entity_id);

        let findings = match kind {
            CheckKind::Battery => {
                let config = self
                    .config
                    .battery
                    .as_ref()
                    .ok_or(CheckError::NotConfigured(kind))?;
                battery::scan(candidates, config)
            }
            CheckKind::Unavailable => {
                if self.config.unavailable.is_none() {
                    return Err(CheckError::NotConfigured(kind));
                }
                unavailable::scan(candidates)
            }
            CheckKind::Stale => {
                let config = self
                    .config
                    .stale
                    .as_ref()
                    .ok_or(CheckError::NotConfigured(kind))?;
                stale::scan(candidates, config, now)
            }
        };

        Ok(Report::new(kind, findings))
    }

    /// Run one full cycle of a check: read, scan, log, notify
    ///
    /// Only a failed snapshot read is an error; a failed notification is
    /// logged and shows up in [`CheckOutcome::delivery`].
    #[instrument(skip(self), fields(check = %kind))]
    pub async fn run(
        &self,
        kind: CheckKind,
        now: DateTime<Utc>,
    ) -> Result<CheckOutcome, CheckError> {
        if self.interval(kind).is_none() {
            return Err(CheckError::NotConfigured(kind));
        }

        let snapshot = self.hub.states().await.map_err(CheckError::Snapshot)?;
        debug!(entities = snapshot.len(), "Snapshot read");

        let report = self.scan(kind, &snapshot, now)?;
        self.log_report(&report);

        let context = Context::new();
        let delivery = self
            .notifier
            .dispatch(&report, self.target(kind), context)
            .await;

        Ok(CheckOutcome { report, delivery })
    }

    fn log_report(&self, report: &Report) {
        let friendly = self.config.show_friendly_name;
        for finding in &report.findings {
            let line = finding.log_line(friendly);
            match report.kind {
                CheckKind::Battery => {
                    warn!(entity_id = %finding.entity_id, "{} {}", finding.icon(), line)
                }
                _ => info!(entity_id = %finding.entity_id, "{} {}", finding.icon(), line),
            }
        }
        if report.is_empty() {
            info!("{} {}: nothing found", report.kind.icon(), report.kind.title());
        } else {
            info!(count = report.len(), "{} {}", report.kind.icon(), report.kind.title());
        }
    }
}
