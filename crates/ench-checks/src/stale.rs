//! Stale entity check

use crate::report::{Detail, Finding};
use chrono::{DateTime, Utc};
use ench_config::StaleConfig;
use ench_core::State;
use tracing::debug;

/// Report entities not updated for at least `config.max_stale`
///
/// `states` must already be filtered and sorted; order is preserved. With a
/// non-empty `config.entities` only those entities are candidates; listed
/// entities missing from `states` are skipped. An entity updated after
/// `now` is never stale.
pub fn scan<'a>(
    states: impl IntoIterator<Item = &'a State>,
    config: &StaleConfig,
    now: DateTime<Utc>,
) -> Vec<Finding> {
    let candidates: Vec<&State> = states
        .into_iter()
        .filter(|state| {
            config.entities.is_empty() || config.entities.contains(&state.entity_id)
        })
        .collect();

    if !config.entities.is_empty() && candidates.len() < config.entities.len() {
        for wanted in &config.entities {
            if !candidates.iter().any(|s| &s.entity_id == wanted) {
                debug!(entity_id = %wanted, "Listed entity not in snapshot or excluded");
            }
        }
    }

    candidates
        .into_iter()
        .filter_map(|state| {
            let elapsed = state.age(now);
            let stale = elapsed
                .to_std()
                .map(|elapsed| elapsed >= config.max_stale)
                .unwrap_or(false);
            stale.then(|| Finding::new(state, Detail::Stale(elapsed)))
        })
        .collect()
}
