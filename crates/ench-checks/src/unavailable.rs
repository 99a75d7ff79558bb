//! Unavailable / unknown state check

use crate::report::{Detail, Finding};
use ench_core::State;

/// Report entities whose state is `unavailable` or `unknown`
///
/// `states` must already be filtered and sorted; order is preserved.
pub fn scan<'a>(states: impl IntoIterator<Item = &'a State>) -> Vec<Finding> {
    states
        .into_iter()
        .filter(|state| state.is_unavailable() || state.is_unknown())
        .map(|state| Finding::new(state, Detail::State(state.state.clone())))
        .collect()
}
