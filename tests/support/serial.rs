//! Serialises restore scenarios that share process-wide tracing state.

use once_cell::sync::Lazy;
use rstest::fixture;
use std::sync::{Mutex, MutexGuard};

static RESTORE_SCENARIO_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[derive(Debug)]
#[must_use = "Hold this guard until the scenario finishes"]
pub struct ScenarioSerialGuard {
    _guard: MutexGuard<'static, ()>,
}

#[fixture]
pub fn serial_guard() -> ScenarioSerialGuard {
    let guard = RESTORE_SCENARIO_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    ScenarioSerialGuard { _guard: guard }
}
