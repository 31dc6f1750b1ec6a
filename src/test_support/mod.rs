//! Internal helpers re-exported for integration tests.
//!
//! Seeds local store entries the way a save step would and captures tracing
//! output so suites can assert on the log lines a run emits.

mod fixtures;
mod logging;

pub use fixtures::populate_entry;
pub use logging::{capture_info_logs, capture_warn_logs};
