//! Shared tracing configuration for the restore step.
//!
//! Centralises the log targets used by the crate so subscribers can filter
//! restore events without pulling in unrelated application logs.

use tracing_subscriber::EnvFilter;

/// Target used by the orchestrator and reporter.
pub(crate) const LOG_TARGET: &str = "cache_restore::restore";

/// Target used by the cache store.
pub(crate) const STORE_LOG_TARGET: &str = "cache_restore::store";

/// Environment variable holding the log filter directives.
pub const LOG_FILTER_ENV: &str = "CACHE_RESTORE_LOG";

const DEFAULT_FILTER: &str = "info";

/// Installs the process-wide subscriber used by the binary.
///
/// Job runners timestamp each line themselves, so the formatter omits time.
/// Repeated calls are harmless: only the first subscriber is kept.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stdout)
        .try_init();
    if let Err(err) = installed {
        tracing::debug!("tracing subscriber already installed: {err}");
    }
}
