//! Restores a previously saved build cache at the start of a CI job.
//!
//! The step reads its inputs from the job environment, asks a
//! [`CacheStore`] for the best matching entry, classifies the outcome
//! against the caller's `required` policy, and hands the `primary-key` and
//! `cache-hit` outputs plus the `CACHE_KEY` and `CACHE_RESULT` state to
//! later steps through a [`JobChannel`].

mod channel;
mod config;
mod context;
mod error;
pub mod inputs;
mod matching;
mod observability;
mod report;
mod restore;
pub mod store;
#[doc(hidden)]
pub mod test_support;

pub use channel::{EnvFileChannel, JobChannel, format_entry};
pub use config::{OUTPUT_FILE_ENV, RestoreEnvCfg, STATE_FILE_ENV, resolve_store_dir};
pub use context::{CACHE_HIT_OUTPUT, JobContext, PRIMARY_KEY_OUTPUT, StateKey};
pub use error::{
    CacheRestoreError, CacheRestoreError as Error, ChannelError, ConfigError, InputError,
    Result, StoreError, StoreErrorKind, StoreResult,
};
pub use inputs::RawInputs;
pub use matching::is_exact_match;
pub use observability::{LOG_FILTER_ENV, init_logging};
pub use report::report;
pub use restore::{CacheRequest, PolicyDecision, Restoration, RestoreOutcome, restore};
pub use store::{CacheStore, LocalCacheStore};

use tracing::{error, warn};

use crate::inputs::{KEY_INPUT, normalize_value};
use crate::observability::LOG_TARGET;

/// Runs the restore step against the job environment.
///
/// Loads [`RestoreEnvCfg`], reads the action inputs, restores from the local
/// store and writes outputs and state to the runner's files.
///
/// # Errors
/// Returns an error when configuration cannot be loaded, when an input is
/// missing or malformed, or when the policy classifies the restore as fatal.
pub fn run() -> Result<()> {
    if let Err(err) = color_eyre::install() {
        tracing::debug!(target: LOG_TARGET, "color-eyre already installed: {err}");
    }
    let cfg = RestoreEnvCfg::load()
        .inspect_err(|err| error!(target: LOG_TARGET, "{err}"))?;
    let store = LocalCacheStore::new(cfg.resolved_store_dir());
    let channel = EnvFileChannel::new(cfg.resolved_output_file(), cfg.resolved_state_file());
    run_with(&RawInputs::from_env(), &store, &channel)?;
    Ok(())
}

/// Runs the restore step with explicit collaborators.
///
/// `CACHE_KEY` and `primary-key` are recorded as soon as the key parses, so
/// they reach the channel even when a later input or the restore fails. A
/// fatal classification is logged at error level before it is returned.
///
/// # Errors
/// Returns the fatal classification of the run, if any.
///
/// # Examples
/// ```
/// use cache_restore::{EnvFileChannel, LocalCacheStore, PolicyDecision, RawInputs, run_with};
///
/// let store_dir = tempfile::tempdir()?;
/// let store = LocalCacheStore::new(
///     camino::Utf8PathBuf::from_path_buf(store_dir.path().to_path_buf()).expect("utf8"),
/// );
/// let inputs = RawInputs {
///     key: Some("v1-abc".into()),
///     path: Some("target".into()),
///     ..RawInputs::default()
/// };
/// let restoration = run_with(&inputs, &store, &EnvFileChannel::default())?;
/// assert_eq!(restoration.decision(), PolicyDecision::MissAllowed);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn run_with<S, C>(inputs: &RawInputs, store: &S, channel: &C) -> Result<Restoration>
where
    S: CacheStore + ?Sized,
    C: JobChannel + ?Sized,
{
    restore_and_flush(inputs, store, channel)
        .inspect_err(|err| error!(target: LOG_TARGET, "{err}"))
}

fn restore_and_flush<S, C>(inputs: &RawInputs, store: &S, channel: &C) -> Result<Restoration>
where
    S: CacheStore + ?Sized,
    C: JobChannel + ?Sized,
{
    let primary_key = normalize_value(inputs.key.as_deref(), KEY_INPUT, true)?;
    let mut context = JobContext::new();
    context.save_state(StateKey::CacheKey, primary_key.as_str());
    context.set_output(PRIMARY_KEY_OUTPUT, &primary_key);

    let restoration = CacheRequest::from_inputs(&primary_key, inputs)
        .map(|request| restore(&request, store, &mut context));
    if let Ok(ref restoration) = restoration {
        report(restoration, &mut context);
    }

    if let Err(err) = channel.flush(&context) {
        warn!(target: LOG_TARGET, error = %err, "failed to persist outputs and state");
    }

    restoration?.into_result()
}
