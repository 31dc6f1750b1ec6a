//! Restore orchestration and failure policy.
//!
//! [`restore`] makes exactly one call to the [`CacheStore`] and classifies
//! the result against the request's `required` flag:
//!
//! | Outcome          | required         | optional                  |
//! |------------------|------------------|---------------------------|
//! | hit              | success          | success                   |
//! | miss             | fatal            | success, info log         |
//! | validation error | fatal            | fatal                     |
//! | other error      | fatal            | success, warning log      |
//!
//! Validation errors are never suppressed: they mean the step itself is
//! misconfigured, and treating them as "no cache" would hide that.

mod request;

pub use request::CacheRequest;

use tracing::{debug, info, warn};

use crate::context::{JobContext, StateKey};
use crate::error::{CacheRestoreError, Result, StoreError};
use crate::matching::is_exact_match;
use crate::observability::LOG_TARGET;
use crate::store::CacheStore;

/// What the store call produced, independent of policy.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RestoreOutcome {
    resolved_key: Option<String>,
    is_exact_match: bool,
}

impl RestoreOutcome {
    fn resolved(primary_key: &str, resolved_key: String) -> Self {
        let is_exact_match = is_exact_match(primary_key, Some(&resolved_key));
        Self {
            resolved_key: Some(resolved_key),
            is_exact_match,
        }
    }

    /// Returns the key of the restored entry, if any.
    #[must_use]
    pub fn resolved_key(&self) -> Option<&str> {
        self.resolved_key.as_deref()
    }

    /// Reports whether the restored entry matches the primary key.
    #[must_use]
    pub const fn is_exact_match(&self) -> bool {
        self.is_exact_match
    }

    /// Reports whether any entry was restored.
    #[must_use]
    pub const fn found(&self) -> bool {
        self.resolved_key.is_some()
    }
}

/// Policy classification of a restore attempt.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PolicyDecision {
    /// An entry was restored, exactly or via a fallback key.
    Hit,
    /// Nothing matched and the cache is optional.
    MissAllowed,
    /// Nothing matched and the cache is required.
    MissFatal,
    /// The store failed transiently and the cache is optional.
    ErrorAllowed,
    /// The store failed and the failure cannot be ignored.
    ErrorFatal,
}

impl PolicyDecision {
    /// Reports whether this decision fails the job.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::MissFatal | Self::ErrorFatal)
    }
}

#[derive(Debug)]
enum Detail {
    Restored,
    Miss { message: String },
    Failed(StoreError),
}

/// Result record of [`restore`].
#[derive(Debug)]
pub struct Restoration {
    outcome: RestoreOutcome,
    decision: PolicyDecision,
    detail: Detail,
}

impl Restoration {
    /// Returns the store outcome.
    #[must_use]
    pub const fn outcome(&self) -> &RestoreOutcome {
        &self.outcome
    }

    /// Returns the policy decision.
    #[must_use]
    pub const fn decision(&self) -> PolicyDecision {
        self.decision
    }

    /// Reports whether the `cache-hit` output should be `true`.
    #[must_use]
    pub const fn cache_hit(&self) -> bool {
        matches!(self.decision, PolicyDecision::Hit) && self.outcome.is_exact_match
    }

    /// Returns the miss or error message, if the restore did not hit.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            Detail::Restored => None,
            Detail::Miss { message } => Some(message.clone()),
            Detail::Failed(err) => Some(err.to_string()),
        }
    }

    /// Returns the store error behind an error decision.
    #[must_use]
    pub const fn error(&self) -> Option<&StoreError> {
        match &self.detail {
            Detail::Failed(err) => Some(err),
            Detail::Restored | Detail::Miss { .. } => None,
        }
    }

    /// Converts fatal decisions into the error that fails the job.
    ///
    /// # Errors
    /// Returns [`CacheRestoreError::CacheNotFound`] for a required miss and
    /// [`CacheRestoreError::Store`] for a fatal store error.
    pub fn into_result(self) -> Result<Self> {
        match (self.decision, self.detail) {
            (PolicyDecision::MissFatal, Detail::Miss { message }) => {
                Err(CacheRestoreError::CacheNotFound { message })
            }
            (PolicyDecision::ErrorFatal, Detail::Failed(err)) => Err(err.into()),
            (decision, detail) => Ok(Self {
                outcome: self.outcome,
                decision,
                detail,
            }),
        }
    }
}

/// Restores the cache described by `request` and classifies the outcome.
///
/// On a hit the resolved key is recorded as `CACHE_RESULT` in `context` so a
/// later save step can skip re-saving an entry that already exists.
pub fn restore<S>(request: &CacheRequest, store: &S, context: &mut JobContext) -> Restoration
where
    S: CacheStore + ?Sized,
{
    let attempt = store.restore_cache(
        request.paths(),
        request.primary_key(),
        request.restore_keys(),
    );

    match attempt {
        Ok(Some(resolved_key)) if !resolved_key.is_empty() => hit(request, resolved_key, context),
        Ok(_) => miss(request),
        Err(err) => failure(request, err),
    }
}

fn hit(request: &CacheRequest, resolved_key: String, context: &mut JobContext) -> Restoration {
    context.save_state(StateKey::CacheResult, resolved_key.as_str());
    info!(target: LOG_TARGET, "Cache restored from key: {resolved_key}");
    let outcome = RestoreOutcome::resolved(request.primary_key(), resolved_key);
    debug!(
        target: LOG_TARGET,
        exact = outcome.is_exact_match(),
        "classified cache hit"
    );
    Restoration {
        outcome,
        decision: PolicyDecision::Hit,
        detail: Detail::Restored,
    }
}

fn miss(request: &CacheRequest) -> Restoration {
    let message = format!(
        "Cache not found for input keys: {}",
        request.candidate_keys().collect::<Vec<_>>().join(", ")
    );
    let decision = if request.required() {
        debug!(target: LOG_TARGET, "required cache missed");
        PolicyDecision::MissFatal
    } else {
        info!(target: LOG_TARGET, "{message}");
        PolicyDecision::MissAllowed
    };
    Restoration {
        outcome: RestoreOutcome::default(),
        decision,
        detail: Detail::Miss { message },
    }
}

fn failure(request: &CacheRequest, err: StoreError) -> Restoration {
    let decision = if request.required() || err.is_validation() {
        debug!(
            target: LOG_TARGET,
            kind = ?err.kind(),
            required = request.required(),
            "store error is fatal"
        );
        PolicyDecision::ErrorFatal
    } else {
        warn!(
            target: LOG_TARGET,
            error = %err,
            "cache restore failed; continuing without cache"
        );
        PolicyDecision::ErrorAllowed
    };
    Restoration {
        outcome: RestoreOutcome::default(),
        decision,
        detail: Detail::Failed(err),
    }
}
