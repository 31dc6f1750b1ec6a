//! Translates a [`Restoration`] into step outputs.

use crate::context::{CACHE_HIT_OUTPUT, JobContext};
use crate::restore::{PolicyDecision, Restoration};

/// Records the `cache-hit` output for `restoration`.
///
/// `cache-hit` is `true` only for an exact hit. Fatal decisions leave it
/// unset: the job fails and later steps do not run.
pub fn report(restoration: &Restoration, context: &mut JobContext) {
    match restoration.decision() {
        PolicyDecision::Hit | PolicyDecision::MissAllowed | PolicyDecision::ErrorAllowed => {
            context.set_output(CACHE_HIT_OUTPUT, restoration.cache_hit());
        }
        PolicyDecision::MissFatal | PolicyDecision::ErrorFatal => {}
    }
}
