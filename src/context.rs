//! Explicit key-value context carried through one restore invocation.
//!
//! Collects the step outputs and the state handed to later steps of the same
//! job. Nothing here touches the platform; a [`JobChannel`](crate::JobChannel)
//! persists the context once the run has been classified.

use std::collections::BTreeMap;
use std::fmt;

/// Output echoing the normalised primary key.
pub const PRIMARY_KEY_OUTPUT: &str = "primary-key";
/// Output reporting an exact cache hit.
pub const CACHE_HIT_OUTPUT: &str = "cache-hit";

/// Keys of the state persisted for later steps of the job.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum StateKey {
    /// The primary key, recorded as soon as it parses.
    CacheKey,
    /// The key of the entry actually restored, recorded only on a hit.
    CacheResult,
}

impl StateKey {
    /// Returns the name later steps read the value under.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CacheKey => "CACHE_KEY",
            Self::CacheResult => "CACHE_RESULT",
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outputs and persisted state produced by a single invocation.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct JobContext {
    outputs: BTreeMap<String, String>,
    state: BTreeMap<StateKey, String>,
}

impl JobContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a step output, replacing any previous value.
    pub fn set_output(&mut self, name: &str, value: impl fmt::Display) {
        self.outputs.insert(name.to_owned(), value.to_string());
    }

    /// Records state for later steps, replacing any previous value.
    pub fn save_state(&mut self, key: StateKey, value: impl Into<String>) {
        self.state.insert(key, value.into());
    }

    /// Returns the output recorded under `name`.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).map(String::as_str)
    }

    /// Returns the state recorded under `key`.
    #[must_use]
    pub fn state(&self, key: StateKey) -> Option<&str> {
        self.state.get(&key).map(String::as_str)
    }

    /// Iterates over outputs in name order.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outputs
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Iterates over persisted state in key order.
    pub fn states(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.state
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}
