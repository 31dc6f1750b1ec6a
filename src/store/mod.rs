//! Cache-storage collaborator used by the restore orchestrator.
//!
//! [`CacheStore`] is the single seam between the restore decision logic and
//! wherever cache entries physically live. The crate ships one
//! implementation, [`LocalCacheStore`], which keeps entries in a directory
//! tree on the runner.
//!
//! # Store Layout
//!
//! ```text
//! <root>/
//!   .locks/<entry-id>.lock
//!   <entry-id>/
//!     manifest.json      key, version and paths of the entry
//!     data/<index>       payload for the index-th path
//!     .complete          written last; entries without it are ignored
//! ```

mod copy;
mod local;
mod lock;
mod validate;

pub use local::{CacheEntryManifest, LocalCacheStore, cache_version, entry_id};
pub use lock::EntryLock;
pub use validate::{MAX_KEY_COUNT, MAX_KEY_LENGTH, validate_request};

pub(crate) use copy::copy_entry_path;
pub(crate) use local::{COMPLETION_MARKER, DATA_DIR, MANIFEST_FILE};

use crate::error::StoreResult;

/// Restores cache entries onto the filesystem.
#[cfg_attr(test, mockall::automock)]
pub trait CacheStore {
    /// Restores the best entry for `primary_key` into `paths`.
    ///
    /// `restore_keys` are tried in order when no entry matches `primary_key`
    /// exactly. Returns the key of the restored entry, or `None` when no
    /// entry matched.
    ///
    /// # Errors
    /// Returns a [`StoreErrorKind::Validation`](crate::StoreErrorKind)
    /// error for malformed keys or paths, and a transient error for storage
    /// faults.
    fn restore_cache(
        &self,
        paths: &[String],
        primary_key: &str,
        restore_keys: &[String],
    ) -> StoreResult<Option<String>>;
}
