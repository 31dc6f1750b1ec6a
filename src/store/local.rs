//! Directory-backed cache store.
//!
//! Entries are matched on their key and on a version derived from the
//! requested path list, so an entry saved for `node_modules` never restores
//! into a request for `target/`.

use std::fs;
use std::io::ErrorKind;
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::Report;
use color_eyre::eyre::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::CacheStore;
use super::copy::copy_entry_path;
use super::lock::EntryLock;
use super::validate::validate_request;
use crate::error::{StoreError, StoreResult};
use crate::observability::STORE_LOG_TARGET;

/// Marker file name indicating a complete cache entry.
pub(crate) const COMPLETION_MARKER: &str = ".complete";
/// Manifest file name inside an entry directory.
pub(crate) const MANIFEST_FILE: &str = "manifest.json";
/// Directory holding one payload per requested path.
pub(crate) const DATA_DIR: &str = "data";

/// Metadata describing a stored entry.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CacheEntryManifest {
    /// Key the entry was saved under.
    pub key: String,
    /// Version derived from the saved path list.
    pub version: String,
    /// Paths the entry was saved from, in payload order.
    pub paths: Vec<String>,
}

#[derive(Debug)]
struct StoredEntry {
    id: String,
    dir: Utf8PathBuf,
    manifest: CacheEntryManifest,
    completed_at: SystemTime,
}

/// Cache store keeping entries below a local directory.
#[derive(Debug, Clone)]
pub struct LocalCacheStore {
    root: Utf8PathBuf,
}

impl LocalCacheStore {
    /// Creates a store rooted at `root`. The directory need not exist yet.
    #[must_use]
    pub const fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn load_entries(&self, version: &str) -> StoreResult<Vec<StoredEntry>> {
        let read_dir = match fs::read_dir(&self.root) {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    target: STORE_LOG_TARGET,
                    root = %self.root,
                    "store directory absent, treating as empty"
                );
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(StoreError::from(
                    Report::new(err).wrap_err(format!("failed to read cache store {}", self.root)),
                ));
            }
        };

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let entry = dir_entry
                .with_context(|| format!("failed to list cache store {}", self.root))?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let stored = read_entry(&self.root.join(&name), name)
                .filter(|stored| stored.manifest.version == version);
            entries.extend(stored);
        }
        Ok(entries)
    }

    fn restore_entry(&self, entry: &StoredEntry, paths: &[String]) -> StoreResult<()> {
        let _lock = EntryLock::for_restore(&self.root, &entry.id)
            .with_context(|| format!("failed to lock cache entry {}", entry.id))?;

        for (index, path) in paths.iter().enumerate() {
            let payload = entry.dir.join(DATA_DIR).join(index.to_string());
            if fs::symlink_metadata(&payload).is_err() {
                debug!(
                    target: STORE_LOG_TARGET,
                    path = %path,
                    "entry holds no payload for path"
                );
                continue;
            }
            copy_entry_path(&payload, &expand_home(path))?;
        }
        Ok(())
    }
}

impl CacheStore for LocalCacheStore {
    fn restore_cache(
        &self,
        paths: &[String],
        primary_key: &str,
        restore_keys: &[String],
    ) -> StoreResult<Option<String>> {
        validate_request(paths, primary_key, restore_keys)?;

        let entries = self.load_entries(&cache_version(paths))?;
        let Some(entry) = select_entry(&entries, primary_key, restore_keys) else {
            debug!(
                target: STORE_LOG_TARGET,
                primary_key,
                candidates = entries.len(),
                "no cache entry matched"
            );
            return Ok(None);
        };

        self.restore_entry(entry, paths)?;
        info!(
            target: STORE_LOG_TARGET,
            key = %entry.manifest.key,
            entry = %entry.id,
            "cache entry restored"
        );
        Ok(Some(entry.manifest.key.clone()))
    }
}

/// Computes the version tag for a path list.
///
/// # Examples
/// ```
/// use cache_restore::store::cache_version;
///
/// let a = cache_version(&["node_modules".to_owned()]);
/// let b = cache_version(&["target".to_owned()]);
/// assert_ne!(a, b);
/// ```
#[must_use]
pub fn cache_version(paths: &[String]) -> String {
    let digest = Sha256::digest(paths.join("|").as_bytes());
    format!("{digest:x}")
}

/// Computes the directory name of the entry for `key` at `version`.
#[must_use]
pub fn entry_id(version: &str, key: &str) -> String {
    let digest = Sha256::new()
        .chain_update(version.as_bytes())
        .chain_update([0_u8])
        .chain_update(key.as_bytes())
        .finalize();
    format!("{digest:x}")
}

/// Picks the primary-key entry, else the best entry for each restore key in
/// order: an exact key match first, then the newest prefix match.
fn select_entry<'a>(
    entries: &'a [StoredEntry],
    primary_key: &str,
    restore_keys: &[String],
) -> Option<&'a StoredEntry> {
    if let Some(exact) = newest(entries.iter().filter(|e| e.manifest.key == primary_key)) {
        return Some(exact);
    }
    restore_keys.iter().find_map(|restore_key| {
        newest(entries.iter().filter(|e| e.manifest.key == *restore_key)).or_else(|| {
            newest(
                entries
                    .iter()
                    .filter(|e| e.manifest.key.starts_with(restore_key.as_str())),
            )
        })
    })
}

fn newest<'a>(candidates: impl Iterator<Item = &'a StoredEntry>) -> Option<&'a StoredEntry> {
    candidates.max_by(|a, b| {
        a.completed_at
            .cmp(&b.completed_at)
            .then_with(|| a.id.cmp(&b.id))
    })
}

/// Reads an entry directory, skipping incomplete or unreadable entries.
fn read_entry(dir: &Utf8Path, id: String) -> Option<StoredEntry> {
    let marker = dir.join(COMPLETION_MARKER);
    let completed_at = fs::metadata(&marker).and_then(|meta| meta.modified()).ok()?;
    let raw = match fs::read_to_string(dir.join(MANIFEST_FILE)) {
        Ok(raw) => raw,
        Err(err) => {
            debug!(target: STORE_LOG_TARGET, entry = %dir, error = %err, "unreadable manifest");
            return None;
        }
    };
    let manifest: CacheEntryManifest = match serde_json::from_str(&raw) {
        Ok(manifest) => manifest,
        Err(err) => {
            debug!(target: STORE_LOG_TARGET, entry = %dir, error = %err, "malformed manifest");
            return None;
        }
    };
    Some(StoredEntry {
        id,
        dir: dir.to_owned(),
        manifest,
        completed_at,
    })
}

/// Expands a leading `~` to the home directory.
pub(crate) fn expand_home(path: &str) -> Utf8PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };
    let home = dirs::home_dir().and_then(|home| Utf8PathBuf::from_path_buf(home).ok());
    match (rest, home) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => Utf8PathBuf::from(path),
    }
}
