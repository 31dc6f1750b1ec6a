//! Seeds local store entries for tests.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::Context;
use tracing::debug;

use crate::error::StoreResult;
use crate::observability::STORE_LOG_TARGET;
use crate::store::{
    COMPLETION_MARKER, CacheEntryManifest, DATA_DIR, EntryLock, MANIFEST_FILE, cache_version,
    copy_entry_path, entry_id,
};

/// Writes a complete entry for `key` into the store at `store_dir`.
///
/// `sources[i]` becomes the payload restored into `paths[i]`; paths without
/// a source are saved empty. Any previous entry for the same key and paths
/// is replaced. The completion marker is written last.
///
/// # Errors
///
/// Returns an error if the entry directory cannot be created or a source
/// cannot be copied.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use cache_restore::test_support::populate_entry;
///
/// let store = Utf8Path::new("/tmp/cache-store");
/// let paths = vec!["node_modules".to_owned()];
/// populate_entry(store, "v1-abc", &paths, &[Utf8Path::new("/tmp/build/node_modules")])?;
/// # Ok::<(), cache_restore::StoreError>(())
/// ```
pub fn populate_entry(
    store_dir: &Utf8Path,
    key: &str,
    paths: &[String],
    sources: &[&Utf8Path],
) -> StoreResult<Utf8PathBuf> {
    let version = cache_version(paths);
    let id = entry_id(&version, key);
    let entry_dir = store_dir.join(&id);

    fs::create_dir_all(store_dir)
        .with_context(|| format!("failed to create store directory: {store_dir}"))?;
    let _lock = EntryLock::for_populate(store_dir, &id)
        .with_context(|| format!("failed to lock cache entry {id}"))?;

    if entry_dir.exists() {
        fs::remove_dir_all(&entry_dir)
            .with_context(|| format!("failed to clear previous entry: {entry_dir}"))?;
    }
    let data_dir = entry_dir.join(DATA_DIR);
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create entry directory: {data_dir}"))?;

    for (index, source) in sources.iter().take(paths.len()).enumerate() {
        copy_entry_path(source, &data_dir.join(index.to_string()))?;
    }

    let manifest = CacheEntryManifest {
        key: key.to_owned(),
        version,
        paths: paths.to_vec(),
    };
    let rendered =
        serde_json::to_string_pretty(&manifest).context("failed to serialise entry manifest")?;
    fs::write(entry_dir.join(MANIFEST_FILE), rendered)
        .with_context(|| format!("failed to write manifest for {entry_dir}"))?;

    let marker = entry_dir.join(COMPLETION_MARKER);
    fs::write(&marker, "")
        .with_context(|| format!("failed to write cache completion marker: {marker}"))?;

    debug!(target: STORE_LOG_TARGET, key, entry = %entry_dir, "cache entry populated");
    Ok(entry_dir)
}
