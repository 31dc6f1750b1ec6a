//! Advisory per-entry locks.
//!
//! A restore copies an entry out while holding a shared lock, so a writer
//! replacing the same entry waits until every reader is done. Writers are
//! whatever populates the store: a save step sharing this layout, or the
//! seeding helper in [`crate::test_support`]. Locks live in
//! `<store>/.locks/<entry-id>.lock` and use `flock(2)` on Unix. Elsewhere the
//! lock file is still created but nothing is locked.

use std::fs::{self, File, OpenOptions};
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

/// Subdirectory within the store for lock files.
pub(crate) const LOCKS_SUBDIR: &str = ".locks";

/// Returns the lock file guarding `entry_id`.
pub(crate) fn lock_path(store_dir: &Utf8Path, entry_id: &str) -> Utf8PathBuf {
    store_dir.join(LOCKS_SUBDIR).join(format!("{entry_id}.lock"))
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Access {
    Read,
    Write,
}

/// Holds an entry lock until dropped.
#[derive(Debug)]
pub struct EntryLock {
    _file: File,
}

impl EntryLock {
    /// Locks an entry for reading while its payload is restored.
    ///
    /// Any number of restores may hold the lock at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened or locked.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camino::Utf8Path;
    /// use cache_restore::store::EntryLock;
    ///
    /// let _guard = EntryLock::for_restore(Utf8Path::new("/tmp/cache-restore"), "3f2a9c")?;
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn for_restore(store_dir: &Utf8Path, entry_id: &str) -> io::Result<Self> {
        Self::lock(store_dir, entry_id, Access::Read)
    }

    /// Locks an entry for replacing its contents, waiting for readers.
    ///
    /// The restore step never writes entries; this is for populating the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened or locked.
    pub fn for_populate(store_dir: &Utf8Path, entry_id: &str) -> io::Result<Self> {
        Self::lock(store_dir, entry_id, Access::Write)
    }

    fn lock(store_dir: &Utf8Path, entry_id: &str, access: Access) -> io::Result<Self> {
        let path = lock_path(store_dir, entry_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        flock(&file, access)?;
        Ok(Self { _file: file })
    }
}

#[cfg(unix)]
fn flock(file: &File, access: Access) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let operation = match access {
        Access::Read => libc::LOCK_SH,
        Access::Write => libc::LOCK_EX,
    };
    loop {
        // SAFETY: `file` is borrowed for the whole call, so its descriptor
        // stays open and valid.
        if unsafe { libc::flock(file.as_raw_fd(), operation) } == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(not(unix))]
const fn flock(_file: &File, _access: Access) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct LockDir {
        _temp: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn lock_dir() -> LockDir {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = Utf8Path::from_path(temp.path())
            .expect("utf8 path")
            .to_owned();
        LockDir { _temp: temp, root }
    }

    #[rstest]
    fn restore_lock_lives_under_the_locks_dir(lock_dir: LockDir) {
        let _guard = EntryLock::for_restore(&lock_dir.root, "abc123").expect("lock");
        assert!(lock_dir.root.join(".locks/abc123.lock").is_file());
    }

    #[rstest]
    fn concurrent_restores_share_the_lock(lock_dir: LockDir) {
        let first = EntryLock::for_restore(&lock_dir.root, "abc123").expect("first reader");
        let second = EntryLock::for_restore(&lock_dir.root, "abc123").expect("second reader");
        drop((first, second));
    }

    #[rstest]
    fn restore_proceeds_once_populate_releases(lock_dir: LockDir) {
        let writer = EntryLock::for_populate(&lock_dir.root, "abc123").expect("writer");
        drop(writer);
        let _reader = EntryLock::for_restore(&lock_dir.root, "abc123").expect("reader");
    }

    #[cfg(unix)]
    #[rstest]
    fn populate_excludes_concurrent_restores(lock_dir: LockDir) {
        use std::os::unix::io::AsRawFd;

        let _writer = EntryLock::for_populate(&lock_dir.root, "abc123").expect("writer");
        let contender = File::open(lock_path(&lock_dir.root, "abc123")).expect("open lock file");
        // SAFETY: `contender` is open for the duration of the call.
        let status = unsafe { libc::flock(contender.as_raw_fd(), libc::LOCK_SH | libc::LOCK_NB) };
        assert_ne!(status, 0, "shared lock must not be granted while writing");
    }
}
