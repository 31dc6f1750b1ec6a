//! File and directory copy operations for cache entries.
//!
//! Provides recursive directory copying with permission preservation.

use camino::Utf8Path;
use color_eyre::eyre::Context;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::error::StoreResult;
use crate::observability::STORE_LOG_TARGET;

/// Copies one stored payload to `target`.
///
/// Directories are copied recursively into `target`; a single file replaces
/// `target`, creating its parent directories first.
///
/// # Errors
///
/// Returns a transient store error if the payload cannot be read or the
/// target cannot be written.
pub(crate) fn copy_entry_path(source: &Utf8Path, target: &Utf8Path) -> StoreResult<()> {
    debug!(
        target: STORE_LOG_TARGET,
        source = %source,
        target = %target,
        "copying cache payload"
    );

    let metadata = fs::symlink_metadata(source)
        .with_context(|| format!("failed to inspect cache payload {source}"))?;

    if metadata.is_dir() {
        copy_dir_recursive(source.as_std_path(), target.as_std_path())
            .with_context(|| format!("failed to copy cache payload from {source} to {target}"))?;
    } else {
        if let Some(parent) = target.parent().filter(|dir| !dir.as_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create parent directory {parent}"))?;
        }
        copy_file_with_permissions(source.as_std_path(), target.as_std_path())
            .with_context(|| format!("failed to copy cache payload from {source} to {target}"))?;
    }

    debug!(
        target: STORE_LOG_TARGET,
        source = %source,
        target = %target,
        "cache payload copied"
    );
    Ok(())
}

/// Recursively copies a directory and its contents.
///
/// Existing files in `dst` are overwritten; unrelated files are left alone.
pub(crate) fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    if !dst.exists() {
        fs::create_dir_all(dst)?;
    }

    for dir_entry in fs::read_dir(src)? {
        let entry = dir_entry?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else if file_type.is_symlink() {
            copy_symlink(&src_path, &dst_path)?;
        } else {
            copy_file_with_permissions(&src_path, &dst_path)?;
        }
    }

    copy_permissions(src, dst);

    Ok(())
}

fn copy_file_with_permissions(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst)?;
    copy_permissions(src, dst);
    Ok(())
}

/// Best-effort permission copy from source to destination.
fn copy_permissions(src: &Path, dst: &Path) {
    let Ok(metadata) = fs::metadata(src) else {
        return;
    };
    if let Err(err) = fs::set_permissions(dst, metadata.permissions()) {
        debug!(
            target: STORE_LOG_TARGET,
            src = %src.display(),
            dst = %dst.display(),
            error = %err,
            "failed to copy permissions (best effort)"
        );
    }
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    if fs::symlink_metadata(dst).is_ok() {
        fs::remove_file(dst)?;
    }
    std::os::unix::fs::symlink(&target, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_file() {
        fs::copy(src, dst)?;
    }
    Ok(())
}
