//! Restores a saved build cache into the job workspace.
//!
//! Inputs arrive as `INPUT_*` environment variables set by the runner; tool
//! settings come from `CACHE_RESTORE_*` variables parsed by
//! [`OrthoConfig`](https://github.com/leynos/ortho-config). The binary exits
//! with status code `0` on success and `1` when the restore is fatal.

fn main() -> color_eyre::eyre::Result<()> {
    cache_restore::init_logging();
    cache_restore::run().map_err(|err| color_eyre::eyre::eyre!(err))?;
    Ok(())
}
