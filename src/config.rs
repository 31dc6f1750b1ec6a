//! Tool configuration for the restore step.
//!
//! Resolves the local store root and the files used to hand outputs and
//! state to later job steps. Values come from `CACHE_RESTORE_*` environment
//! variables via [`OrthoConfig`], with XDG-compliant fallbacks for the store
//! and the runner's `GITHUB_OUTPUT` / `GITHUB_STATE` files for the channel.

use std::ffi::OsString;

use camino::Utf8PathBuf;
use color_eyre::eyre::eyre;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Subdirectory path within the XDG cache home.
const STORE_SUBDIR: &str = "cache-restore/entries";

/// Environment variable naming the runner's output file.
pub const OUTPUT_FILE_ENV: &str = "GITHUB_OUTPUT";

/// Environment variable naming the runner's state file.
pub const STATE_FILE_ENV: &str = "GITHUB_STATE";

/// Captures tool settings supplied via environment variables.
///
/// # Examples
/// ```
/// use cache_restore::RestoreEnvCfg;
///
/// let cfg = RestoreEnvCfg::default();
/// assert!(cfg.store_dir.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, OrthoConfig, Default)]
#[ortho_config(prefix = "CACHE_RESTORE")]
pub struct RestoreEnvCfg {
    /// Root directory of the local cache store.
    pub store_dir: Option<Utf8PathBuf>,
    /// File receiving step outputs. Defaults to `GITHUB_OUTPUT`.
    pub output_file: Option<Utf8PathBuf>,
    /// File receiving persisted state. Defaults to `GITHUB_STATE`.
    pub state_file: Option<Utf8PathBuf>,
}

impl RestoreEnvCfg {
    /// Loads configuration from environment variables without parsing CLI arguments.
    ///
    /// # Errors
    /// Returns an error when a `CACHE_RESTORE_*` value cannot be deserialised.
    pub fn load() -> ConfigResult<Self> {
        let args = [OsString::from("cache-restore")];
        Self::load_from_iter(args).map_err(|err| ConfigError::from(eyre!(err)))
    }

    /// Returns the configured store root or the XDG-derived default.
    #[must_use]
    pub fn resolved_store_dir(&self) -> Utf8PathBuf {
        self.store_dir
            .clone()
            .filter(|dir| !dir.as_str().trim().is_empty())
            .unwrap_or_else(resolve_store_dir)
    }

    /// Returns the output file, falling back to the runner's `GITHUB_OUTPUT`.
    #[must_use]
    pub fn resolved_output_file(&self) -> Option<Utf8PathBuf> {
        self.output_file
            .clone()
            .or_else(|| path_from_env(OUTPUT_FILE_ENV))
    }

    /// Returns the state file, falling back to the runner's `GITHUB_STATE`.
    #[must_use]
    pub fn resolved_state_file(&self) -> Option<Utf8PathBuf> {
        self.state_file
            .clone()
            .or_else(|| path_from_env(STATE_FILE_ENV))
    }
}

/// Resolves the default store directory from XDG conventions.
///
/// The resolution order is:
///
/// 1. `$XDG_CACHE_HOME/cache-restore/entries` if `XDG_CACHE_HOME` is set
/// 2. `~/.cache/cache-restore/entries` as fallback
/// 3. `/tmp/cache-restore/entries` as last resort
///
/// # Examples
///
/// ```
/// use cache_restore::resolve_store_dir;
///
/// let store_dir = resolve_store_dir();
/// assert!(store_dir.as_str().contains("cache-restore"));
/// ```
#[must_use]
pub fn resolve_store_dir() -> Utf8PathBuf {
    if let Some(dir) = resolve_from_xdg_cache() {
        return dir;
    }

    if let Some(dir) = resolve_from_home() {
        return dir;
    }

    Utf8PathBuf::from("/tmp/cache-restore/entries")
}

fn path_from_env(name: &str) -> Option<Utf8PathBuf> {
    let raw = std::env::var(name).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(Utf8PathBuf::from(trimmed))
}

fn resolve_from_xdg_cache() -> Option<Utf8PathBuf> {
    path_from_env("XDG_CACHE_HOME").map(|path| path.join(STORE_SUBDIR))
}

fn resolve_from_home() -> Option<Utf8PathBuf> {
    let home = dirs::home_dir()?;
    let path = Utf8PathBuf::from_path_buf(home).ok()?;
    Some(path.join(".cache").join(STORE_SUBDIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serial_test::serial;
    use temp_env::with_vars;

    #[rstest]
    #[serial]
    fn explicit_store_dir_wins() {
        let cfg = RestoreEnvCfg {
            store_dir: Some(Utf8PathBuf::from("/custom/store")),
            ..RestoreEnvCfg::default()
        };
        let result = with_vars([("XDG_CACHE_HOME", Some("/xdg"))], || {
            cfg.resolved_store_dir()
        });
        assert_eq!(result.as_str(), "/custom/store");
    }

    #[rstest]
    #[serial]
    fn store_dir_uses_xdg_cache_home_when_unset() {
        let result = with_vars(
            [("XDG_CACHE_HOME", Some("/home/runner/.cache"))],
            || RestoreEnvCfg::default().resolved_store_dir(),
        );
        assert_eq!(
            result.as_str(),
            format!("/home/runner/.cache/{STORE_SUBDIR}").as_str()
        );
    }

    #[rstest]
    #[serial]
    fn whitespace_xdg_cache_home_is_ignored() {
        let result = with_vars([("XDG_CACHE_HOME", Some("   "))], resolve_store_dir);
        assert!(result.as_str().ends_with(STORE_SUBDIR));
        assert!(!result.as_str().starts_with("   "));
    }

    #[rstest]
    #[serial]
    fn output_and_state_files_fall_back_to_runner_variables() {
        let (output, state) = with_vars(
            [
                (OUTPUT_FILE_ENV, Some("/runner/output")),
                (STATE_FILE_ENV, Some("/runner/state")),
            ],
            || {
                let cfg = RestoreEnvCfg::default();
                (cfg.resolved_output_file(), cfg.resolved_state_file())
            },
        );
        assert_eq!(output, Some(Utf8PathBuf::from("/runner/output")));
        assert_eq!(state, Some(Utf8PathBuf::from("/runner/state")));
    }

    #[rstest]
    #[serial]
    fn configured_output_file_overrides_runner_variable() {
        let cfg = RestoreEnvCfg {
            output_file: Some(Utf8PathBuf::from("/custom/output")),
            ..RestoreEnvCfg::default()
        };
        let output = with_vars([(OUTPUT_FILE_ENV, Some("/runner/output"))], || {
            cfg.resolved_output_file()
        });
        assert_eq!(output, Some(Utf8PathBuf::from("/custom/output")));
    }

    #[rstest]
    #[serial]
    fn missing_runner_files_resolve_to_none() {
        let state = with_vars([(STATE_FILE_ENV, None::<&str>)], || {
            RestoreEnvCfg::default().resolved_state_file()
        });
        assert!(state.is_none());
    }
}
