//! Reads action inputs from the job environment and normalises them.
//!
//! The runner exposes each input as `INPUT_<NAME>`, upper-cased with spaces
//! replaced by underscores. Hyphens survive, so `restore-keys` arrives as
//! `INPUT_RESTORE-KEYS`; the underscore spelling is accepted as a fallback
//! for shells that cannot export hyphenated names.

use std::env;

use crate::error::InputResult;

#[doc(inline)]
pub use crate::error::InputError;

/// Name of the primary key input.
pub const KEY_INPUT: &str = "key";
/// Name of the fallback keys input.
pub const RESTORE_KEYS_INPUT: &str = "restore-keys";
/// Name of the restore paths input.
pub const PATH_INPUT: &str = "path";
/// Name of the required-cache input.
pub const REQUIRED_INPUT: &str = "required";

const TRUE_VALUES: [&str; 3] = ["true", "True", "TRUE"];
const FALSE_VALUES: [&str; 3] = ["false", "False", "FALSE"];

/// Returns the environment variable name the runner uses for `name`.
///
/// # Examples
/// ```
/// use cache_restore::inputs::input_env_name;
///
/// assert_eq!(input_env_name("restore-keys"), "INPUT_RESTORE-KEYS");
/// ```
#[must_use]
pub fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Reads the raw value of input `name`, if the runner supplied one.
#[must_use]
pub fn raw_input(name: &str) -> Option<String> {
    let primary = input_env_name(name);
    env::var(&primary).ok().or_else(|| {
        let fallback = primary.replace('-', "_");
        (fallback != primary)
            .then(|| env::var(fallback).ok())
            .flatten()
    })
}

/// Raw action inputs as supplied by the runner, before normalisation.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RawInputs {
    /// Raw `key` input.
    pub key: Option<String>,
    /// Raw `restore-keys` input.
    pub restore_keys: Option<String>,
    /// Raw `path` input.
    pub path: Option<String>,
    /// Raw `required` input.
    pub required: Option<String>,
}

impl RawInputs {
    /// Reads every input the restore step recognises from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            key: raw_input(KEY_INPUT),
            restore_keys: raw_input(RESTORE_KEYS_INPUT),
            path: raw_input(PATH_INPUT),
            required: raw_input(REQUIRED_INPUT),
        }
    }
}

/// Trims a single-valued input, failing when a required value is empty.
///
/// # Errors
/// Returns [`InputError::Missing`] when `required` is set and the trimmed
/// value is empty or absent.
pub fn normalize_value(raw: Option<&str>, name: &str, required: bool) -> InputResult<String> {
    let value = raw.unwrap_or_default().trim();
    if required && value.is_empty() {
        return Err(missing(name));
    }
    Ok(value.to_owned())
}

/// Splits a multi-line input into trimmed, non-empty lines in input order.
///
/// Duplicates pass through unchanged; ordering encodes fallback priority.
///
/// # Errors
/// Returns [`InputError::Missing`] when `required` is set and no line
/// survives normalisation.
///
/// # Examples
/// ```
/// use cache_restore::inputs::normalize_lines;
///
/// let keys = normalize_lines(Some(" v1-\n\n  v1-linux-  \n"), "restore-keys", false)?;
/// assert_eq!(keys, ["v1-", "v1-linux-"]);
/// # Ok::<(), cache_restore::inputs::InputError>(())
/// ```
pub fn normalize_lines(raw: Option<&str>, name: &str, required: bool) -> InputResult<Vec<String>> {
    let raw_value = raw.unwrap_or_default();
    if required && raw_value.trim().is_empty() {
        return Err(missing(name));
    }
    let lines: Vec<String> = raw_value
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect();
    if required && lines.is_empty() {
        return Err(missing(name));
    }
    Ok(lines)
}

/// Parses a boolean input under the YAML 1.2 core schema.
///
/// An absent or blank value reads as `false`.
///
/// # Errors
/// Returns [`InputError::InvalidBoolean`] for any other spelling.
pub fn parse_boolean(raw: Option<&str>, name: &str) -> InputResult<bool> {
    let value = raw.unwrap_or_default().trim();
    if value.is_empty() || FALSE_VALUES.contains(&value) {
        return Ok(false);
    }
    if TRUE_VALUES.contains(&value) {
        return Ok(true);
    }
    Err(InputError::InvalidBoolean {
        name: name.to_owned(),
    })
}

fn missing(name: &str) -> InputError {
    InputError::Missing {
        name: name.to_owned(),
    }
}
