//! Normalised restore request.

use crate::error::{InputError, InputResult};
use crate::inputs::{
    KEY_INPUT, PATH_INPUT, REQUIRED_INPUT, RESTORE_KEYS_INPUT, RawInputs, normalize_lines,
    parse_boolean,
};

/// A fully normalised restore request.
///
/// `primary_key` and `paths` are never empty; `restore_keys` keep input
/// order and hold no blank entries.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CacheRequest {
    primary_key: String,
    restore_keys: Vec<String>,
    paths: Vec<String>,
    required: bool,
}

impl CacheRequest {
    /// Builds a request, trimming every value and dropping blank entries.
    ///
    /// # Errors
    /// Returns [`InputError::Missing`] when the primary key or every path is
    /// blank.
    ///
    /// # Examples
    /// ```
    /// use cache_restore::CacheRequest;
    ///
    /// let request = CacheRequest::new("v1-abc", vec![" v1- ".into(), "".into()], vec!["target".into()], false)?;
    /// assert_eq!(request.restore_keys(), ["v1-"]);
    /// # Ok::<(), cache_restore::inputs::InputError>(())
    /// ```
    pub fn new(
        primary_key: &str,
        restore_keys: Vec<String>,
        paths: Vec<String>,
        required: bool,
    ) -> InputResult<Self> {
        let key = primary_key.trim();
        if key.is_empty() {
            return Err(InputError::Missing {
                name: KEY_INPUT.to_owned(),
            });
        }
        let cleaned_paths = non_blank(paths);
        if cleaned_paths.is_empty() {
            return Err(InputError::Missing {
                name: PATH_INPUT.to_owned(),
            });
        }
        Ok(Self {
            primary_key: key.to_owned(),
            restore_keys: non_blank(restore_keys),
            paths: cleaned_paths,
            required,
        })
    }

    /// Normalises the remaining raw inputs around an already parsed key.
    ///
    /// # Errors
    /// Returns an [`InputError`] when `path` is missing or `required` is not
    /// a valid boolean.
    pub fn from_inputs(primary_key: &str, inputs: &RawInputs) -> InputResult<Self> {
        let restore_keys =
            normalize_lines(inputs.restore_keys.as_deref(), RESTORE_KEYS_INPUT, false)?;
        let paths = normalize_lines(inputs.path.as_deref(), PATH_INPUT, true)?;
        let required = parse_boolean(inputs.required.as_deref(), REQUIRED_INPUT)?;
        Self::new(primary_key, restore_keys, paths, required)
    }

    /// Returns the exact key the caller wants.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Returns the fallback keys in priority order.
    #[must_use]
    pub fn restore_keys(&self) -> &[String] {
        &self.restore_keys
    }

    /// Returns the paths to restore into.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Reports whether a miss or soft error fails the job.
    #[must_use]
    pub const fn required(&self) -> bool {
        self.required
    }

    /// Lists the primary key followed by the restore keys.
    pub fn candidate_keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_key.as_str())
            .chain(self.restore_keys.iter().map(String::as_str))
    }
}

fn non_blank(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .collect()
}
