//! Request validation shared by every store implementation.

use crate::error::{StoreError, StoreResult};

/// Maximum number of keys (primary plus restore keys) in one lookup.
pub const MAX_KEY_COUNT: usize = 10;

/// Maximum length of a single key, in characters.
pub const MAX_KEY_LENGTH: usize = 512;

/// Rejects requests no store could serve.
///
/// # Errors
/// Returns a validation-kind [`StoreError`] when no path is given, when more
/// than [`MAX_KEY_COUNT`] keys are supplied, or when a key is too long or
/// contains a comma.
///
/// # Examples
/// ```
/// use cache_restore::store::validate_request;
///
/// let paths = vec!["node_modules".to_owned()];
/// assert!(validate_request(&paths, "v1-abc", &[]).is_ok());
/// assert!(validate_request(&paths, "v1,abc", &[]).is_err());
/// ```
pub fn validate_request(
    paths: &[String],
    primary_key: &str,
    restore_keys: &[String],
) -> StoreResult<()> {
    if paths.is_empty() {
        return Err(StoreError::validation(
            "Path Validation Error: At least one directory or file path is required",
        ));
    }

    if restore_keys.len() + 1 > MAX_KEY_COUNT {
        return Err(StoreError::validation(format!(
            "Key Validation Error: Keys are limited to a maximum of {MAX_KEY_COUNT}."
        )));
    }

    std::iter::once(primary_key)
        .chain(restore_keys.iter().map(String::as_str))
        .try_for_each(validate_key)
}

fn validate_key(key: &str) -> StoreResult<()> {
    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(StoreError::validation(format!(
            "Key Validation Error: {key} cannot be larger than {MAX_KEY_LENGTH} characters."
        )));
    }
    if key.contains(',') {
        return Err(StoreError::validation(format!(
            "Key Validation Error: {key} cannot contain commas."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn paths() -> Vec<String> {
        vec!["./node_modules".to_owned()]
    }

    #[rstest]
    fn accepts_well_formed_request() {
        let restore = vec!["v1-".to_owned(), "v0-".to_owned()];
        assert!(validate_request(&paths(), "v1-abc", &restore).is_ok());
    }

    #[rstest]
    fn rejects_empty_paths() {
        let err = validate_request(&[], "v1-abc", &[]).expect_err("no paths");
        assert!(err.is_validation());
        assert!(err.to_string().starts_with("Path Validation Error"));
    }

    #[rstest]
    fn rejects_too_many_keys() {
        let restore: Vec<String> = (0..MAX_KEY_COUNT).map(|i| format!("v{i}-")).collect();
        let err = validate_request(&paths(), "v1-abc", &restore).expect_err("eleven keys");
        assert!(err.is_validation());
        assert!(err.to_string().contains("maximum of 10"));
    }

    #[rstest]
    fn accepts_exactly_max_keys() {
        let restore: Vec<String> = (1..MAX_KEY_COUNT).map(|i| format!("v{i}-")).collect();
        assert!(validate_request(&paths(), "v1-abc", &restore).is_ok());
    }

    #[rstest]
    #[case("a,b")]
    #[case(",")]
    fn rejects_commas_in_primary_key(#[case] key: &str) {
        let err = validate_request(&paths(), key, &[]).expect_err("comma");
        assert!(err.is_validation());
        assert!(err.to_string().ends_with("cannot contain commas."));
    }

    #[rstest]
    fn rejects_commas_in_restore_keys() {
        let restore = vec!["v1-".to_owned(), "v1,".to_owned()];
        let err = validate_request(&paths(), "v1-abc", &restore).expect_err("comma");
        assert!(err.to_string().contains("v1,"));
    }

    #[rstest]
    fn rejects_overlong_keys() {
        let key = "k".repeat(MAX_KEY_LENGTH + 1);
        let err = validate_request(&paths(), &key, &[]).expect_err("too long");
        assert!(err.is_validation());
        assert!(err.to_string().contains("cannot be larger than 512 characters"));
    }

    #[rstest]
    fn accepts_keys_at_length_limit() {
        let key = "k".repeat(MAX_KEY_LENGTH);
        assert!(validate_request(&paths(), &key, &[]).is_ok());
    }
}
