//! Classifies a resolved cache key as an exact or fallback match.
//!
//! Keys compare case-insensitively but accent-sensitively: `V1-Linux`
//! matches `v1-linux`, while `café` does not match `cafe`. Only letter
//! identity and diacritics count. Width variants (`ａ`), ligatures (`ﬁ`),
//! and the Greek final sigma are presentation forms of the same letters and
//! compare equal, as do composed and decomposed spellings.

use uncased::UncasedStr;
use unicode_normalization::UnicodeNormalization;

const FINAL_SIGMA: char = '\u{3c2}';
const SIGMA: char = '\u{3c3}';

/// Returns `true` when `resolved_key` names the same cache entry as
/// `primary_key`.
///
/// An absent or empty resolved key is never an exact match.
///
/// # Examples
/// ```
/// use cache_restore::is_exact_match;
///
/// assert!(is_exact_match("v1-abc", Some("V1-ABC")));
/// assert!(!is_exact_match("v1-abc", Some("v1-abd")));
/// assert!(!is_exact_match("v1-abc", None));
/// ```
#[must_use]
pub fn is_exact_match(primary_key: &str, resolved_key: Option<&str>) -> bool {
    match resolved_key {
        Some(resolved) if !resolved.is_empty() => keys_equivalent(primary_key, resolved),
        _ => false,
    }
}

fn keys_equivalent(left: &str, right: &str) -> bool {
    if left.is_ascii() && right.is_ascii() {
        return UncasedStr::new(left) == UncasedStr::new(right);
    }
    folded(left).eq(folded(right))
}

/// Compatibility decomposition followed by lower-casing.
///
/// Diacritics survive NFKD as combining marks, so they stay significant.
fn folded(key: &str) -> impl Iterator<Item = char> + '_ {
    key.nfkd()
        .flat_map(char::to_lowercase)
        .map(|ch| if ch == FINAL_SIGMA { SIGMA } else { ch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("v1-abc", "v1-abc")]
    #[case("v1-abc", "V1-ABC")]
    #[case("Linux-npm-3f2a", "linux-NPM-3F2A")]
    #[case("café-deps", "CAFÉ-deps")]
    #[case("cafe\u{301}", "caf\u{e9}")]
    #[case("ΣΊΣΥΦΟΣ", "σίσυφοσ")]
    #[case("ΟΔΟΣ", "οδος")]
    #[case("ａbc", "abc")]
    #[case("ﬁle", "file")]
    #[case("Ｖ１-ABC", "v1-abc")]
    fn case_differences_are_exact(#[case] primary: &str, #[case] resolved: &str) {
        assert!(is_exact_match(primary, Some(resolved)));
    }

    #[rstest]
    #[case("v1-abc", "v1-xyz")]
    #[case("v1-abc", "v1-ab")]
    #[case("café", "cafe")]
    #[case("naïve", "naive")]
    #[case("résumé", "RESUME")]
    #[case("straße", "STRASSE")]
    #[case("straße", "strasse")]
    fn base_letter_or_accent_differences_are_not_exact(
        #[case] primary: &str,
        #[case] resolved: &str,
    ) {
        assert!(!is_exact_match(primary, Some(resolved)));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    fn absent_resolved_key_is_never_exact(#[case] resolved: Option<&str>) {
        assert!(!is_exact_match("v1-abc", resolved));
    }

    #[rstest]
    fn comparison_is_symmetric() {
        let pairs = [("v1-ABC", "v1-abc"), ("Ünïcode", "ünïCODE"), ("a", "b")];
        for (left, right) in pairs {
            assert_eq!(
                is_exact_match(left, Some(right)),
                is_exact_match(right, Some(left)),
                "asymmetric result for {left} / {right}"
            );
        }
    }
}
