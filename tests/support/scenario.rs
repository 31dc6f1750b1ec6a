//! Unwraps `rstest-bdd` world fixtures inside scenario functions.

use color_eyre::eyre::Result;

/// Returns the fixture value, panicking with `label` when construction
/// failed.
pub fn expect_fixture<T>(fixture: Result<T>, label: &str) -> T {
    fixture.unwrap_or_else(|err| panic!("{label} fixture failed: {err:?}"))
}
