use once_cell::sync::Lazy;
use regex::Regex;

// `_v` followed by at least three digits, anywhere in the label
static EMBEDDED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_v([0-9]{3,})").expect("embedded version pattern is valid"));

// `v` followed by at least three digits, closing the label
static TRAILING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v([0-9]{3,})$").expect("trailing version pattern is valid"));

/// Largest version number a label may carry; its successor must still fit in a `u64`.
pub const MAX_VERSION: u64 = u64::MAX - 1;

/// Extract the version number from a label such as `SEQ010_SH020_comp_v003_ab`
/// or `SEQ010_SH020_compv012`.
///
/// The embedded `_vNNN` form wins over the trailing `vNNN` form when both are present.
/// Returns `None` when neither form matches, or when the digits exceed [`MAX_VERSION`].
pub fn parse(label: &str) -> Option<u64> {
    [&*EMBEDDED, &*TRAILING].into_iter().find_map(|pattern| {
        pattern
            .captures(label)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .filter(|n| *n <= MAX_VERSION)
    })
}
