use crate::models::resolution::ResolutionResult;
use crate::models::version_label::VersionLabel;
use crate::parser;
use log::warn;

/// Work out the label for the next version of `content_base` from the labels already published.
///
/// The next number is one past the highest parsable version, or 1 if nothing parses.
/// Labels without a version number are logged and skipped.
///
/// # Examples
/// ```
/// use prodtrack::compute_next;
/// let result = compute_next(&["X_v001_ab", "X_v002_ab"], "X", "ab", None);
/// assert_eq!(result.next_label, "X_v003_ab");
/// ```
pub fn compute_next<L: AsRef<str>>(
    labels: &[L],
    content_base: &str,
    user_tag: &str,
    suffix: Option<&str>,
) -> ResolutionResult {
    let mut skipped = Vec::new();
    let mut highest: Option<u64> = None;

    for label in labels {
        let label = label.as_ref();
        match parser::parse(label) {
            Some(number) => highest = highest.max(Some(number)),
            None => {
                warn!("Could not parse version number from: {label}");
                skipped.push(label.to_owned());
            }
        }
    }

    if highest.is_none() && !labels.is_empty() {
        warn!("Found versions but couldn't parse version numbers. Defaulting to v001.");
    }

    // parse never yields more than MAX_VERSION, so the successor fits
    let next_version = highest.map_or(1, |n| n + 1);
    let next_label = VersionLabel::new(content_base, next_version, user_tag)
        .with_suffix(suffix)
        .to_string();

    let existing_labels: Vec<String> = labels.iter().map(|l| l.as_ref().to_owned()).collect();
    ResolutionResult {
        existing_count: existing_labels.len(),
        existing_labels,
        next_label,
        next_version,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    #[test]
    fn increments_highest() {
        let result = compute_next(&["X_v001_ab", "X_v002_ab"], "X", "ab", None);
        assert_eq!(result.next_label, "X_v003_ab");
        assert_eq!(result.next_version, 3);
        assert_eq!(result.existing_count, 2);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn empty_set_starts_at_one() {
        let result = compute_next(NONE, "X", "ab", Some("for_review"));
        assert_eq!(result.next_label, "X_v001_ab-for_review");
        assert_eq!(result.next_version, 1);
        assert_eq!(result.existing_count, 0);
    }

    #[test]
    fn unordered_input_uses_max() {
        let labels = ["X_v004_cd", "X_v012_ab", "Xv007"];
        let result = compute_next(&labels, "X", "ab", None);
        assert_eq!(result.next_version, 13);
        assert_eq!(result.next_label, "X_v013_ab");
    }

    #[test]
    fn nothing_parses() {
        let labels = ["draft", "final_final", "X_v1_ab"];
        let result = compute_next(&labels, "X", "ab", None);
        assert_eq!(result.next_version, 1);
        assert_eq!(result.next_label, "X_v001_ab");
        assert_eq!(result.skipped, labels.to_vec());
        assert_eq!(result.existing_count, 3);
    }

    #[test]
    fn malformed_labels_do_not_stop_processing() {
        let labels = vec![
            "X_v002_ab".to_owned(),
            "garbage".to_owned(),
            "X_v005_ab".to_owned(),
        ];
        let result = compute_next(&labels, "X", "ab", None);
        assert_eq!(result.next_version, 6);
        assert_eq!(result.skipped, vec!["garbage".to_owned()]);
        assert_eq!(result.existing_labels, labels);
    }

    #[test]
    fn next_is_strictly_greater_than_every_parsed() {
        let sets: &[&[&str]] = &[
            &["A_v001_x"],
            &["A_v999_x", "A_v100_x"],
            &["Av010", "A_v009_x", "nope"],
            &["A_v1000_x", "A_v0999_x"],
        ];
        for labels in sets {
            let result = compute_next(*labels, "A", "x", None);
            let max = labels.iter().filter_map(|l| parser::parse(l)).max().unwrap();
            assert_eq!(result.next_version, max + 1, "labels: {labels:?}");
        }
    }

    #[test]
    fn grows_past_three_digits() {
        let result = compute_next(&["A_v999_x"], "A", "x", None);
        assert_eq!(result.next_label, "A_v1000_x");
    }

    #[test]
    fn grows_past_u32() {
        let result = compute_next(&["X_v4294967295_ab"], "X", "ab", None);
        assert_eq!(result.next_version, 4_294_967_296);
        assert_eq!(result.next_label, "X_v4294967296_ab");
    }

    #[test]
    fn largest_version_still_has_a_successor() {
        let result = compute_next(&["X_v18446744073709551614_ab"], "X", "ab", None);
        assert_eq!(result.next_version, u64::MAX);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn version_without_successor_is_skipped() {
        let labels = ["X_v002_ab", "X_v18446744073709551615_ab"];
        let result = compute_next(&labels, "X", "ab", None);
        assert_eq!(result.next_label, "X_v003_ab");
        assert_eq!(result.skipped, vec!["X_v18446744073709551615_ab"]);
    }

    #[test]
    fn empty_suffix_is_ignored() {
        let result = compute_next(&["A_v001_x"], "A", "x", Some(""));
        assert_eq!(result.next_label, "A_v002_x");
    }
}
