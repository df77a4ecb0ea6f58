use serde::{Deserialize, Serialize};

/// Outcome of a next-version lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Labels already published for the unit of work, in the order the source returned them.
    pub existing_labels: Vec<String>,
    /// Fully formatted label for the next version.
    pub next_label: String,
    pub existing_count: usize,
    /// Numeric component of `next_label`.
    pub next_version: u64,
    /// Labels that carried no recognizable version number.
    pub skipped: Vec<String>,
}
