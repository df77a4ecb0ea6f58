use std::path::{Path, PathBuf};

/// Optional payload attached to a new version record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRequest {
    pub thumbnail: Option<PathBuf>,
    /// stored under `sg_path_to_geometry`
    pub publish_path: Option<String>,
    pub first_frame: Option<i64>,
    pub last_frame: Option<i64>,
    pub suffix: Option<String>,
}

impl VersionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thumbnail(mut self, path: impl AsRef<Path>) -> Self {
        self.thumbnail = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn publish_path(mut self, path: impl Into<String>) -> Self {
        self.publish_path = Some(path.into());
        self
    }

    pub fn frame_range(mut self, first: i64, last: i64) -> Self {
        self.first_frame = Some(first);
        self.last_frame = Some(last);
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }
}
