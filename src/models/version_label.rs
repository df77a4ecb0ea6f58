use std::fmt;

/// Name of a published version: `{content}_v{NNN}_{user_tag}[-{suffix}]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionLabel {
    pub content: String,
    pub version: u64,
    pub user_tag: String,
    pub suffix: Option<String>,
}

impl VersionLabel {
    pub fn new(content: &str, version: u64, user_tag: &str) -> Self {
        Self {
            content: content.to_owned(),
            version,
            user_tag: user_tag.to_owned(),
            suffix: None,
        }
    }

    /// Empty suffixes are dropped so the label never ends with a bare `-`.
    pub fn with_suffix(mut self, suffix: Option<&str>) -> Self {
        self.suffix = suffix.filter(|s| !s.is_empty()).map(str::to_owned);
        self
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_v{:03}_{}", self.content, self.version, self.user_tag)?;
        if let Some(suffix) = &self.suffix {
            write!(f, "-{suffix}")?;
        }
        Ok(())
    }
}
