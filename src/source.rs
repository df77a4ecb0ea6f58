use crate::models::entity::Record;
use crate::models::filter::{Filter, Order};
use std::path::Path;
use thiserror::Error;

pub mod memory;

pub use memory::MemorySource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Tracking service unavailable: {0}")]
    Unavailable(String),
    #[error("Tracking service rejected the request: {0}")]
    Rejected(String),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the resolver needs from the production tracking service.
///
/// Implementations perform no retries; errors are handed back to the caller as-is.
pub trait MetadataSource {
    /// First entity of `entity_type` matching every filter, restricted to `fields`.
    fn find_one(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
    ) -> Result<Option<Record>, SourceError>;

    /// All entities of `entity_type` matching every filter, sorted by `order`.
    fn find(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
        order: &[Order],
    ) -> Result<Vec<Record>, SourceError>;

    /// Create a new entity and return it, including its assigned `id`.
    fn create(&self, entity_type: &str, data: Record) -> Result<Record, SourceError>;

    fn upload_thumbnail(
        &self,
        entity_type: &str,
        entity_id: i64,
        path: &Path,
        display_name: Option<&str>,
    ) -> Result<(), SourceError>;

    /// Same as [`MetadataSource::upload_thumbnail`] for the scrubbable filmstrip image.
    fn upload_filmstrip_thumbnail(
        &self,
        entity_type: &str,
        entity_id: i64,
        path: &Path,
        display_name: Option<&str>,
    ) -> Result<(), SourceError>;

    /// Attach a file to an entity and return the id of the new attachment.
    ///
    /// With a `field_name` the attachment is also linked into that field of the entity.
    /// `tag_list` is a comma separated list of tags.
    fn upload_file(
        &self,
        entity_type: &str,
        entity_id: i64,
        path: &Path,
        field_name: Option<&str>,
        display_name: Option<&str>,
        tag_list: Option<&str>,
    ) -> Result<i64, SourceError>;
}

impl<S: MetadataSource + ?Sized> MetadataSource for &S {
    fn find_one(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
    ) -> Result<Option<Record>, SourceError> {
        (**self).find_one(entity_type, filters, fields)
    }

    fn find(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
        order: &[Order],
    ) -> Result<Vec<Record>, SourceError> {
        (**self).find(entity_type, filters, fields, order)
    }

    fn create(&self, entity_type: &str, data: Record) -> Result<Record, SourceError> {
        (**self).create(entity_type, data)
    }

    fn upload_thumbnail(
        &self,
        entity_type: &str,
        entity_id: i64,
        path: &Path,
        display_name: Option<&str>,
    ) -> Result<(), SourceError> {
        (**self).upload_thumbnail(entity_type, entity_id, path, display_name)
    }

    fn upload_filmstrip_thumbnail(
        &self,
        entity_type: &str,
        entity_id: i64,
        path: &Path,
        display_name: Option<&str>,
    ) -> Result<(), SourceError> {
        (**self).upload_filmstrip_thumbnail(entity_type, entity_id, path, display_name)
    }

    fn upload_file(
        &self,
        entity_type: &str,
        entity_id: i64,
        path: &Path,
        field_name: Option<&str>,
        display_name: Option<&str>,
        tag_list: Option<&str>,
    ) -> Result<i64, SourceError> {
        (**self).upload_file(entity_type, entity_id, path, field_name, display_name, tag_list)
    }
}
