use super::{MetadataSource, SourceError};
use crate::models::entity::{EntityRef, Record};
use crate::models::filter::{Filter, Order};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Thumbnail accepted by a [`MemorySource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub entity: EntityRef,
    pub path: PathBuf,
    pub display_name: Option<String>,
}

impl Thumbnail {
    fn new(entity_type: &str, entity_id: i64, path: &Path, display_name: Option<&str>) -> Self {
        Self {
            entity: EntityRef::new(entity_type, entity_id),
            path: path.to_path_buf(),
            display_name: display_name.map(str::to_owned),
        }
    }
}

/// File attached through [`MetadataSource::upload_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: i64,
    pub entity: EntityRef,
    pub path: PathBuf,
    pub field_name: Option<String>,
    pub display_name: Option<String>,
    pub tags: Vec<String>,
}

/// Tracking service held entirely in memory.
///
/// Used offline against a json snapshot of the form `{"Shot": [{..}], "Version": [{..}]}`,
/// and in tests where the number of lookups reaching the service matters.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: RefCell<HashMap<String, Vec<Record>>>,
    lookups: Cell<usize>,
    offline: Cell<bool>,
    reject_uploads: Cell<bool>,
    thumbnails: RefCell<Vec<Thumbnail>>,
    filmstrips: RefCell<Vec<Thumbnail>>,
    attachments: RefCell<Vec<Attachment>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(content: &str) -> Result<Self, SourceError> {
        let tables: HashMap<String, Vec<Record>> = serde_json::from_str(content)
            .map_err(|e| SourceError::Rejected(format!("Invalid snapshot: {e}")))?;
        let source = Self::new();
        for (entity_type, records) in tables {
            for record in records {
                source.insert(&entity_type, record);
            }
        }
        Ok(source)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Store a record, tagging it with its entity type and assigning an id if it has none.
    pub fn insert(&self, entity_type: &str, mut record: Record) -> i64 {
        let id = match record.get("id").and_then(Value::as_i64) {
            Some(id) => id,
            None => self.next_id(),
        };
        record.insert("id".to_owned(), Value::from(id));
        record.insert("type".to_owned(), Value::from(entity_type));
        self.tables
            .borrow_mut()
            .entry(entity_type.to_owned())
            .or_default()
            .push(record);
        id
    }

    /// Number of `find` and `find_one` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }

    /// While offline every call fails with [`SourceError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn set_reject_uploads(&self, reject: bool) {
        self.reject_uploads.set(reject);
    }

    pub fn thumbnails(&self) -> Vec<Thumbnail> {
        self.thumbnails.borrow().clone()
    }

    pub fn filmstrips(&self) -> Vec<Thumbnail> {
        self.filmstrips.borrow().clone()
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments.borrow().clone()
    }

    pub fn records(&self, entity_type: &str) -> Vec<Record> {
        self.tables
            .borrow()
            .get(entity_type)
            .cloned()
            .unwrap_or_default()
    }

    fn next_id(&self) -> i64 {
        self.tables
            .borrow()
            .values()
            .flatten()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1
    }

    fn check_online(&self) -> Result<(), SourceError> {
        if self.offline.get() {
            return Err(SourceError::Unavailable("memory source is offline".to_owned()));
        }
        Ok(())
    }

    // every upload needs the service up, the file on disk and an existing target entity
    fn check_upload(
        &self,
        entity_type: &str,
        entity_id: i64,
        path: &Path,
    ) -> Result<(), SourceError> {
        self.check_online()?;
        if self.reject_uploads.get() {
            return Err(SourceError::Rejected(format!(
                "upload refused for {entity_type} {entity_id}"
            )));
        }
        if !path.is_file() {
            return Err(SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        let known = self.tables.borrow().get(entity_type).is_some_and(|records| {
            records
                .iter()
                .any(|r| r.get("id").and_then(Value::as_i64) == Some(entity_id))
        });
        if !known {
            return Err(SourceError::Rejected(format!("{entity_type} {entity_id} not found")));
        }
        Ok(())
    }

    fn set_field(
        &self,
        entity_type: &str,
        entity_id: i64,
        field: &str,
        value: Value,
    ) -> Result<(), SourceError> {
        let mut tables = self.tables.borrow_mut();
        let record = tables
            .get_mut(entity_type)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|r| r.get("id").and_then(Value::as_i64) == Some(entity_id))
            })
            .ok_or_else(|| SourceError::Rejected(format!("{entity_type} {entity_id} not found")))?;
        record.insert(field.to_owned(), value);
        Ok(())
    }

    // the service always answers with type and id, and null for requested fields it does not have
    fn project(record: &Record, fields: &[&str]) -> Record {
        let mut out = Record::new();
        for key in ["type", "id"] {
            if let Some(value) = record.get(key) {
                out.insert(key.to_owned(), value.clone());
            }
        }
        for field in fields {
            let value = record.get(*field).cloned().unwrap_or(Value::Null);
            out.insert((*field).to_owned(), value);
        }
        out
    }

    fn matching(&self, entity_type: &str, filters: &[Filter]) -> Vec<Record> {
        self.tables
            .borrow()
            .get(entity_type)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| filters.iter().all(|f| f.matches(r)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl MetadataSource for MemorySource {
    fn find_one(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
    ) -> Result<Option<Record>, SourceError> {
        self.check_online()?;
        self.lookups.set(self.lookups.get() + 1);
        Ok(self
            .matching(entity_type, filters)
            .first()
            .map(|r| Self::project(r, fields)))
    }

    fn find(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
        order: &[Order],
    ) -> Result<Vec<Record>, SourceError> {
        self.check_online()?;
        self.lookups.set(self.lookups.get() + 1);
        let mut records = self.matching(entity_type, filters);
        records.sort_by(|a, b| {
            order
                .iter()
                .map(|o| o.compare(a, b))
                .find(|ord| ord.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(records.iter().map(|r| Self::project(r, fields)).collect())
    }

    fn create(&self, entity_type: &str, data: Record) -> Result<Record, SourceError> {
        self.check_online()?;
        let mut record = data;
        record.remove("id");
        let id = self.insert(entity_type, record);
        self.tables
            .borrow()
            .get(entity_type)
            .and_then(|records| {
                records
                    .iter()
                    .rev()
                    .find(|r| r.get("id").and_then(Value::as_i64) == Some(id))
                    .cloned()
            })
            .ok_or_else(|| SourceError::Rejected(format!("{entity_type} {id} was not stored")))
    }

    fn upload_thumbnail(
        &self,
        entity_type: &str,
        entity_id: i64,
        path: &Path,
        display_name: Option<&str>,
    ) -> Result<(), SourceError> {
        self.check_upload(entity_type, entity_id, path)?;
        self.set_field(entity_type, entity_id, "image", image_value(path))?;
        self.thumbnails
            .borrow_mut()
            .push(Thumbnail::new(entity_type, entity_id, path, display_name));
        Ok(())
    }

    fn upload_filmstrip_thumbnail(
        &self,
        entity_type: &str,
        entity_id: i64,
        path: &Path,
        display_name: Option<&str>,
    ) -> Result<(), SourceError> {
        self.check_upload(entity_type, entity_id, path)?;
        self.set_field(entity_type, entity_id, "filmstrip_image", image_value(path))?;
        self.filmstrips
            .borrow_mut()
            .push(Thumbnail::new(entity_type, entity_id, path, display_name));
        Ok(())
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
        self.check_upload(entity_type, entity_id, path)?;

        let name = display_name
            .map(str::to_owned)
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_default();
        let tags: Vec<String> = tag_list
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let mut record = Record::new();
        record.insert("name".to_owned(), Value::from(name.as_str()));
        record.insert("attachment_links".to_owned(), EntityRef::new(entity_type, entity_id).into());
        record.insert("tag_list".to_owned(), Value::from(tags.clone()));
        let id = self.insert("Attachment", record);

        if let Some(field) = field_name {
            let mut link = EntityRef::new("Attachment", id).to_value();
            if let Value::Object(map) = &mut link {
                map.insert("name".to_owned(), Value::from(name));
            }
            self.set_field(entity_type, entity_id, field, link)?;
        }

        self.attachments.borrow_mut().push(Attachment {
            id,
            entity: EntityRef::new(entity_type, entity_id),
            path: path.to_path_buf(),
            field_name: field_name.map(str::to_owned),
            display_name: display_name.map(str::to_owned),
            tags,
        });
        Ok(id)
    }
}

fn image_value(path: &Path) -> Value {
    Value::from(path.to_string_lossy().into_owned())
}
