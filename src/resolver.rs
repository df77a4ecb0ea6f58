/*
    The resolver answers "what is the next version of the unit of work I'm in?"
    - The unit of work is the shot or asset plus task named by the project context.
    - Parent entities are looked up once and kept in the entity cache.
    - Versions are listed newest first and the next label is computed from their codes.
    - Creating a version reuses the same lookup, then attaches the thumbnail if one exists on disk.
*/
use crate::calculator::compute_next;
use crate::entity_cache::{CachePolicy, EntityCache};
use crate::models::context::{ContextError, ProjectContext};
use crate::models::entity::{EntityRef, Record};
use crate::models::filter::{Filter, Order};
use crate::models::resolution::ResolutionResult;
use crate::models::version_request::VersionRequest;
use crate::source::{MetadataSource, SourceError};
use log::{error, info, warn};
use serde_json::Value;
use thiserror::Error;

const TASK_FIELDS: [&str; 3] = ["id", "content", "entity"];
const REFETCH_FIELDS: [&str; 4] = ["code", "id", "image", "sg_my_project_path"];

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Cannot resolve version: {0}")]
    Context(#[from] ContextError),
    #[error("{0} does not exist on the tracking service")]
    ParentNotFound(EntityRef),
    #[error("No Task found with content '{content}' for {parent} in Project ID {project_id}")]
    TaskNotFound {
        content: String,
        parent: EntityRef,
        project_id: i64,
    },
    #[error("Tracking service error: {0}")]
    Source(#[from] SourceError),
    #[error("Created {0} record carries no id")]
    MissingId(String),
}

pub struct VersionResolver<S> {
    source: S,
    context: ProjectContext,
    cache: EntityCache,
}

impl<S: MetadataSource> VersionResolver<S> {
    pub fn new(source: S, context: ProjectContext) -> Self {
        Self::with_cache_policy(source, context, CachePolicy::default())
    }

    pub fn with_cache_policy(source: S, context: ProjectContext, policy: CachePolicy) -> Self {
        Self {
            source,
            context,
            cache: EntityCache::new(policy),
        }
    }

    pub fn context(&self) -> &ProjectContext {
        &self.context
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    /// Cached entity lookup. See [`EntityCache::get`] for the field list caveat.
    pub fn entity(
        &mut self,
        entity_type: &str,
        entity_id: i64,
        fields: Option<&[&str]>,
    ) -> Result<&Record, ResolverError> {
        Ok(self.cache.get(&self.source, entity_type, entity_id, fields)?)
    }

    // The parent must be named by the context and known to the service.
    fn parent(&mut self) -> Result<EntityRef, ResolverError> {
        let parent = self.context.parent()?;
        let record = self.entity(&parent.entity_type, parent.id, None)?;
        if record.is_empty() {
            return Err(ResolverError::ParentNotFound(parent));
        }
        Ok(parent)
    }

    fn scope_filters(&self, parent: &EntityRef) -> Vec<Filter> {
        vec![
            Filter::is("project", self.context.project_ref()),
            Filter::is("entity", parent.clone()),
        ]
    }

    fn lookup_task(&self, parent: &EntityRef) -> Result<Record, ResolverError> {
        let content = self.context.content_base();
        let mut filters = self.scope_filters(parent);
        filters.push(Filter::is("content", content.as_str()));

        let task = self
            .source
            .find_one("Task", &filters, &TASK_FIELDS)?
            .ok_or_else(|| ResolverError::TaskNotFound {
                content: content.clone(),
                parent: parent.clone(),
                project_id: self.context.project.id,
            })?;
        info!(
            "Found Task: {} (ID: {}) linked to {}",
            content,
            task.get("id").unwrap_or(&Value::Null),
            linked_entity(&task, parent)
        );
        Ok(task)
    }

    /// The task this context's versions hang off.
    pub fn find_task(&mut self) -> Result<Record, ResolverError> {
        let parent = self.parent()?;
        self.lookup_task(&parent)
    }

    fn list_labels(&self, parent: &EntityRef, task: &Record) -> Result<Vec<String>, ResolverError> {
        let mut filters = self.scope_filters(parent);
        filters.push(Filter::is("sg_task", Value::Object(task.clone())));

        let versions = self.source.find(
            "Version",
            &filters,
            &["code"],
            &[Order::desc("created_at")],
        )?;

        let labels: Vec<String> = versions
            .iter()
            .filter_map(|version| match version.get("code").and_then(Value::as_str) {
                Some(code) => Some(code.to_owned()),
                None => {
                    warn!(
                        "Version {} has no code, ignoring it",
                        version.get("id").unwrap_or(&Value::Null)
                    );
                    None
                }
            })
            .collect();

        if labels.is_empty() {
            info!(
                "No Versions found linked to Task '{}' for {parent}",
                self.context.content_base()
            );
        } else {
            info!(
                "Found {} Versions linked to Task '{}'",
                labels.len(),
                self.context.content_base()
            );
        }
        Ok(labels)
    }

    /// Codes of every version published for the unit of work, newest first.
    pub fn existing_labels(&mut self) -> Result<Vec<String>, ResolverError> {
        let parent = self.parent()?;
        let task = self.lookup_task(&parent)?;
        self.list_labels(&parent, &task)
    }

    /// Compute the label the next published version should carry.
    pub fn resolve_next(
        &mut self,
        suffix: Option<&str>,
    ) -> Result<ResolutionResult, ResolverError> {
        let parent = self.parent()?;
        let task = self.lookup_task(&parent)?;
        self.resolve_with(&parent, &task, suffix)
    }

    fn resolve_with(
        &self,
        parent: &EntityRef,
        task: &Record,
        suffix: Option<&str>,
    ) -> Result<ResolutionResult, ResolverError> {
        let labels = self.list_labels(parent, task)?;
        let result = compute_next(
            &labels,
            &self.context.content_base(),
            &self.context.user_abbr,
            suffix,
        );
        info!("The new version name is: {}", result.next_label);
        Ok(result)
    }

    /// Publish a new version record under the next label, then attach its thumbnail.
    ///
    /// A failed thumbnail upload is logged and does not fail the call.
    /// Returns the re-fetched record, or the record as created when the re-fetch finds nothing.
    pub fn create_version(&mut self, request: &VersionRequest) -> Result<Record, ResolverError> {
        let parent = self.parent()?;
        let task = self.lookup_task(&parent)?;
        let resolution = self.resolve_with(&parent, &task, request.suffix.as_deref())?;

        let data = self.version_payload(&parent, &task, &resolution.next_label, request);
        info!("Creating Version '{}'...", resolution.next_label);
        let created = self.source.create("Version", data)?;
        let id = created
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| ResolverError::MissingId("Version".to_owned()))?;
        info!("Successfully created Version ID: {id}");

        if let Some(thumbnail) = request.thumbnail.as_deref().filter(|p| p.exists()) {
            let display_name = thumbnail.file_stem().map(|s| s.to_string_lossy());
            info!("Uploading thumbnail '{}' to Version ID {id}...", thumbnail.display());
            match self
                .source
                .upload_thumbnail("Version", id, thumbnail, display_name.as_deref())
            {
                Ok(()) => info!("Thumbnail upload complete."),
                Err(e) => error!("Failed to upload thumbnail: {e}"),
            }
        }

        let updated = self
            .source
            .find_one("Version", &[Filter::is("id", id)], &REFETCH_FIELDS)?;
        match updated {
            Some(record) => Ok(record),
            None => {
                warn!("Could not re-fetch Version {id} after creation, returning it as created");
                Ok(created)
            }
        }
    }

    fn version_payload(
        &self,
        parent: &EntityRef,
        task: &Record,
        code: &str,
        request: &VersionRequest,
    ) -> Record {
        let project = &self.context.project;
        let mut project_ref = Record::new();
        project_ref.insert("type".to_owned(), Value::from("Project"));
        project_ref.insert("name".to_owned(), Value::from(project.name.as_str()));
        project_ref.insert("id".to_owned(), Value::from(project.id));

        let mut data = Record::new();
        data.insert("project".to_owned(), Value::Object(project_ref));
        data.insert("code".to_owned(), Value::from(code));
        data.insert("sg_status_list".to_owned(), Value::from("ip"));
        data.insert("sg_task".to_owned(), Value::Object(task.clone()));
        data.insert(
            "sg_path_to_geometry".to_owned(),
            Value::from(request.publish_path.clone()),
        );
        data.insert("sg_first_frame".to_owned(), Value::from(request.first_frame));
        data.insert("sg_last_frame".to_owned(), Value::from(request.last_frame));
        data.insert("entity".to_owned(), parent.to_value());
        data
    }
}

// entity the task itself points at, falling back to the parent it was searched under
fn linked_entity(task: &Record, parent: &EntityRef) -> EntityRef {
    task.get("entity")
        .and_then(Value::as_object)
        .and_then(EntityRef::from_record)
        .unwrap_or_else(|| parent.clone())
}
