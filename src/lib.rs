// Memoized entity lookups against the tracking service
pub mod entity_cache;

// Compute the next version label from the existing ones
pub mod calculator;

// logger setup for programs using this crate
pub mod logging;

// data shared across the crate
pub mod models;

// Extract the version number out of a label
pub mod parser;

// Orchestrate task lookup, version listing and version creation
pub mod resolver;

// Seam to the production tracking service
pub mod source;

pub use calculator::compute_next;
pub use entity_cache::{CachePolicy, EntityCache};
pub use models::context::ProjectContext;
pub use models::resolution::ResolutionResult;
pub use resolver::{ResolverError, VersionResolver};
pub use source::{MetadataSource, SourceError};
