pub mod context;
pub mod entity;
pub mod filter;
pub mod resolution;
pub mod version_label;
pub mod version_request;
