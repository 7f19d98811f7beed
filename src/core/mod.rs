//! Core module - record identity, storage, projects and configuration

pub mod config;
pub mod entity;
pub mod identity;
pub mod project;
pub mod store;

pub use config::Config;
pub use entity::{Entity, ReviewStatus};
pub use identity::{RecordId, RecordIdError};
pub use project::{Project, ProjectError};
pub use store::{FileStore, MemoryStore, RecordStore, StoreError};
