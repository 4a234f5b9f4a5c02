//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::{AudioRef, LessonId};
use storage::sqlite::SqliteInitError;

/// Errors emitted while loading a `StaticCatalog`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("cannot read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("lesson {0} is defined twice")]
    DuplicateLesson(LessonId),
}

/// Errors reported by an `AudioPlayer`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AudioError {
    #[error("audio resource not found: {0}")]
    Missing(AudioRef),
    #[error("audio device error: {0}")]
    Device(String),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error("invalid course configuration: {0}")]
    Course(#[from] course_core::Error),
}
