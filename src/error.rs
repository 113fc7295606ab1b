//! The crate-wide error type.
//!
//! Structural failures (missing projects, resources, bad paths, I/O) all
//! surface as [`Error`]. Name lookups never fail this way: they answer
//! [`NameEnvironmentAnswer::NotFound`](crate::env::NameEnvironmentAnswer::NotFound).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Project already exists: {0}")]
    ProjectExists(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceExists(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Invalid workspace path: {0}")]
    InvalidPath(String),

    #[error("Unknown classpath variable: {0}")]
    UnknownVariable(String),

    #[error("Archive not found: {0}")]
    ArchiveNotFound(String),

    #[error("Java element not found: {0}")]
    ElementNotFound(String),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    #[error("Syntax error in {path}: {message}")]
    Syntax { path: String, message: String },

    #[error("Invalid workspace manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
