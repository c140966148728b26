//! Error types for notes-core

use std::fmt;

use thiserror::Error;

/// Result type alias using notes-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Kind of record an owner-scoped lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Note,
    Category,
    Attachment,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "User",
            Self::Note => "Note",
            Self::Category => "Category",
            Self::Attachment => "Attachment",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in notes-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Owner-scoped lookup miss
    #[error("{0} not found: {1}")]
    NotFound(Resource, String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Email uniqueness violation on user creation
    #[error("A user with this email already exists")]
    DuplicateEmail,

    /// A blocking store task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn not_found(resource: Resource, id: impl fmt::Display) -> Self {
        Self::NotFound(resource, id.to_string())
    }
}
