//! Attachment model

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::uuid_id;
use super::note::NoteId;
use crate::error::{Error, Result};

uuid_id!(
    /// A unique identifier for an attachment, using UUID v7.
    AttachmentId
);

/// Attachment metadata persisted for a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// Unique attachment identifier.
    pub id: AttachmentId,
    /// Parent note identifier.
    pub note_id: NoteId,
    /// Original file name.
    pub filename: String,
    /// Content MIME type.
    pub mime_type: String,
    /// Attachment size in bytes.
    pub size_bytes: i64,
    /// File location relative to the storage directory.
    pub storage_path: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    /// Create a new attachment metadata record.
    pub fn new(
        id: AttachmentId,
        note_id: NoteId,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: i64,
        storage_path: impl Into<String>,
    ) -> Result<Self> {
        let filename = filename.into().trim().to_string();
        let mime_type = mime_type.into().trim().to_string();
        let storage_path = storage_path.into().trim().to_string();

        if filename.is_empty() {
            return Err(Error::InvalidInput(
                "Attachment filename cannot be empty".to_string(),
            ));
        }
        if mime_type.is_empty() {
            return Err(Error::InvalidInput(
                "Attachment mime_type cannot be empty".to_string(),
            ));
        }
        if storage_path.is_empty() {
            return Err(Error::InvalidInput(
                "Attachment storage_path cannot be empty".to_string(),
            ));
        }
        if size_bytes < 0 {
            return Err(Error::InvalidInput(
                "Attachment size_bytes cannot be negative".to_string(),
            ));
        }

        Ok(Self {
            id,
            note_id,
            filename,
            mime_type,
            size_bytes,
            storage_path,
            created_at: crate::util::now(),
        })
    }
}
