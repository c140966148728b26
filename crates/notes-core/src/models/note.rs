//! Note model

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::uuid_id;
use super::user::UserId;
use crate::error::{Error, Result};

/// Maximum title length accepted by the direct note endpoints
pub const NOTE_TITLE_MAX_CHARS: usize = 200;

uuid_id!(
    /// A unique identifier for a note, using UUID v7 (time-sortable)
    NoteId
);

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Owning user; every query is scoped by it
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    /// Free-form category label
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete marker; deleted notes are invisible to all queries
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Create a new, unarchived note owned by `user_id`
    #[must_use]
    pub fn new(user_id: UserId, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = crate::util::now();
        Self {
            id: NoteId::new(),
            user_id,
            title: title.into(),
            content: content.into(),
            category: None,
            tags: Vec::new(),
            archived: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Create a note from validated user-facing fields
    pub fn from_draft(user_id: UserId, draft: NoteDraft) -> Result<Self> {
        draft.validate()?;
        let mut note = Self::new(user_id, draft.title, draft.content);
        note.category = draft.category;
        note.tags = draft.tags;
        Ok(note)
    }
}

/// Editable note fields, as submitted to create/update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

impl NoteDraft {
    /// Titles must be non-blank and at most [`NOTE_TITLE_MAX_CHARS`] characters.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("Title cannot be empty".to_string()));
        }
        if self.title.chars().count() > NOTE_TITLE_MAX_CHARS {
            return Err(Error::InvalidInput(format!(
                "Title must be at most {NOTE_TITLE_MAX_CHARS} characters"
            )));
        }
        Ok(())
    }
}

/// Predicate for listing an owner's notes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    /// Case-insensitive substring matched against title or content
    pub search: Option<String>,
    /// List archived notes instead of active ones
    pub archived: bool,
}

/// Which note fields a search matches against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchScope {
    Title,
    Content,
    #[default]
    Both,
}

impl SearchScope {
    /// Parse the `in` query parameter; anything unrecognized searches both fields.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("title") => Self::Title,
            Some("content") => Self::Content,
            _ => Self::Both,
        }
    }
}
