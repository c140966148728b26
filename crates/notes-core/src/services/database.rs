//! Shared database service wrapper used by request handlers.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::Connection;

use crate::db::{
    AttachmentRepository, CategoryRepository, Database, NoteRepository,
    SqliteAttachmentRepository, SqliteCategoryRepository, SqliteNoteRepository,
    SqliteUserRepository, UserRepository,
};
use crate::models::{
    Attachment, AttachmentId, Category, CategoryId, Note, NoteDraft, NoteFilter, NoteId,
    SearchScope, User, UserId,
};
use crate::{Error, Result};

/// One page of an owner's notes plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePage {
    pub notes: Vec<Note>,
    pub total: usize,
}

/// Thread-safe service for DB and repository operations.
///
/// A single connection sits behind a mutex. Every call runs on tokio's
/// blocking pool, so `SQLite` I/O never stalls the async workers.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    ///
    /// `:memory:` opens a private in-memory database.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if db_path.as_os_str() == ":memory:" {
            return Self::open_in_memory().await;
        }

        tracing::info!("Opening database at {}", db_path.display());
        let db = run_blocking(move || {
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Database::open(&db_path)
        })
        .await?;
        Ok(Self::from_database(db))
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = run_blocking(Database::open_in_memory).await?;
        Ok(Self::from_database(db))
    }

    fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            // Writes are single statements or transactions, so a poisoned lock is reusable.
            let db = db.lock().unwrap_or_else(PoisonError::into_inner);
            f(db.connection())
        })
        .await
    }

    /// Persist a new user.
    pub async fn create_user(&self, user: &User) -> Result<()> {
        let user = user.clone();
        self.with_connection(move |conn| SqliteUserRepository::new(conn).create(&user))
            .await
    }

    /// Look up a user by exact email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        self.with_connection(move |conn| SqliteUserRepository::new(conn).find_by_email(&email))
            .await
    }

    /// List a page of notes with the total match count.
    pub async fn list_notes(
        &self,
        owner: &UserId,
        filter: &NoteFilter,
        limit: usize,
        offset: usize,
    ) -> Result<NotePage> {
        let owner = *owner;
        let filter = filter.clone();
        self.with_connection(move |conn| {
            let repo = SqliteNoteRepository::new(conn);
            Ok(NotePage {
                notes: repo.list(&owner, &filter, limit, offset)?,
                total: repo.count(&owner, &filter)?,
            })
        })
        .await
    }

    /// Fetch a note by id.
    pub async fn get_note(&self, owner: &UserId, id: &NoteId) -> Result<Option<Note>> {
        let (owner, id) = (*owner, *id);
        self.with_connection(move |conn| SqliteNoteRepository::new(conn).get(&owner, &id))
            .await
    }

    /// Validate and create a note.
    pub async fn create_note(&self, owner: &UserId, draft: NoteDraft) -> Result<Note> {
        let note = Note::from_draft(*owner, draft)?;
        self.with_connection(move |conn| {
            SqliteNoteRepository::new(conn).create(&note)?;
            Ok(note)
        })
        .await
    }

    /// Replace a note's editable fields.
    pub async fn update_note(
        &self,
        owner: &UserId,
        id: &NoteId,
        draft: &NoteDraft,
    ) -> Result<Note> {
        let (owner, id, draft) = (*owner, *id, draft.clone());
        self.with_connection(move |conn| {
            SqliteNoteRepository::new(conn).update(&owner, &id, &draft)
        })
        .await
    }

    /// Archive or unarchive a note.
    pub async fn set_note_archived(
        &self,
        owner: &UserId,
        id: &NoteId,
        archived: bool,
    ) -> Result<Note> {
        let (owner, id) = (*owner, *id);
        self.with_connection(move |conn| {
            SqliteNoteRepository::new(conn).set_archived(&owner, &id, archived)
        })
        .await
    }

    /// Soft-delete a note.
    pub async fn delete_note(&self, owner: &UserId, id: &NoteId) -> Result<()> {
        let (owner, id) = (*owner, *id);
        self.with_connection(move |conn| SqliteNoteRepository::new(conn).delete(&owner, &id))
            .await
    }

    /// Soft-delete several notes, returning the ids actually deleted.
    pub async fn delete_notes(&self, owner: &UserId, ids: &[NoteId]) -> Result<Vec<NoteId>> {
        let (owner, ids) = (*owner, ids.to_vec());
        self.with_connection(move |conn| {
            SqliteNoteRepository::new(conn).delete_many(&owner, &ids)
        })
        .await
    }

    /// Search notes by substring.
    pub async fn search_notes(
        &self,
        owner: &UserId,
        query: &str,
        scope: SearchScope,
        limit: usize,
    ) -> Result<Vec<Note>> {
        let (owner, query) = (*owner, query.to_string());
        self.with_connection(move |conn| {
            SqliteNoteRepository::new(conn).search(&owner, &query, scope, limit)
        })
        .await
    }

    /// Most recently updated notes and categories, read under a single lock.
    pub async fn recent_changes(
        &self,
        owner: &UserId,
        limit: usize,
    ) -> Result<(Vec<Note>, Vec<Category>)> {
        let owner = *owner;
        self.with_connection(move |conn| {
            let notes = SqliteNoteRepository::new(conn).recently_updated(&owner, limit)?;
            let categories = SqliteCategoryRepository::new(conn).recently_updated(&owner, limit)?;
            Ok((notes, categories))
        })
        .await
    }

    /// Persist notes without validation, all or nothing.
    pub async fn import_notes(&self, notes: &[Note]) -> Result<()> {
        let notes = notes.to_vec();
        self.with_connection(move |conn| SqliteNoteRepository::new(conn).create_many(&notes))
            .await
    }

    /// List an owner's categories.
    pub async fn list_categories(&self, owner: &UserId) -> Result<Vec<Category>> {
        let owner = *owner;
        self.with_connection(move |conn| SqliteCategoryRepository::new(conn).list(&owner))
            .await
    }

    /// Validate and create a category.
    pub async fn create_category(
        &self,
        owner: &UserId,
        name: &str,
        color: Option<String>,
    ) -> Result<Category> {
        let category = Category::new(*owner, name, color)?;
        self.with_connection(move |conn| {
            SqliteCategoryRepository::new(conn).create(&category)?;
            Ok(category)
        })
        .await
    }

    /// Rename and/or recolor a category.
    pub async fn update_category(
        &self,
        owner: &UserId,
        id: &CategoryId,
        name: &str,
        color: Option<&str>,
    ) -> Result<Category> {
        let (owner, id) = (*owner, *id);
        let (name, color) = (name.to_string(), color.map(str::to_string));
        self.with_connection(move |conn| {
            SqliteCategoryRepository::new(conn).update(&owner, &id, &name, color.as_deref())
        })
        .await
    }

    /// Permanently delete a category.
    pub async fn delete_category(&self, owner: &UserId, id: &CategoryId) -> Result<()> {
        let (owner, id) = (*owner, *id);
        self.with_connection(move |conn| SqliteCategoryRepository::new(conn).delete(&owner, &id))
            .await
    }

    /// Persist attachment metadata for a note.
    pub async fn create_attachment(&self, attachment: &Attachment) -> Result<()> {
        let attachment = attachment.clone();
        self.with_connection(move |conn| SqliteAttachmentRepository::new(conn).create(&attachment))
            .await
    }

    /// Fetch attachment metadata reachable through one of the owner's notes.
    pub async fn get_attachment(
        &self,
        owner: &UserId,
        id: &AttachmentId,
    ) -> Result<Option<Attachment>> {
        let (owner, id) = (*owner, *id);
        self.with_connection(move |conn| {
            SqliteAttachmentRepository::new(conn).get_for_owner(&owner, &id)
        })
        .await
    }

    /// Remove attachment metadata.
    pub async fn delete_attachment(&self, id: &AttachmentId) -> Result<()> {
        let id = *id;
        self.with_connection(move |conn| SqliteAttachmentRepository::new(conn).delete(&id))
            .await
    }
}

/// Run blocking store work on tokio's blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|error| Error::Task(error.to_string()))?
}
