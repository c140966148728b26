//! Note repository implementation
//!
//! Every query takes the owner's id and filters on it; soft-deleted rows
//! (`deleted_at IS NOT NULL`) are never returned or modified.

use rusqlite::{params, Connection, OptionalExtension};

use super::row;
use crate::error::{Error, Resource, Result};
use crate::models::{Note, NoteDraft, NoteFilter, NoteId, SearchScope, UserId};
use crate::util::{like_pattern, now, normalize_text_option};

const NOTE_COLUMNS: &str =
    "id, user_id, title, content, category, tags, archived, created_at, updated_at, deleted_at";

/// Trait for owner-scoped note storage operations
pub trait NoteRepository {
    /// Persist a new note
    fn create(&self, note: &Note) -> Result<()>;

    /// Persist several notes in one transaction
    fn create_many(&self, notes: &[Note]) -> Result<()>;

    /// Get a note by ID
    fn get(&self, owner: &UserId, id: &NoteId) -> Result<Option<Note>>;

    /// List notes matching `filter`, most recently updated first
    fn list(&self, owner: &UserId, filter: &NoteFilter, limit: usize, offset: usize)
        -> Result<Vec<Note>>;

    /// Count notes matching `filter`
    fn count(&self, owner: &UserId, filter: &NoteFilter) -> Result<usize>;

    /// Replace a note's editable fields
    fn update(&self, owner: &UserId, id: &NoteId, draft: &NoteDraft) -> Result<Note>;

    /// Set or clear the archived flag
    fn set_archived(&self, owner: &UserId, id: &NoteId, archived: bool) -> Result<Note>;

    /// Soft delete a note
    fn delete(&self, owner: &UserId, id: &NoteId) -> Result<()>;

    /// Soft delete several notes, returning the ids that were deleted
    fn delete_many(&self, owner: &UserId, ids: &[NoteId]) -> Result<Vec<NoteId>>;

    /// Substring search over title and/or content (archived notes included)
    fn search(&self, owner: &UserId, query: &str, scope: SearchScope, limit: usize)
        -> Result<Vec<Note>>;

    /// Most recently updated notes, archived or not
    fn recently_updated(&self, owner: &UserId, limit: usize) -> Result<Vec<Note>>;
}

/// `SQLite` implementation of `NoteRepository`
pub struct SqliteNoteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNoteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn insert(conn: &Connection, note: &Note) -> Result<()> {
        let tags = serde_json::to_string(&note.tags)?;
        conn.execute(
            "INSERT INTO notes (id, user_id, title, content, category, tags, archived, created_at, updated_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                note.id.as_str(),
                note.user_id.as_str(),
                note.title,
                note.content,
                note.category,
                tags,
                note.archived,
                note.created_at.timestamp_millis(),
                note.updated_at.timestamp_millis(),
                note.deleted_at.map(|at| at.timestamp_millis()),
            ],
        )?;
        Ok(())
    }

    fn query_notes(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let notes = stmt
            .query_map(params, Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    fn require(&self, owner: &UserId, id: &NoteId) -> Result<Note> {
        self.get(owner, id)?
            .ok_or_else(|| Error::not_found(Resource::Note, id))
    }

    /// Parse a note from a database row selected with `NOTE_COLUMNS`
    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
        Ok(Note {
            id: row::id(row, 0)?,
            user_id: row::id(row, 1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            category: row.get(4)?,
            tags: row::string_list(row, 5)?,
            archived: row.get(6)?,
            created_at: row::timestamp(row, 7)?,
            updated_at: row::timestamp(row, 8)?,
            deleted_at: row::optional_timestamp(row, 9)?,
        })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create(&self, note: &Note) -> Result<()> {
        Self::insert(self.conn, note)
    }

    fn create_many(&self, notes: &[Note]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for note in notes {
            Self::insert(&tx, note)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get(&self, owner: &UserId, id: &NoteId) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!(
                    "SELECT {NOTE_COLUMNS} FROM notes
                     WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NULL"
                ),
                params![id.as_str(), owner.as_str()],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }

    fn list(
        &self,
        owner: &UserId,
        filter: &NoteFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Note>> {
        let pattern = normalize_text_option(filter.search.clone()).map(|q| like_pattern(&q));
        self.query_notes(
            &format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 WHERE user_id = ?1 AND deleted_at IS NULL AND archived = ?2
                   AND (?3 IS NULL OR fold_case(title) LIKE ?3 ESCAPE '\\' OR fold_case(content) LIKE ?3 ESCAPE '\\')
                 ORDER BY updated_at DESC, rowid DESC
                 LIMIT ?4 OFFSET ?5"
            ),
            params![
                owner.as_str(),
                filter.archived,
                pattern,
                row::sql_int(limit),
                row::sql_int(offset)
            ],
        )
    }

    fn count(&self, owner: &UserId, filter: &NoteFilter) -> Result<usize> {
        let pattern = normalize_text_option(filter.search.clone()).map(|q| like_pattern(&q));
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notes
             WHERE user_id = ?1 AND deleted_at IS NULL AND archived = ?2
               AND (?3 IS NULL OR fold_case(title) LIKE ?3 ESCAPE '\\' OR fold_case(content) LIKE ?3 ESCAPE '\\')",
            params![owner.as_str(), filter.archived, pattern],
            |row| row.get(0),
        )?;
        Ok(row::count(total))
    }

    fn update(&self, owner: &UserId, id: &NoteId, draft: &NoteDraft) -> Result<Note> {
        draft.validate()?;
        let tags = serde_json::to_string(&draft.tags)?;

        let rows = self.conn.execute(
            "UPDATE notes SET title = ?1, content = ?2, category = ?3, tags = ?4, updated_at = ?5
             WHERE id = ?6 AND user_id = ?7 AND deleted_at IS NULL",
            params![
                draft.title,
                draft.content,
                draft.category,
                tags,
                now().timestamp_millis(),
                id.as_str(),
                owner.as_str(),
            ],
        )?;

        if rows == 0 {
            return Err(Error::not_found(Resource::Note, id));
        }
        self.require(owner, id)
    }

    fn set_archived(&self, owner: &UserId, id: &NoteId, archived: bool) -> Result<Note> {
        let rows = self.conn.execute(
            "UPDATE notes SET archived = ?1, updated_at = ?2
             WHERE id = ?3 AND user_id = ?4 AND deleted_at IS NULL",
            params![
                archived,
                now().timestamp_millis(),
                id.as_str(),
                owner.as_str()
            ],
        )?;

        if rows == 0 {
            return Err(Error::not_found(Resource::Note, id));
        }
        self.require(owner, id)
    }

    fn delete(&self, owner: &UserId, id: &NoteId) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE notes SET deleted_at = ?1
             WHERE id = ?2 AND user_id = ?3 AND deleted_at IS NULL",
            params![now().timestamp_millis(), id.as_str(), owner.as_str()],
        )?;

        if rows == 0 {
            return Err(Error::not_found(Resource::Note, id));
        }
        Ok(())
    }

    fn delete_many(&self, owner: &UserId, ids: &[NoteId]) -> Result<Vec<NoteId>> {
        let tx = self.conn.unchecked_transaction()?;
        let deleted_at = now().timestamp_millis();
        let mut deleted = Vec::with_capacity(ids.len());
        {
            let mut stmt = tx.prepare(
                "UPDATE notes SET deleted_at = ?1
                 WHERE id = ?2 AND user_id = ?3 AND deleted_at IS NULL",
            )?;
            for id in ids {
                if stmt.execute(params![deleted_at, id.as_str(), owner.as_str()])? > 0 {
                    deleted.push(*id);
                }
            }
        }
        tx.commit()?;
        Ok(deleted)
    }

    fn search(
        &self,
        owner: &UserId,
        query: &str,
        scope: SearchScope,
        limit: usize,
    ) -> Result<Vec<Note>> {
        let predicate = match scope {
            SearchScope::Title => "fold_case(title) LIKE ?2 ESCAPE '\\'",
            SearchScope::Content => "fold_case(content) LIKE ?2 ESCAPE '\\'",
            SearchScope::Both => "(fold_case(title) LIKE ?2 ESCAPE '\\' OR fold_case(content) LIKE ?2 ESCAPE '\\')",
        };
        self.query_notes(
            &format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 WHERE user_id = ?1 AND deleted_at IS NULL AND {predicate}
                 ORDER BY updated_at DESC, rowid DESC
                 LIMIT ?3"
            ),
            params![owner.as_str(), like_pattern(query), row::sql_int(limit)],
        )
    }

    fn recently_updated(&self, owner: &UserId, limit: usize) -> Result<Vec<Note>> {
        self.query_notes(
            &format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 WHERE user_id = ?1 AND deleted_at IS NULL
                 ORDER BY updated_at DESC, rowid DESC
                 LIMIT ?2"
            ),
            params![owner.as_str(), row::sql_int(limit)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, SqliteUserRepository, UserRepository};
    use crate::models::User;
    use pretty_assertions::assert_eq;

    fn setup() -> (Database, UserId) {
        let db = Database::open_in_memory().unwrap();
        let user = User::new("Owner", "owner@example.com", "hash");
        SqliteUserRepository::new(db.connection())
            .create(&user)
            .unwrap();
        (db, user.id)
    }

    fn add_user(db: &Database, email: &str) -> UserId {
        let user = User::new("Other", email, "hash");
        SqliteUserRepository::new(db.connection())
            .create(&user)
            .unwrap();
        user.id
    }

    fn draft(title: &str, content: &str) -> NoteDraft {
        NoteDraft {
            title: title.to_string(),
            content: content.to_string(),
            ..NoteDraft::default()
        }
    }

    #[test]
    fn test_create_and_get() {
        let (db, owner) = setup();
        let repo = SqliteNoteRepository::new(db.connection());

        let mut note = Note::new(owner, "Hello", "world");
        note.tags = vec!["a".to_string(), "b".to_string()];
        note.category = Some("inbox".to_string());
        repo.create(&note).unwrap();

        let fetched = repo.get(&owner, &note.id).unwrap().unwrap();
        assert_eq!(fetched, note);
    }

    #[test]
    fn test_get_is_owner_scoped() {
        let (db, owner) = setup();
        let other = add_user(&db, "other@example.com");
        let repo = SqliteNoteRepository::new(db.connection());

        let note = Note::new(owner, "Private", "");
        repo.create(&note).unwrap();

        assert!(repo.get(&other, &note.id).unwrap().is_none());
        assert!(repo.delete(&other, &note.id).is_err());
        assert!(repo.update(&other, &note.id, &draft("x", "y")).is_err());
    }

    #[test]
    fn test_list_filters_and_orders() {
        let (db, owner) = setup();
        let repo = SqliteNoteRepository::new(db.connection());

        let first = Note::new(owner, "Shopping", "milk and eggs");
        let second = Note::new(owner, "Work", "quarterly report");
        let mut archived = Note::new(owner, "Old", "milk");
        archived.archived = true;
        for note in [&first, &second, &archived] {
            repo.create(note).unwrap();
        }

        let active = repo.list(&owner, &NoteFilter::default(), 10, 0).unwrap();
        let titles: Vec<_> = active.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Work", "Shopping"]);

        let filter = NoteFilter {
            search: Some("MILK".to_string()),
            archived: false,
        };
        let matched = repo.list(&owner, &filter, 10, 0).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, first.id);
        assert_eq!(repo.count(&owner, &filter).unwrap(), 1);

        let archived_filter = NoteFilter {
            search: None,
            archived: true,
        };
        assert_eq!(repo.count(&owner, &archived_filter).unwrap(), 1);
    }

    #[test]
    fn test_list_pagination() {
        let (db, owner) = setup();
        let repo = SqliteNoteRepository::new(db.connection());

        for i in 0..5 {
            repo.create(&Note::new(owner, format!("Note {i}"), ""))
                .unwrap();
        }

        let page = repo.list(&owner, &NoteFilter::default(), 2, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "Note 2");
        assert_eq!(repo.count(&owner, &NoteFilter::default()).unwrap(), 5);

        let past_end = repo
            .list(&owner, &NoteFilter::default(), 2, usize::MAX)
            .unwrap();
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_update() {
        let (db, owner) = setup();
        let repo = SqliteNoteRepository::new(db.connection());

        let note = Note::new(owner, "Original", "");
        repo.create(&note).unwrap();

        let mut changes = draft("Updated", "body");
        changes.tags = vec!["t".to_string()];
        let updated = repo.update(&owner, &note.id, &changes).unwrap();

        assert_eq!(updated.title, "Updated");
        assert_eq!(updated.content, "body");
        assert_eq!(updated.tags, vec!["t"]);
        assert!(updated.updated_at >= note.updated_at);
    }

    #[test]
    fn test_set_archived() {
        let (db, owner) = setup();
        let repo = SqliteNoteRepository::new(db.connection());

        let note = Note::new(owner, "Archive me", "");
        repo.create(&note).unwrap();

        let archived = repo.set_archived(&owner, &note.id, true).unwrap();
        assert!(archived.archived);
        assert!(repo
            .list(&owner, &NoteFilter::default(), 10, 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_is_soft_and_hidden() {
        let (db, owner) = setup();
        let repo = SqliteNoteRepository::new(db.connection());

        let note = Note::new(owner, "To delete", "");
        repo.create(&note).unwrap();
        repo.delete(&owner, &note.id).unwrap();

        assert!(repo.get(&owner, &note.id).unwrap().is_none());
        assert!(repo.recently_updated(&owner, 100).unwrap().is_empty());
        assert!(matches!(
            repo.delete(&owner, &note.id),
            Err(Error::NotFound(Resource::Note, _))
        ));

        let still_stored: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(still_stored, 1);
    }

    #[test]
    fn test_delete_many_reports_deleted_ids() {
        let (db, owner) = setup();
        let other = add_user(&db, "other@example.com");
        let repo = SqliteNoteRepository::new(db.connection());

        let mine = Note::new(owner, "Mine", "");
        let theirs = Note::new(other, "Theirs", "");
        repo.create(&mine).unwrap();
        repo.create(&theirs).unwrap();

        let deleted = repo
            .delete_many(&owner, &[mine.id, theirs.id, NoteId::new()])
            .unwrap();
        assert_eq!(deleted, vec![mine.id]);
        assert!(repo.get(&other, &theirs.id).unwrap().is_some());
    }

    #[test]
    fn test_search_scopes() {
        let (db, owner) = setup();
        let repo = SqliteNoteRepository::new(db.connection());

        repo.create(&Note::new(owner, "Rust notes", "ownership"))
            .unwrap();
        repo.create(&Note::new(owner, "Cooking", "rust-free pans"))
            .unwrap();

        assert_eq!(
            repo.search(&owner, "rust", SearchScope::Both, 50)
                .unwrap()
                .len(),
            2
        );
        let by_title = repo.search(&owner, "rust", SearchScope::Title, 50).unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "Rust notes");
        let by_content = repo
            .search(&owner, "rust", SearchScope::Content, 50)
            .unwrap();
        assert_eq!(by_content[0].title, "Cooking");
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let (db, owner) = setup();
        let repo = SqliteNoteRepository::new(db.connection());

        repo.create(&Note::new(owner, "100% done", "")).unwrap();
        repo.create(&Note::new(owner, "1000 items", "")).unwrap();

        let hits = repo.search(&owner, "0%", SearchScope::Title, 50).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "100% done");
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let (db, owner) = setup();
        let repo = SqliteNoteRepository::new(db.connection());

        repo.create(&Note::new(owner, "Été plans", "Grüße aus KÖLN"))
            .unwrap();
        repo.create(&Note::new(owner, "Winter", "")).unwrap();

        let hits = repo.search(&owner, "été", SearchScope::Title, 50).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Été plans");
        assert_eq!(
            repo.search(&owner, "köln", SearchScope::Content, 50)
                .unwrap()
                .len(),
            1
        );

        let filter = NoteFilter {
            search: Some("ÉTÉ".to_string()),
            ..NoteFilter::default()
        };
        assert_eq!(repo.list(&owner, &filter, 10, 0).unwrap().len(), 1);
        assert_eq!(repo.count(&owner, &filter).unwrap(), 1);
    }

    #[test]
    fn test_create_many_and_recently_updated_limit() {
        let (db, owner) = setup();
        let repo = SqliteNoteRepository::new(db.connection());

        let notes: Vec<_> = (0..5)
            .map(|i| Note::new(owner, format!("n{i}"), ""))
            .collect();
        repo.create_many(&notes).unwrap();

        let recent = repo.recently_updated(&owner, 3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].title, "n4");
    }
}
