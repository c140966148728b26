//! Attachment metadata repository

use rusqlite::{params, Connection, OptionalExtension};

use super::row;
use crate::error::{Error, Resource, Result};
use crate::models::{Attachment, AttachmentId, UserId};

/// Trait for attachment metadata storage operations
pub trait AttachmentRepository {
    /// Persist attachment metadata
    fn create(&self, attachment: &Attachment) -> Result<()>;

    /// Get an attachment whose parent note belongs to `owner` and is not deleted
    fn get_for_owner(&self, owner: &UserId, id: &AttachmentId) -> Result<Option<Attachment>>;

    /// Remove attachment metadata
    fn delete(&self, id: &AttachmentId) -> Result<()>;
}

/// `SQLite` implementation of `AttachmentRepository`
pub struct SqliteAttachmentRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteAttachmentRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_attachment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Attachment> {
        Ok(Attachment {
            id: row::id(row, 0)?,
            note_id: row::id(row, 1)?,
            filename: row.get(2)?,
            mime_type: row.get(3)?,
            size_bytes: row.get(4)?,
            storage_path: row.get(5)?,
            created_at: row::timestamp(row, 6)?,
        })
    }
}

impl AttachmentRepository for SqliteAttachmentRepository<'_> {
    fn create(&self, attachment: &Attachment) -> Result<()> {
        self.conn.execute(
            "INSERT INTO attachments (id, note_id, filename, mime_type, size_bytes, storage_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                attachment.id.as_str(),
                attachment.note_id.as_str(),
                attachment.filename,
                attachment.mime_type,
                attachment.size_bytes,
                attachment.storage_path,
                attachment.created_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn get_for_owner(&self, owner: &UserId, id: &AttachmentId) -> Result<Option<Attachment>> {
        let attachment = self
            .conn
            .query_row(
                "SELECT a.id, a.note_id, a.filename, a.mime_type, a.size_bytes, a.storage_path, a.created_at
                 FROM attachments a
                 JOIN notes n ON n.id = a.note_id
                 WHERE a.id = ?1 AND n.user_id = ?2 AND n.deleted_at IS NULL",
                params![id.as_str(), owner.as_str()],
                Self::parse_attachment,
            )
            .optional()?;
        Ok(attachment)
    }

    fn delete(&self, id: &AttachmentId) -> Result<()> {
        let rows = self.conn.execute(
            "DELETE FROM attachments WHERE id = ?1",
            params![id.as_str()],
        )?;
        if rows == 0 {
            return Err(Error::not_found(Resource::Attachment, id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NoteRepository, SqliteNoteRepository, SqliteUserRepository, UserRepository};
    use crate::models::{Note, NoteId, User};
    use pretty_assertions::assert_eq;

    fn setup() -> (Database, UserId, NoteId) {
        let db = Database::open_in_memory().unwrap();
        let user = User::new("Owner", "owner@example.com", "hash");
        SqliteUserRepository::new(db.connection())
            .create(&user)
            .unwrap();
        let note = Note::new(user.id, "With files", "");
        SqliteNoteRepository::new(db.connection())
            .create(&note)
            .unwrap();
        (db, user.id, note.id)
    }

    fn attachment(note_id: NoteId, filename: &str) -> Attachment {
        let id = AttachmentId::new();
        Attachment::new(
            id,
            note_id,
            filename,
            "text/plain",
            5,
            format!("{note_id}/{id}_{filename}"),
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_get_for_owner() {
        let (db, owner, note_id) = setup();
        let repo = SqliteAttachmentRepository::new(db.connection());

        let file = attachment(note_id, "a.txt");
        repo.create(&file).unwrap();

        let fetched = repo.get_for_owner(&owner, &file.id).unwrap().unwrap();
        assert_eq!(fetched, file);
        assert!(repo.get_for_owner(&UserId::new(), &file.id).unwrap().is_none());
    }

    #[test]
    fn test_hidden_once_note_is_deleted() {
        let (db, owner, note_id) = setup();
        let repo = SqliteAttachmentRepository::new(db.connection());

        let file = attachment(note_id, "a.txt");
        repo.create(&file).unwrap();
        SqliteNoteRepository::new(db.connection())
            .delete(&owner, &note_id)
            .unwrap();

        assert!(repo.get_for_owner(&owner, &file.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_only_removes_target() {
        let (db, owner, note_id) = setup();
        let repo = SqliteAttachmentRepository::new(db.connection());

        let first = attachment(note_id, "a.txt");
        let second = attachment(note_id, "b.txt");
        repo.create(&first).unwrap();
        repo.create(&second).unwrap();

        repo.delete(&first.id).unwrap();
        assert!(repo.get_for_owner(&owner, &first.id).unwrap().is_none());
        assert_eq!(repo.get_for_owner(&owner, &second.id).unwrap(), Some(second));
        assert!(matches!(
            repo.delete(&first.id),
            Err(Error::NotFound(Resource::Attachment, _))
        ));
    }
}
