//! `SQLite` store for users, notes, categories and attachments

mod attachment_repository;
mod category_repository;
mod connection;
mod migrations;
mod note_repository;
mod row;
mod user_repository;

pub use attachment_repository::{AttachmentRepository, SqliteAttachmentRepository};
pub use category_repository::{CategoryRepository, SqliteCategoryRepository};
pub use connection::Database;
pub use note_repository::{NoteRepository, SqliteNoteRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};
