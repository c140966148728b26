//! notes-core - Core library for the notes backend
//!
//! This crate contains the shared models, the `SQLite` store and the sync
//! protocol used by the HTTP API.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Resource, Result};
pub use models::{Attachment, AttachmentId, Category, CategoryId, Note, NoteId, User, UserId};
pub use services::DatabaseService;
