//! Data models for the notes backend

mod attachment;
mod category;
mod id;
mod note;
mod user;

pub use attachment::{Attachment, AttachmentId};
pub use category::{
    validate as validate_category, Category, CategoryId, CATEGORY_COLOR_MAX_CHARS,
    CATEGORY_NAME_MAX_CHARS,
};
pub use note::{Note, NoteDraft, NoteFilter, NoteId, SearchScope, NOTE_TITLE_MAX_CHARS};
pub use user::{User, UserId};
