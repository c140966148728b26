use axum::extract::{Multipart, Path, State};
use axum::Extension;
use chrono::{DateTime, Utc};
use notes_core::{Attachment, AttachmentId, NoteId, Resource};
use serde::Serialize;

use super::parse_id;
use crate::auth::{user_fingerprint, AuthenticatedUser};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::routes::AppState;
use crate::storage::file_url;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Serialize)]
pub struct AttachmentView {
    id: AttachmentId,
    filename: String,
    size: i64,
    mime_type: String,
    url: String,
    uploaded_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentView {
    fn from(attachment: Attachment) -> Self {
        Self {
            id: attachment.id,
            url: file_url(&attachment.storage_path),
            filename: attachment.filename,
            size: attachment.size_bytes,
            mime_type: attachment.mime_type,
            uploaded_at: attachment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    attachment: AttachmentView,
}

struct UploadedFile {
    filename: String,
    mime_type: String,
    bytes: Vec<u8>,
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_default();
        let mime_type = field
            .content_type()
            .map_or_else(|| DEFAULT_MIME_TYPE.to_string(), str::to_string);
        let bytes = field.bytes().await?.to_vec();
        return Ok(Some(UploadedFile {
            filename,
            mime_type,
            bytes,
        }));
    }
    Ok(None)
}

pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(note_id): Path<String>,
    mut multipart: Multipart,
) -> Result<ApiResponse<AttachmentResponse>, AppError> {
    let note_id: NoteId = parse_id(&note_id, Resource::Note)?;
    if state.db.get_note(&user.user_id, &note_id).await?.is_none() {
        return Err(AppError::not_found(Resource::Note));
    }

    let file = read_file_field(&mut multipart)
        .await?
        .filter(|file| !file.filename.trim().is_empty())
        .ok_or_else(|| AppError::validation("File is required"))?;
    if file.bytes.len() > state.config.max_upload_bytes {
        return Err(AppError::FileTooLarge);
    }

    let id = AttachmentId::new();
    let size = i64::try_from(file.bytes.len()).map_err(|_| AppError::FileTooLarge)?;
    let storage_path = state
        .attachments
        .save(&note_id, &id, &file.filename, &file.bytes)
        .await?;

    let attachment = Attachment::new(
        id,
        note_id,
        file.filename,
        file.mime_type,
        size,
        storage_path.clone(),
    )?;
    if let Err(error) = state.db.create_attachment(&attachment).await {
        state.attachments.remove(&storage_path).await?;
        return Err(error.into());
    }

    tracing::info!(
        user = user_fingerprint(&user.user_id),
        note_id = %note_id,
        attachment_id = %attachment.id,
        size,
        "Stored attachment"
    );
    Ok(ApiResponse::created(AttachmentResponse {
        attachment: attachment.into(),
    })
    .with_message("File uploaded successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let id: AttachmentId = parse_id(&id, Resource::Attachment)?;
    let attachment = state
        .db
        .get_attachment(&user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found(Resource::Attachment))?;

    state.db.delete_attachment(&attachment.id).await?;
    state.attachments.remove(&attachment.storage_path).await?;

    tracing::info!(
        user = user_fingerprint(&user.user_id),
        attachment_id = %attachment.id,
        "Deleted attachment"
    );
    Ok(ApiResponse::message("Attachment deleted successfully"))
}
