use std::collections::HashSet;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use notes_core::models::{NoteDraft, NoteFilter};
use notes_core::{Note, NoteId, Resource};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::parse_id;
use crate::auth::{user_fingerprint, AuthenticatedUser};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::routes::AppState;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    search: Option<String>,
    archived: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    category: Option<String>,
    tags: Option<Vec<String>>,
}

impl NoteRequest {
    fn into_draft(self) -> Result<NoteDraft, AppError> {
        let draft = NoteDraft {
            title: self.title,
            content: self.content,
            category: self.category,
            tags: self.tags.unwrap_or_default(),
        };
        draft.validate().map_err(|error| match error {
            notes_core::Error::InvalidInput(reason) => AppError::Validation {
                message: "Validation failed".to_string(),
                details: Some(json!({ "title": reason })),
            },
            other => other.into(),
        })?;
        Ok(draft)
    }
}

#[derive(Debug, Deserialize)]
pub struct ArchiveRequest {
    #[serde(default)]
    archived: bool,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    note_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    note: Note,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Pagination {
    current_page: usize,
    total_pages: usize,
    total_items: usize,
    items_per_page: usize,
}

#[derive(Debug, Serialize)]
pub struct NoteListResponse {
    notes: Vec<Note>,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    deleted_count: usize,
    failed_ids: Vec<String>,
}

/// Page and page size from raw query values; unparsable values fall back to defaults.
fn page_window(page: Option<&str>, limit: Option<&str>) -> (usize, usize) {
    let page = page
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let limit = limit
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<NoteListResponse>, AppError> {
    let (page, limit) = page_window(query.page.as_deref(), query.limit.as_deref());
    let filter = NoteFilter {
        search: query.search,
        archived: query.archived.as_deref() == Some("true"),
    };

    let offset = (page - 1).saturating_mul(limit);
    let result = state
        .db
        .list_notes(&user.user_id, &filter, limit, offset)
        .await?;

    Ok(ApiResponse::ok(NoteListResponse {
        pagination: Pagination {
            current_page: page,
            total_pages: result.total.div_ceil(limit),
            total_items: result.total,
            items_per_page: limit,
        },
        notes: result.notes,
    }))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<ApiResponse<NoteResponse>, AppError> {
    let id: NoteId = parse_id(&id, Resource::Note)?;
    let note = state
        .db
        .get_note(&user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::not_found(Resource::Note))?;
    Ok(ApiResponse::ok(NoteResponse { note }))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<NoteRequest>, JsonRejection>,
) -> Result<ApiResponse<NoteResponse>, AppError> {
    let Json(request) = body?;
    let draft = request.into_draft()?;
    let note = state.db.create_note(&user.user_id, draft).await?;

    tracing::info!(
        user = user_fingerprint(&user.user_id),
        note_id = %note.id,
        "Created note"
    );
    Ok(ApiResponse::created(NoteResponse { note }).with_message("Note created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    body: Result<Json<NoteRequest>, JsonRejection>,
) -> Result<ApiResponse<NoteResponse>, AppError> {
    let id: NoteId = parse_id(&id, Resource::Note)?;
    let Json(request) = body?;
    let draft = request.into_draft()?;
    let note = state.db.update_note(&user.user_id, &id, &draft).await?;

    tracing::info!(
        user = user_fingerprint(&user.user_id),
        note_id = %note.id,
        "Updated note"
    );
    Ok(ApiResponse::ok(NoteResponse { note }).with_message("Note updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let id: NoteId = parse_id(&id, Resource::Note)?;
    state.db.delete_note(&user.user_id, &id).await?;

    tracing::info!(
        user = user_fingerprint(&user.user_id),
        note_id = %id,
        "Deleted note"
    );
    Ok(ApiResponse::message("Note deleted successfully"))
}

pub async fn archive(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    body: Result<Json<ArchiveRequest>, JsonRejection>,
) -> Result<ApiResponse<NoteResponse>, AppError> {
    let id: NoteId = parse_id(&id, Resource::Note)?;
    let Json(request) = body?;
    let note = state
        .db
        .set_note_archived(&user.user_id, &id, request.archived)
        .await?;

    Ok(ApiResponse::ok(NoteResponse { note }).with_message("Note archived successfully"))
}

pub async fn bulk_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<BulkDeleteRequest>, JsonRejection>,
) -> Result<ApiResponse<BulkDeleteResponse>, AppError> {
    let Json(request) = body?;
    if request.note_ids.is_empty() {
        return Err(AppError::validation("Invalid request"));
    }

    let ids: Vec<NoteId> = request
        .note_ids
        .iter()
        .filter_map(|raw| raw.trim().parse().ok())
        .collect();
    let deleted: HashSet<NoteId> = state
        .db
        .delete_notes(&user.user_id, &ids)
        .await?
        .into_iter()
        .collect();

    let failed_ids: Vec<String> = request
        .note_ids
        .into_iter()
        .filter(|raw| {
            !raw.trim()
                .parse::<NoteId>()
                .is_ok_and(|id| deleted.contains(&id))
        })
        .collect();

    tracing::info!(
        user = user_fingerprint(&user.user_id),
        deleted = deleted.len(),
        failed = failed_ids.len(),
        "Bulk deleted notes"
    );
    Ok(ApiResponse::ok(BulkDeleteResponse {
        deleted_count: deleted.len(),
        failed_ids,
    })
    .with_message("Bulk delete completed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_defaults_and_clamps() {
        assert_eq!(page_window(None, None), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(page_window(Some("0"), Some("0")), (1, 1));
        assert_eq!(page_window(Some("3"), Some("500")), (3, MAX_PAGE_SIZE));
        assert_eq!(page_window(Some("abc"), Some("-5")), (1, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn blank_title_reports_field_details() {
        let request = NoteRequest {
            title: "  ".to_string(),
            content: String::new(),
            category: None,
            tags: None,
        };
        let AppError::Validation { details, .. } = request.into_draft().unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(details, Some(json!({"title": "Title cannot be empty"})));
    }
}
