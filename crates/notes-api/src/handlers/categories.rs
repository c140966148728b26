use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use notes_core::{Category, CategoryId, Resource};
use serde::{Deserialize, Serialize};

use super::parse_id;
use crate::auth::{user_fingerprint, AuthenticatedUser};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    #[serde(default)]
    name: String,
    color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    category: Category,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    categories: Vec<Category>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiResponse<CategoryListResponse>, AppError> {
    let categories = state.db.list_categories(&user.user_id).await?;
    Ok(ApiResponse::ok(CategoryListResponse { categories }))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<ApiResponse<CategoryResponse>, AppError> {
    let Json(request) = body?;
    let category = state
        .db
        .create_category(&user.user_id, &request.name, request.color)
        .await?;

    tracing::info!(
        user = user_fingerprint(&user.user_id),
        category_id = %category.id,
        "Created category"
    );
    Ok(ApiResponse::created(CategoryResponse { category })
        .with_message("Category created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    body: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<ApiResponse<CategoryResponse>, AppError> {
    let id: CategoryId = parse_id(&id, Resource::Category)?;
    let Json(request) = body?;
    let category = state
        .db
        .update_category(&user.user_id, &id, &request.name, request.color.as_deref())
        .await?;

    Ok(ApiResponse::ok(CategoryResponse { category }))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let id: CategoryId = parse_id(&id, Resource::Category)?;
    state.db.delete_category(&user.user_id, &id).await?;

    tracing::info!(
        user = user_fingerprint(&user.user_id),
        category_id = %id,
        "Deleted category"
    );
    Ok(ApiResponse::message("Category deleted successfully"))
}
