use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use notes_core::{User, UserId};
use serde::{Deserialize, Serialize};

use crate::accounts::AuthSession;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    id: UserId,
    email: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl UserView {
    fn from_user(user: User, with_created_at: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: with_created_at.then_some(user.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    user: UserView,
    token: String,
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<ApiResponse<SessionResponse>, AppError> {
    let Json(request) = body?;
    let AuthSession { user, token } = state
        .auth
        .register(&request.email, &request.password, &request.name)
        .await?;

    Ok(ApiResponse::created(SessionResponse {
        user: UserView::from_user(user, true),
        token,
    })
    .with_message("User registered successfully"))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<SessionResponse>, AppError> {
    let Json(request) = body?;
    let AuthSession { user, token } = state.auth.login(&request.email, &request.password).await?;

    Ok(ApiResponse::ok(SessionResponse {
        user: UserView::from_user(user, false),
        token,
    })
    .with_message("Login successful"))
}

/// Tokens are stateless, so logging out has no server-side effect.
pub async fn logout() -> ApiResponse<()> {
    ApiResponse::message("Logout successful")
}
