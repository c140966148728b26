use std::time::Instant;

use axum::extract::{Query, State};
use axum::Extension;
use chrono::{DateTime, Utc};
use notes_core::models::SearchScope;
use notes_core::{Note, NoteId};
use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::routes::AppState;

const MAX_RESULTS: usize = 50;
/// Results are not ranked; every hit carries the same score.
const UNRANKED_SCORE: f64 = 0.5;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
    #[serde(rename = "in")]
    scope: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct Matches {
    title: Vec<String>,
    content: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    id: NoteId,
    title: String,
    content: String,
    category: Option<String>,
    tags: Vec<String>,
    relevance_score: f64,
    matches: Matches,
    created_at: DateTime<Utc>,
}

impl From<Note> for SearchHit {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            category: note.category,
            tags: note.tags,
            relevance_score: UNRANKED_SCORE,
            matches: Matches::default(),
            created_at: note.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    results: Vec<SearchHit>,
    total_results: usize,
    search_time_ms: u128,
}

pub async fn search(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<SearchQuery>,
) -> Result<ApiResponse<SearchResponse>, AppError> {
    let q = query.q.unwrap_or_default();
    if q.is_empty() {
        return Err(AppError::validation("Missing q"));
    }
    let scope = SearchScope::parse(query.scope.as_deref());

    let started = Instant::now();
    let notes = state
        .db
        .search_notes(&user.user_id, &q, scope, MAX_RESULTS)
        .await?;
    let results: Vec<SearchHit> = notes.into_iter().map(SearchHit::from).collect();

    Ok(ApiResponse::ok(SearchResponse {
        total_results: results.len(),
        results,
        search_time_ms: started.elapsed().as_millis(),
    }))
}
