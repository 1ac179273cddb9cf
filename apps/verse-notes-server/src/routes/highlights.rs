//! Highlights API routes

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, info};
use verse_notes::{Annotation, Scope};

use crate::db::HighlightRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the highlights router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/highlights", get(list_highlights).post(create_highlight))
        .route("/api/highlights/delete/:id", delete(delete_highlight))
}

/// Scope query parameters; all three are required
#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    translation: Option<String>,
    #[serde(rename = "bookId")]
    book_id: Option<String>,
    chapter: Option<String>,
}

impl ScopeQuery {
    fn into_scope(self) -> Result<Scope> {
        let missing =
            || AppError::BadRequest("Missing required query parameters: translation, bookId, chapter".to_string());

        let translation = self.translation.filter(|t| !t.is_empty()).ok_or_else(missing)?;
        let book_id = self.book_id.filter(|b| !b.is_empty()).ok_or_else(missing)?;
        let chapter = self.chapter.filter(|c| !c.is_empty()).ok_or_else(missing)?;

        let book_id = book_id
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Invalid bookId: {}", book_id)))?;
        let chapter = chapter
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Invalid chapter: {}", chapter)))?;

        Ok(Scope::new(translation, book_id, chapter))
    }
}

/// List highlights of one chapter
async fn list_highlights(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<Vec<Annotation>>> {
    let scope = query.into_scope()?;
    let repo = HighlightRepository::new(state.db());
    let highlights = repo.list_for_scope(&scope).await?;
    debug!("Listed {} highlights for {}", highlights.len(), scope);
    Ok(Json(highlights))
}

/// Create a new highlight or note
async fn create_highlight(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Annotation>, JsonRejection>,
) -> Result<(StatusCode, Json<Annotation>)> {
    let Json(annotation) = payload
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;
    annotation
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let repo = HighlightRepository::new(state.db());
    let stored = repo.insert(&annotation).await?;
    info!("Stored {} {} on {}", stored.kind, stored.id, stored.anchor_id);
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Delete a highlight
async fn delete_highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let repo = HighlightRepository::new(state.db());
    if repo.delete(&id).await? {
        info!("Deleted highlight {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Highlight not found: {}", id)))
    }
}
