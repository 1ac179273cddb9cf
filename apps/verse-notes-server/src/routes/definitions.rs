//! Strong's definition route

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::lookup::{DefinitionQuery, StrongsDefinition};
use crate::state::AppState;

/// Create the definitions router
pub fn router() -> Router<AppState> {
    Router::new().route("/api/strongs_definition", get(strongs_definition))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionParams {
    word: Option<String>,
    translation: Option<String>,
    book_name: Option<String>,
    chapter: Option<String>,
    verse: Option<String>,
}

impl DefinitionParams {
    fn into_query(self) -> Result<DefinitionQuery> {
        let missing = || AppError::BadRequest("Missing required query parameters".to_string());
        let required = |v: Option<String>| v.filter(|s| !s.trim().is_empty()).ok_or_else(missing);

        let word = required(self.word)?;
        let translation = required(self.translation)?;
        let book_name = required(self.book_name)?;
        let chapter = required(self.chapter)?;
        let verse = required(self.verse)?;

        Ok(DefinitionQuery {
            word: word.trim().to_string(),
            translation,
            book_name,
            chapter: chapter
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Invalid chapter: {}", chapter)))?,
            verse: verse
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Invalid verse: {}", verse)))?,
        })
    }
}

/// Look up the Strong's entry for a word in a verse
async fn strongs_definition(
    State(state): State<AppState>,
    Query(params): Query<DefinitionParams>,
) -> Result<Json<StrongsDefinition>> {
    let query = params.into_query()?;
    let definition = state.lookup().lookup(&query).await?;
    Ok(Json(definition))
}
