use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::search_modules;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{SearchHit, Year};
use crate::services::{SyncService, SyncStats};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub message: String,
    pub stats: SyncStats,
}

pub async fn list_years(State(state): State<AppState>) -> Result<Json<Vec<Year>>, AppError> {
    let years = repository::fetch_catalog(&state.db).await?;
    Ok(Json(years))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, AppError> {
    if params.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }
    let years = repository::fetch_catalog(&state.db).await?;
    Ok(Json(search_modules(&years, &params.q)))
}

pub async fn sync_catalog(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SyncResponse>, AppError> {
    let Json(body) = payload?;
    if !body.is_array() {
        return Err(AppError::BadRequest(
            "Invalid data format. Expected an array of years.".to_string(),
        ));
    }

    let years: Vec<Year> = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid year data: {e}")))?;

    let stats = SyncService::new(state.db.clone())
        .replace_catalog(&years)
        .await?;

    Ok(Json(SyncResponse {
        message: "Sync successful".to_string(),
        stats,
    }))
}
