use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    MaterialKind, MaterialRecord, ModuleRecord, NewMaterialRequest, NewModuleRequest,
    SemesterModuleRequest, UpdateModuleRequest,
};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

fn module_not_found() -> AppError {
    AppError::NotFound("Module not found".to_string())
}

pub async fn create_module(
    State(state): State<AppState>,
    payload: Result<Json<NewModuleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ModuleRecord>), AppError> {
    let Json(mut req) = payload?;

    if req.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        return Err(AppError::BadRequest("Module title is required".to_string()));
    }
    if req.unit_id.is_some() && req.standalone_year_id.is_some() {
        return Err(AppError::BadRequest(
            "A module belongs to either a unit or a year, not both".to_string(),
        ));
    }
    if req.unit_id.is_none() && req.standalone_year_id.is_none() {
        return Err(AppError::BadRequest(
            "A module needs a unitId or a standaloneYearId".to_string(),
        ));
    }
    if req.is_standalone && req.standalone_year_id.is_none() {
        return Err(AppError::BadRequest(
            "Standalone modules need a standaloneYearId".to_string(),
        ));
    }
    req.is_standalone = req.standalone_year_id.is_some();
    // Only semester modules are shared.
    req.is_shared = false;
    if req.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
        req.id = None;
    }

    let module = repository::insert_module(&state.db, req).await?;
    info!("created module {}", module.id);
    Ok((StatusCode::CREATED, Json(module)))
}

pub async fn update_module(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateModuleRequest>, JsonRejection>,
) -> Result<Json<ModuleRecord>, AppError> {
    let Json(req) = payload?;
    let title = req
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Module title is required".to_string()))?;

    let module = repository::update_module_title(&state.db, &id, &title)
        .await?
        .ok_or_else(module_not_found)?;
    Ok(Json(module))
}

pub async fn add_module_to_semester(
    State(state): State<AppState>,
    Path(semester_id): Path<String>,
    payload: Result<Json<SemesterModuleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ModuleRecord>), AppError> {
    let Json(req) = payload?;

    let module =
        repository::insert_semester_module(&state.db, &semester_id, req.title, req.is_shared)
            .await?
            .ok_or_else(|| AppError::NotFound("Semester not found".to_string()))?;

    info!("created module {} in semester {}", module.id, semester_id);
    Ok((StatusCode::CREATED, Json(module)))
}

pub async fn delete_module(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !repository::delete_module(&state.db, &id).await? {
        return Err(module_not_found());
    }
    info!("deleted module {}", id);
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn add_lesson(
    state: State<AppState>,
    module_id: Path<String>,
    payload: Result<Json<NewMaterialRequest>, JsonRejection>,
) -> Result<Json<MaterialRecord>, AppError> {
    add_material(state, module_id, payload, MaterialKind::Lesson).await
}

pub async fn add_exam(
    state: State<AppState>,
    module_id: Path<String>,
    payload: Result<Json<NewMaterialRequest>, JsonRejection>,
) -> Result<Json<MaterialRecord>, AppError> {
    add_material(state, module_id, payload, MaterialKind::Exam).await
}

async fn add_material(
    State(state): State<AppState>,
    Path(module_id): Path<String>,
    payload: Result<Json<NewMaterialRequest>, JsonRejection>,
    kind: MaterialKind,
) -> Result<Json<MaterialRecord>, AppError> {
    let Json(req) = payload?;

    if repository::find_module(&state.db, &module_id).await?.is_none() {
        return Err(module_not_found());
    }

    let record = repository::insert_material(&state.db, kind, &module_id, req).await?;
    Ok(Json(record))
}

pub async fn delete_lesson(
    state: State<AppState>,
    id: Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    delete_material(state, id, MaterialKind::Lesson).await
}

pub async fn delete_exam(
    state: State<AppState>,
    id: Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    delete_material(state, id, MaterialKind::Exam).await
}

async fn delete_material(
    State(state): State<AppState>,
    Path(id): Path<String>,
    kind: MaterialKind,
) -> Result<Json<SuccessResponse>, AppError> {
    let deleted = repository::delete_material(&state.db, kind, &id).await?;
    if deleted == 0 {
        let what = match kind {
            MaterialKind::Lesson => "Lesson",
            MaterialKind::Exam => "Exam",
        };
        return Err(AppError::NotFound(format!("{what} not found")));
    }
    Ok(Json(SuccessResponse { success: true }))
}
