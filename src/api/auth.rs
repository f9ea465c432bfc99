use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use tracing::{info, warn};

use crate::auth::password::verify_password;
use crate::auth::{limit_login, require_admin};
use crate::db::repository;
use crate::error::AppError;
use crate::models::{LoginRequest, LoginResponse, UserProfile};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let login_route = Router::new()
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(state.clone(), limit_login));

    let profile_route = Router::new()
        .route("/profile", get(profile))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    login_route.merge(profile_route)
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = payload?;
    let invalid = || AppError::Unauthorized("Invalid username or password".to_string());

    let user = repository::find_user_by_username(&state.db, &req.username).await?;
    let Some(user) = user else {
        warn!("login failed for unknown user");
        return Err(invalid());
    };

    // CPU-bound, runs on the blocking pool.
    let stored_hash = user.password_hash.clone();
    let password = req.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(format!("password check panicked: {e}")))?;

    if !matches {
        warn!("login failed for user {}", user.username);
        return Err(invalid());
    }

    let profile = UserProfile {
        id: user.id,
        username: user.username,
    };
    let token = state.tokens.issue(&profile)?;
    info!("user {} logged in", profile.username);

    Ok(Json(LoginResponse {
        id: profile.id,
        username: profile.username,
        token,
    }))
}

async fn profile(Extension(user): Extension<UserProfile>) -> Json<UserProfile> {
    Json(user)
}
