pub mod auth;
pub mod catalog;
pub mod modules;

use std::time::Duration;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{
    AUTHORIZATION, CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{HeaderValue, Method, StatusCode, Uri};
use axum::routing::{delete, get, post, put};
use axum::{Router, middleware};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::require_admin;
use crate::error::AppError;
use crate::state::AppState;

pub const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/auth", auth::routes(state.clone()))
        .nest("/api/years", years_routes(state.clone()))
        .nest("/api/modules", modules_routes(state.clone()))
        .nest("/api/semesters", semesters_routes(state.clone()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    X_FRAME_OPTIONS,
                    HeaderValue::from_static("SAMEORIGIN"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                )),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn years_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/sync", post(catalog::sync_catalog))
        .route("/modules", post(modules::create_module))
        .route(
            "/modules/{id}",
            put(modules::update_module).delete(modules::delete_module),
        )
        .route("/modules/{id}/lessons", post(modules::add_lesson))
        .route("/modules/{id}/exams", post(modules::add_exam))
        .route("/semesters/{id}/modules", post(modules::add_module_to_semester))
        .route("/lessons/{id}", delete(modules::delete_lesson))
        .route("/exams/{id}", delete(modules::delete_exam))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/", get(catalog::list_years))
        .route("/search", get(catalog::search))
        .merge(protected)
}

fn modules_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(modules::create_module))
        .route("/{id}", put(modules::update_module))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

fn semesters_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/{id}/modules", post(modules::add_module_to_semester))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring unparsable CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

async fn root() -> &'static str {
    "MedGuid API is running..."
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Not Found - {}", uri.path()))
}
