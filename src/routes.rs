//! Route table. Registered once at startup; matching is axum's exact
//! method + segment matching, with a JSON 404 fallback for misses.

use crate::error::{ErrorBody, ErrorDetail};
use crate::handlers::{directory, link, record};
use crate::state::AppState;
use crate::tables::{Course, Family, Person, Signup};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::limit::RequestBodyLimitLayer;

const BODY_LIMIT_BYTES: usize = 1 << 20;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: ErrorDetail {
                code: "not_found".to_string(),
                message: "no route matches".to_string(),
                details: None,
            },
        }),
    )
}

/// Common routes: GET /health, GET /version.
pub fn common_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
}

/// The /v1 API over the five tables.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/person", post(directory::create::<Person>))
        .route(
            "/v1/person/:id",
            get(directory::read_person)
                .put(directory::modify::<Person>)
                .delete(directory::remove::<Person>),
        )
        .route("/v1/course", post(directory::create::<Course>))
        .route(
            "/v1/course/:id",
            get(directory::read_course)
                .put(directory::modify::<Course>)
                .delete(directory::remove::<Course>),
        )
        .route(
            "/v1/family/:upper/:lower",
            put(link::create::<Family>).delete(link::remove::<Family>),
        )
        .route(
            "/v1/signup/:course/:person",
            put(link::create::<Signup>).delete(link::remove::<Signup>),
        )
        .route("/v1/record", post(record::create))
        .route(
            "/v1/record/:id",
            get(record::read).put(record::modify).delete(record::remove),
        )
        .with_state(state)
}

/// The full application: common routes, the /v1 API, a JSON 404 fallback,
/// and a request body cap.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes())
        .merge(api_routes(state))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}
