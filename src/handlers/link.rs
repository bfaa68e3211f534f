//! Family and signup handlers: relation rows addressed by their two endpoint
//! ids in the path, no body.

use crate::error::AppError;
use crate::handlers::parse_id;
use crate::sql::{delete_by, insert};
use crate::state::AppState;
use crate::tables::{Family, Signup, Table};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{Map, Value};

/// A two-column relation table: (left, right) is the addressable pair.
pub trait LinkTable: Table {
    const LEFT: &'static str;
    const RIGHT: &'static str;
}

impl LinkTable for Family {
    const LEFT: &'static str = "upper";
    const RIGHT: &'static str = "lower";
}

impl LinkTable for Signup {
    const LEFT: &'static str = "course";
    const RIGHT: &'static str = "person";
}

fn link_row<T: LinkTable>(left: i64, right: i64) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert(T::LEFT.to_string(), Value::from(left));
    row.insert(T::RIGHT.to_string(), Value::from(right));
    row
}

/// PUT /v1/{relation}/:left/:right. A duplicate pair or a dangling endpoint
/// surfaces as a constraint violation, not a crash.
pub async fn create<T: LinkTable>(
    State(state): State<AppState>,
    Path((left_segment, right_segment)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let left = parse_id(&left_segment)?;
    let right = parse_id(&right_segment)?;
    let row = link_row::<T>(left, right);
    let result = state.db.run(&insert::<T>(&[row])).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// DELETE /v1/{relation}/:left/:right. Zero changes when the pair is absent.
pub async fn remove<T: LinkTable>(
    State(state): State<AppState>,
    Path((left_segment, right_segment)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let left = parse_id(&left_segment)?;
    let right = parse_id(&right_segment)?;
    let stmt = delete_by::<T>(&[(T::LEFT, left), (T::RIGHT, right)]);
    let result = state.db.run(&stmt).await?;
    Ok(Json(result))
}
