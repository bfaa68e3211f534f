//! Attendance record handlers. The by-id GET doubles as a relation lookup:
//! `?by=person` or `?by=course` reinterprets the id as that table's key and
//! returns the records reachable through signup.

use crate::error::AppError;
use crate::handlers::{json_body, parse_id};
use crate::schema::ValidationError;
use crate::sql::{delete, insert, select_all, update};
use crate::state::AppState;
use crate::tables::{Record, Table};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;
use std::collections::HashMap;

/// POST /v1/record: body is a JSON array of record rows.
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = json_body(body)?;
    let rows = Record::checker().parse_array(&body)?;
    if rows.is_empty() {
        return Err(AppError::BadRequest("expected at least one row".into()));
    }
    let result = state.db.run(&insert::<Record>(&rows)).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// GET /v1/record/:id[?by=person|course].
pub async fn read(
    State(state): State<AppState>,
    Path(id_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id_segment)?;
    match params.get("by").map(String::as_str) {
        None => {
            let row = state
                .db
                .row(&select_all::<Record>().by_id(id))
                .await?
                .ok_or_else(|| AppError::NotFound(format!("record {id}")))?;
            Ok(Json(row))
        }
        Some("person") => {
            let rows = state
                .db
                .rows(&select_all::<Record>().for_person(id).into_statement())
                .await?;
            Ok(Json(Value::Array(rows)))
        }
        Some("course") => {
            let rows = state
                .db
                .rows(&select_all::<Record>().for_course(id).into_statement())
                .await?;
            Ok(Json(Value::Array(rows)))
        }
        Some(other) => Err(ValidationError {
            field: "by".into(),
            message: format!("must be 'person' or 'course', got '{other}'"),
        }
        .into()),
    }
}

/// PUT /v1/record/:id: partial record.
pub async fn modify(
    State(state): State<AppState>,
    Path(id_segment): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_segment)?;
    let body = json_body(body)?;
    let fields = Record::checker().parse_partial(&body)?;
    if fields.is_empty() {
        return Err(AppError::BadRequest("no recognized fields to update".into()));
    }
    let result = state.db.run(&update::<Record>(&fields, id)).await?;
    Ok(Json(result))
}

/// DELETE /v1/record/:id.
pub async fn remove(
    State(state): State<AppState>,
    Path(id_segment): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_segment)?;
    let result = state.db.run(&delete::<Record>(id)).await?;
    Ok(Json(result))
}
