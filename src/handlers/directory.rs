//! Person and course handlers. The two tables share a shape, so create,
//! update, and delete are generic over the table marker; the by-id reads
//! differ in which related rows they attach.

use crate::error::AppError;
use crate::handlers::{json_body, parse_id};
use crate::sql::{delete, insert, select_all, update};
use crate::state::AppState;
use crate::store::Database;
use crate::tables::{Course, Person, Table};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

/// POST /v1/{table}: body is a JSON array of rows; one multi-row INSERT.
pub async fn create<T: Table>(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = json_body(body)?;
    let rows = T::checker().parse_array(&body)?;
    if rows.is_empty() {
        return Err(AppError::BadRequest("expected at least one row".into()));
    }
    let result = state.db.run(&insert::<T>(&rows)).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// PUT /v1/{table}/:id: partial row; only recognized fields are set.
pub async fn modify<T: Table>(
    State(state): State<AppState>,
    Path(id_segment): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_segment)?;
    let body = json_body(body)?;
    let fields = T::checker().parse_partial(&body)?;
    if fields.is_empty() {
        return Err(AppError::BadRequest("no recognized fields to update".into()));
    }
    let result = state.db.run(&update::<T>(&fields, id)).await?;
    Ok(Json(result))
}

/// DELETE /v1/{table}/:id. Deleting an absent row reports zero changes.
pub async fn remove<T: Table>(
    State(state): State<AppState>,
    Path(id_segment): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_segment)?;
    let result = state.db.run(&delete::<T>(id)).await?;
    Ok(Json(result))
}

/// GET /v1/person/:id: the person plus family lowers, family uppers, and
/// signed-up courses. All four reads run inside one transaction so they
/// observe a single point in time.
pub async fn read_person(
    State(state): State<AppState>,
    Path(id_segment): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_segment)?;
    let mut tx = state.db.begin().await?;
    let person = Database::row_tx(&mut tx, &select_all::<Person>().by_id(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("person {id}")))?;
    let lowers =
        Database::rows_tx(&mut tx, &select_all::<Person>().lowers_of(id).into_statement()).await?;
    let uppers =
        Database::rows_tx(&mut tx, &select_all::<Person>().uppers_of(id).into_statement()).await?;
    let signups =
        Database::rows_tx(&mut tx, &select_all::<Course>().taken_by(id).into_statement()).await?;
    tx.commit().await?;
    Ok(Json(json!({
        "person": person,
        "lowers": lowers,
        "uppers": uppers,
        "signups": signups,
    })))
}

/// GET /v1/course/:id: the course plus the persons signed up for it.
pub async fn read_course(
    State(state): State<AppState>,
    Path(id_segment): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_segment)?;
    let mut tx = state.db.begin().await?;
    let course = Database::row_tx(&mut tx, &select_all::<Course>().by_id(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {id}")))?;
    let signups =
        Database::rows_tx(&mut tx, &select_all::<Person>().enrolled_in(id).into_statement())
            .await?;
    tx.commit().await?;
    Ok(Json(json!({
        "course": course,
        "signups": signups,
    })))
}
