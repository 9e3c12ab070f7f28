//! Route handlers for the mold-change API.

use super::AppState;
use crate::errors::AppError;
use crate::models::mold_change::{MoldChangePatch, NewMoldChange};
use crate::store::Claim;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::Json(_)
            | AppError::InvalidDate(_)
            | AppError::InvalidLine(_)
            | AppError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            AppError::ActiveChangeExists(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }

        json_error(status, &self.to_string())
    }
}

/// Parse a JSON body by hand so malformed input is a 400 with our error shape.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("request body is empty".into()));
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Fallback handler for unmatched routes.
pub(crate) async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /mold-changes
pub(crate) async fn list_changes(State(state): State<AppState>) -> Result<Response, AppError> {
    let records = state.store.list().await?;
    Ok(Json(records).into_response())
}

/// POST /mold-changes
pub(crate) async fn create_change(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let change: NewMoldChange = parse_body(&body)?;
    let rec = state.store.create(change).await?;
    tracing::info!(id = %rec.id, line = %rec.line, "mold change created");
    Ok((StatusCode::CREATED, Json(rec)).into_response())
}

/// POST /mold-changes/claim
pub(crate) async fn claim_change(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let change: NewMoldChange = parse_body(&body)?;
    match state.store.claim(change).await? {
        Claim::Created(rec) => {
            tracing::info!(id = %rec.id, line = %rec.line, "mold change claimed");
            Ok((StatusCode::CREATED, Json(rec)).into_response())
        }
        Claim::Existing(rec) => Ok((StatusCode::CONFLICT, Json(rec)).into_response()),
    }
}

/// PATCH /mold-changes/{id}
pub(crate) async fn update_change(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let patch: MoldChangePatch = parse_body(&body)?;
    if patch.is_empty() {
        return Err(AppError::BadRequest("no fields to update".into()));
    }
    let rec = state.store.update(&id, patch).await?;
    tracing::info!(id = %rec.id, status = %rec.status, "mold change updated");
    Ok(Json(rec).into_response())
}

/// DELETE /mold-changes/{id}
pub(crate) async fn delete_change(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete(&id).await?;
    tracing::info!(%id, "mold change deleted");
    Ok(StatusCode::NO_CONTENT)
}
