use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use domin8_core::{AppError, StoredOutputEntry};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

/// `GET /outputs/list`
pub async fn list_outputs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoredOutputEntry>>, HttpAppError> {
    let outputs = state.catalog.list().await?;
    tracing::debug!(count = outputs.len(), "Listed outputs");
    Ok(Json(outputs))
}

/// `GET /outputs/{name}`
pub async fn get_output(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, HttpAppError> {
    let opened = state.catalog.open(&name).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, opened.content_type)
        .header(header::CONTENT_LENGTH, opened.size)
        .body(Body::from_stream(ReaderStream::new(opened.file)))
        .map_err(|e| {
            tracing::error!(error = %e, name = %name, "Failed to build response");
            HttpAppError(AppError::Delivery(e.to_string()))
        })
}
