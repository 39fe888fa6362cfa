use crate::error::HttpAppError;
use crate::middleware::RequestId;
use crate::services::pipeline::Submission;
use crate::state::AppState;
use crate::utils::upload::extract_fields;
use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Extension,
};
use domin8_core::{AppError, FieldKind};
use std::sync::Arc;

pub const ENCRYPTION_KEY_HEADER: &str = "X-Encryption-Key";

/// `POST /process`: watermark `file` with `logo` according to `type`
#[tracing::instrument(skip_all, fields(request_id = %request_id.0))]
pub async fn process(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let mut fields = extract_fields(multipart, state.config.max_upload_size_bytes()).await?;

    let asset = fields.take_file(FieldKind::Media.field_name());
    let logo = fields.take_file(FieldKind::Logo.field_name());
    let asset_type = fields.take_text("type");

    let (Some(asset), Some(logo), Some(asset_type)) = (asset, logo, asset_type) else {
        return Err(AppError::InvalidInput("Missing file, logo, or file type".to_string()).into());
    };

    tracing::info!(
        asset_type = %asset_type,
        asset_name = %asset.filename,
        asset_bytes = asset.data.len(),
        logo_bytes = logo.data.len(),
        "Processing request"
    );

    let delivery = state
        .pipeline
        .run(Submission {
            request_id: request_id.0.clone(),
            asset,
            logo,
            asset_type,
        })
        .await?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, delivery.content_type.as_str())
        .header(header::CONTENT_LENGTH, delivery.content_length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", delivery.filename),
        );

    if let Some(key) = &delivery.encryption_key {
        let value = HeaderValue::from_str(&key.to_base64())
            .map_err(|e| AppError::Internal(format!("Invalid key header: {}", e)))?;
        builder = builder.header(ENCRYPTION_KEY_HEADER, value);
    }

    builder
        .body(Body::from_stream(delivery.body))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError(AppError::Delivery(e.to_string()))
        })
}
