use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::extract_fields;
use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
};
use domin8_core::{AppError, FieldKind, Residency, Rgb, UploadedFile};
use domin8_processing::CompositionValidator;
use std::sync::Arc;

/// `POST /logo/transparent`: make the logo's background colour transparent.
///
/// The colour comes from the `background` field, then from configuration, then white.
#[tracing::instrument(skip_all)]
pub async fn make_transparent(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut fields = extract_fields(multipart, state.config.max_upload_size_bytes()).await?;

    let logo = fields
        .take_file(FieldKind::Logo.field_name())
        .ok_or_else(|| AppError::InvalidInput("Missing logo".to_string()))?;

    let background = match fields.take_text("background") {
        Some(value) => value
            .parse::<Rgb>()
            .map_err(AppError::InvalidInput)?,
        None => state.config.logo_background().unwrap_or(Rgb::WHITE),
    };

    let upload = UploadedFile {
        field: FieldKind::Logo,
        original_filename: logo.filename,
        content_type: logo.content_type,
        size: logo.data.len() as u64,
        residency: Residency::Memory(logo.data.clone()),
    };
    if upload.size == 0 {
        return Err(AppError::InvalidInput("Empty file in field 'logo'".to_string()).into());
    }
    CompositionValidator::new().validate_logo(&upload)?;

    let png = state.logo_preprocessor.process(logo.data, background).await?;

    tracing::info!(
        input_bytes = upload.size,
        output_bytes = png.len(),
        "Logo background removed"
    );

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
