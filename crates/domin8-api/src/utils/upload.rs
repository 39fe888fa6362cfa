//! Multipart extraction shared by the upload handlers

use crate::error::HttpAppError;
use axum::extract::Multipart;
use bytes::{Bytes, BytesMut};
use domin8_core::AppError;
use std::collections::HashMap;

/// One file part of a multipart body, still untrusted
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// File parts and text parts of a multipart body, keyed by field name
#[derive(Debug, Default)]
pub struct MultipartFields {
    files: HashMap<String, RawUpload>,
    texts: HashMap<String, String>,
}

impl MultipartFields {
    pub fn take_file(&mut self, name: &str) -> Option<RawUpload> {
        self.files.remove(name)
    }

    /// Trimmed, non-empty text value
    pub fn take_text(&mut self, name: &str) -> Option<String> {
        self.texts
            .remove(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Read every field of a multipart body.
/// A part with a filename is a file; anything else is text. Repeating a file field is rejected,
/// as is any file larger than `max_file_bytes`.
pub async fn extract_fields(
    mut multipart: Multipart,
    max_file_bytes: usize,
) -> Result<MultipartFields, HttpAppError> {
    let mut fields = MultipartFields::default();

    while let Some(mut field) = multipart.next_field().await? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if let Some(filename) = field.file_name().map(|s| s.to_string()) {
            if fields.files.contains_key(&field_name) {
                return Err(AppError::InvalidInput(format!(
                    "Multiple '{}' fields are not allowed",
                    field_name
                ))
                .into());
            }
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());

            // Stop reading as soon as the part crosses the cap
            let mut buffer = BytesMut::new();
            while let Some(chunk) = field.chunk().await? {
                validate_file_size(buffer.len() + chunk.len(), max_file_bytes)?;
                buffer.extend_from_slice(&chunk);
            }
            let data = buffer.freeze();

            tracing::debug!(
                field = %field_name,
                filename = %filename,
                content_type = %content_type,
                size_bytes = data.len(),
                "Received file part"
            );

            fields.files.insert(
                field_name,
                RawUpload {
                    filename,
                    content_type,
                    data,
                },
            );
        } else {
            let value = field.text().await?;
            fields.texts.insert(field_name, value);
        }
    }

    Ok(fields)
}
