//! Shared name generation and validation.
//!
//! Upload name format: `<millis>-<token><.ext>`.

use crate::{StorageError, StorageResult};
use rand::distr::Alphanumeric;
use rand::Rng;
use std::path::Path;

const TOKEN_LEN: usize = 8;
const MAX_EXTENSION_LEN: usize = 10;

/// Random lowercase alphanumeric token
pub fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Collision-resistant identifier: wall-clock millis plus a random token
pub fn unique_id() -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().timestamp_millis(),
        random_token(TOKEN_LEN)
    )
}

/// Extension of an untrusted filename, kept only if it is short and alphanumeric
pub fn sanitize_extension(original_filename: &str) -> Option<String> {
    Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= MAX_EXTENSION_LEN)
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
}

/// Name for a freshly uploaded input
pub fn upload_name(original_filename: &str) -> String {
    match sanitize_extension(original_filename) {
        Some(ext) => format!("{}.{}", unique_id(), ext),
        None => unique_id(),
    }
}

/// Reject names that could escape their directory or collide with hidden entries
pub fn validate_name(name: &str) -> StorageResult<()> {
    if name.is_empty()
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
        || name.starts_with('.')
    {
        return Err(StorageError::InvalidName(format!(
            "'{}' is not a valid file name",
            name
        )));
    }
    Ok(())
}
