//! Domin8 Core Library
//!
//! This crate provides the domain models, error types, configuration, and delivery
//! encryption shared by every Domin8 component.

pub mod config;
pub mod encryption;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, WatermarkServiceConfig};
pub use encryption::{DeliveryKey, EncryptedPayload, EncryptionError, SecureDeliveryWrapper};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    content_type_for_extension, AssetType, CompositionRequest, CompositionResult, FieldKind,
    Placement, Residency, Rgb, StorageMode, StoredOutputEntry, UploadedFile,
};
