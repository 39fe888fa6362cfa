//! Domin8 Storage Library
//!
//! On-disk residency for the watermarking pipeline. Uploaded inputs live in an
//! ephemeral namespace (one directory per multipart field kind) and are removed by
//! cleanup; produced outputs are promoted into a durable namespace and never expire.
//!
//! # Naming
//!
//! Inputs are stored as `<millis>-<token><.ext>` where `.ext` is a sanitised copy of the
//! uploader's extension. Names handed to the durable namespace must not contain `..`,
//! a path separator, or start with a dot. Name generation lives in the `names` module
//! so the store and the catalog agree on what a valid name is.

pub mod catalog;
pub mod error;
pub mod names;
pub mod store;

// Re-export commonly used types
pub use catalog::{OpenedOutput, OutputCatalog};
pub use error::{StorageError, StorageResult};
pub use store::AssetStore;
