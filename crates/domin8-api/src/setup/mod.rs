//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::services::pipeline::{PipelineOrchestrator, PipelineSettings};
use crate::state::AppState;
use anyhow::{Context, Result};
use domin8_core::Config;
use domin8_processing::{CompositionEngine, LogoPreprocessor};
use domin8_storage::{AssetStore, OutputCatalog};
use std::sync::Arc;

/// Initialize the entire application: telemetry, directories, state and routes
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())?;
    crate::error::set_production_mode(config.is_production());

    tracing::info!(
        environment = %config.environment(),
        storage_mode = ?config.storage_mode(),
        cleanup_files = config.cleanup_files(),
        delivery_encryption = config.delivery_encryption(),
        "Configuration loaded and validated successfully"
    );

    build_app(config).await
}

/// Build state and router without touching global tracing state
pub async fn build_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let store = AssetStore::from_config(&config);
    // Directories must exist before the listener binds
    store.bootstrap().await;

    let engine = Arc::new(CompositionEngine::from_config(&config));
    let pipeline = PipelineOrchestrator::new(
        PipelineSettings::from_config(&config),
        store.clone(),
        engine,
    );

    let state = Arc::new(AppState {
        catalog: OutputCatalog::new(store.output_dir()),
        store,
        pipeline,
        logo_preprocessor: LogoPreprocessor::new(),
        config,
    });

    let router = routes::setup_routes(&state.config, state.clone())?;
    Ok((state, router))
}
