//! Application state shared by every handler

use crate::services::pipeline::PipelineOrchestrator;
use domin8_core::Config;
use domin8_processing::LogoPreprocessor;
use domin8_storage::{AssetStore, OutputCatalog};

pub struct AppState {
    pub config: Config,
    pub store: AssetStore,
    pub catalog: OutputCatalog,
    pub pipeline: PipelineOrchestrator,
    pub logo_preprocessor: LogoPreprocessor,
}
