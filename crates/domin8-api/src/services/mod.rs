pub mod delivery;
pub mod pipeline;

pub use delivery::{CleanupGuard, DeliveryStream};
pub use pipeline::{Delivery, PipelineOrchestrator, PipelineSettings, PipelineState, Submission};
