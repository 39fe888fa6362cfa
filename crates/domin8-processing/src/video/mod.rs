pub mod overlay;

pub use overlay::VideoOverlay;
