//! Terminal PGN viewer: document ownership, platform import and the
//! interactive driver's building blocks.

pub mod clients;
pub mod config;
pub mod document;
pub mod error;
pub mod sample;

pub use config::ViewerConfig;
pub use document::{DetectedOpening, Document};
pub use error::ImportError;
pub use sample::SAMPLE_PGN;
