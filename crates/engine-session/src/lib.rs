//! UCI engine analysis session.
//!
//! One [`AnalysisSession`] drives one engine instance. Requests are strictly
//! ordered (`stop` before `position` before `go`), a new request supersedes
//! the previous one, and output from a superseded search never reaches the
//! new request's stream.

pub mod analysis;
pub mod config;
pub mod error;
pub mod process;
pub mod session;
pub mod uci;

pub use analysis::{EngineAnalysis, ProgressPolicy};
pub use config::EngineConfig;
pub use error::EngineError;
pub use process::{EngineChannels, EngineEndpoint, EngineProcess};
pub use session::{
    AnalysisEvent, AnalysisHandle, AnalysisOutcome, AnalysisSession, Completion, EngineStatus,
    SessionSettings,
};
pub use uci::{EngineCommand, EngineEvent, InfoLine, Score};
