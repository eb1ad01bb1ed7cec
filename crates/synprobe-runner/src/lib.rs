//! Synprobe runner
//!
//! Drives the payload pipeline against a model under test:
//! - [`executor`]: query submission with bounded retry
//! - [`continuation`]: resuming after the last stored sentence
//! - [`orchestrator`]: the per-sentence workflow over a seed file
//! - [`config`]: layered configuration for the `synprobe` binary

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod continuation;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod seeds;
pub mod session;

pub use config::RunnerConfig;
pub use continuation::{find_resume_point, ResumeFilter};
pub use error::{RunnerError, RunnerResult};
pub use executor::{
    Execution, ExecutionFailure, HttpModelClient, ModelClient, ModelResponse, QueryExecutor,
    TransportError,
};
pub use orchestrator::{Orchestrator, RunSummary, SentenceOutcome};
pub use seeds::{parse_seeds, SeedReader};
pub use session::{PromptSettings, SessionSettings};
