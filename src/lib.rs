pub mod app_state;
pub mod error;
pub mod github;
pub mod payloads;
pub mod trigger;

pub use app_state::{build_app_state, AppState, FailurePolicy};
pub use error::{ConfigError, GithubError, Stage, TriggerError};
pub use payloads::WorkflowPayloads;
pub use trigger::{run, run_with_clock, RunReport};
