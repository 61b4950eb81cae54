//! External process execution.
//!
//! Every tool the orchestrator shells out to goes through the [`CommandRunner`]
//! trait, so scanners and the capability prober can be driven by a mock in tests.

mod error;
mod runner;

pub use error::ProcessError;
pub use runner::{
    find_on_path, CommandOutput, CommandRequest, CommandRunner, SystemRunner, TimeoutPolicy,
};
