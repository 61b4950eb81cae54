//! Error types for per-medium probes.

use thiserror::Error;

use crate::process::ProcessError;

use super::types::Medium;

/// Failure of one medium's probe within a cycle.
///
/// These never leave the coordinator; they are logged and counted.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The tool failed to run, timed out, or exited non-zero.
    #[error("{medium} probe failed: {source}")]
    Process {
        medium: Medium,
        #[source]
        source: ProcessError,
    },

    /// The tool ran but its output could not be understood.
    #[error("{medium} output could not be parsed: {message}")]
    Parse { medium: Medium, message: String },

    /// Every source for the medium failed.
    #[error("no {medium} source succeeded: {reasons}")]
    NoSource { medium: Medium, reasons: String },
}

impl ScanError {
    pub fn process(medium: Medium, source: ProcessError) -> Self {
        Self::Process { medium, source }
    }

    pub fn parse(medium: Medium, message: impl Into<String>) -> Self {
        Self::Parse {
            medium,
            message: message.into(),
        }
    }

    pub fn medium(&self) -> Medium {
        match self {
            Self::Process { medium, .. } | Self::Parse { medium, .. } | Self::NoSource { medium, .. } => {
                *medium
            }
        }
    }
}
