//! Error types for the audio controller.

use thiserror::Error;

/// Errors that can occur while managing an audio session.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Request parameters are out of range.
    #[error("invalid audio request: {0}")]
    InvalidRequest(String),

    /// A required tool is missing; the message names the package to install.
    #[error("{tool} not found; install it with: sudo apt-get install -y {package}")]
    MissingTool { tool: String, package: String },

    /// No audio output program is installed.
    #[error("no audio sink found (aplay or play); install it with: sudo apt-get install -y alsa-utils (or sox)")]
    NoSink,

    /// The pipeline could not be started.
    #[error("failed to start audio pipeline: {0}")]
    SpawnFailed(String),

    /// I/O error while talking to the pipeline.
    #[error("audio pipeline I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AudioError {
    pub fn missing_tool(tool: &str) -> Self {
        Self::MissingTool {
            tool: tool.to_string(),
            package: crate::capabilities::package_for(tool)
                .unwrap_or("rtl-sdr")
                .to_string(),
        }
    }

    /// Whether this error is a missing-tool precondition.
    pub fn is_missing_tool(&self) -> bool {
        matches!(self, Self::MissingTool { .. } | Self::NoSink)
    }
}
