//! SDR audio demodulation controller.
//!
//! Runs an `rtl_fm` → `aplay`/`play` pipeline on demand. One supervisor task
//! owns each session's processes and resets the shared audio state when the
//! pipeline exits on its own.

mod config;
mod controller;
mod error;
mod pipeline;
mod types;

pub use config::AudioConfig;
pub use controller::{
    AudioController, MAX_FREQUENCY_HZ, MAX_SAMPLE_RATE, MIN_FREQUENCY_HZ, MIN_SAMPLE_RATE,
};
pub use error::AudioError;
pub use pipeline::{
    AudioBackend, AudioSettings, PipelineExit, PipelinePlan, PipelineProcess, ProcessAudioBackend,
    StageCommand,
};
pub use types::{AudioRequest, AudioSessionState, AudioSink, DemodMode, Gain, TuneRequest};
