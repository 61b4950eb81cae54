//! Configuration for the audio controller.

use serde::{Deserialize, Serialize};

use super::types::{DemodMode, Gain};

/// Defaults applied to requests that omit parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub default_mode: DemodMode,

    #[serde(default)]
    pub default_gain: Gain,

    #[serde(default)]
    pub default_squelch: u32,

    /// Output sample rate passed to the tuner (`-r`) and the sink.
    #[serde(default = "default_sample_rate")]
    pub default_sample_rate: u32,

    /// RTL-SDR device index (`-d`).
    #[serde(default)]
    pub device_index: u32,

    /// Frequency correction in ppm (`-p`), omitted when zero.
    #[serde(default)]
    pub ppm_correction: i32,
}

fn default_sample_rate() -> u32 {
    48_000
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            default_mode: DemodMode::default(),
            default_gain: Gain::default(),
            default_squelch: 0,
            default_sample_rate: default_sample_rate(),
            device_index: 0,
            ppm_correction: 0,
        }
    }
}
