//! Audio session types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Demodulation scheme used to recover audio from the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemodMode {
    /// Narrowband FM (voice, two-way radio).
    #[default]
    Nfm,
    /// Wideband FM (broadcast).
    Wfm,
    Am,
    /// Upper sideband.
    Usb,
    /// Lower sideband.
    Lsb,
    /// Undemodulated IQ.
    Raw,
}

impl DemodMode {
    pub const ALL: [DemodMode; 6] = [
        DemodMode::Nfm,
        DemodMode::Wfm,
        DemodMode::Am,
        DemodMode::Usb,
        DemodMode::Lsb,
        DemodMode::Raw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DemodMode::Nfm => "nfm",
            DemodMode::Wfm => "wfm",
            DemodMode::Am => "am",
            DemodMode::Usb => "usb",
            DemodMode::Lsb => "lsb",
            DemodMode::Raw => "raw",
        }
    }

    /// Value for the tuner's `-M` flag.
    pub fn modulation(&self) -> &'static str {
        match self {
            DemodMode::Nfm => "fm",
            DemodMode::Wfm => "wbfm",
            DemodMode::Am => "am",
            DemodMode::Usb => "usb",
            DemodMode::Lsb => "lsb",
            DemodMode::Raw => "raw",
        }
    }

    /// Intermediate sample rate for the tuner's `-s` flag.
    pub fn intermediate_rate(&self) -> u32 {
        match self {
            DemodMode::Nfm | DemodMode::Am => 12_000,
            DemodMode::Wfm => 170_000,
            DemodMode::Usb | DemodMode::Lsb => 6_000,
            DemodMode::Raw => 24_000,
        }
    }
}

impl fmt::Display for DemodMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DemodMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        DemodMode::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| format!("unknown demodulation mode: {}", s))
    }
}

/// Tuner gain: automatic or a fixed value in dB.
///
/// Serialized as `"auto"` or a number.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "GainRepr", into = "GainRepr")]
pub enum Gain {
    #[default]
    Auto,
    Db(f32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum GainRepr {
    Number(f32),
    Text(String),
}

impl TryFrom<GainRepr> for Gain {
    type Error = String;

    fn try_from(repr: GainRepr) -> Result<Self, Self::Error> {
        match repr {
            GainRepr::Number(db) => Ok(Gain::Db(db)),
            GainRepr::Text(text) => text.parse(),
        }
    }
}

impl From<Gain> for GainRepr {
    fn from(gain: Gain) -> Self {
        match gain {
            Gain::Auto => GainRepr::Text("auto".to_string()),
            Gain::Db(db) => GainRepr::Number(db),
        }
    }
}

impl FromStr for Gain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Gain::Auto);
        }
        s.parse::<f32>()
            .ok()
            .filter(|db| db.is_finite())
            .map(Gain::Db)
            .ok_or_else(|| format!("invalid gain: {}", s))
    }
}

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gain::Auto => f.write_str("auto"),
            Gain::Db(db) => write!(f, "{}", db),
        }
    }
}

/// Parameters for a new audio session. Omitted fields use config defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioRequest {
    pub frequency_hz: u64,
    #[serde(default)]
    pub mode: Option<DemodMode>,
    #[serde(default)]
    pub gain: Option<Gain>,
    #[serde(default)]
    pub squelch: Option<u32>,
    #[serde(default)]
    pub sample_rate: Option<u32>,
}

impl AudioRequest {
    pub fn new(frequency_hz: u64) -> Self {
        Self {
            frequency_hz,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: DemodMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_gain(mut self, gain: Gain) -> Self {
        self.gain = Some(gain);
        self
    }

    pub fn with_squelch(mut self, squelch: u32) -> Self {
        self.squelch = Some(squelch);
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }
}

/// Retune parameters; omitted fields keep the current session's values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TuneRequest {
    pub frequency_hz: u64,
    #[serde(default)]
    pub mode: Option<DemodMode>,
    #[serde(default)]
    pub gain: Option<Gain>,
    #[serde(default)]
    pub squelch: Option<u32>,
}

/// Audio output program fed by the tuner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSink {
    Aplay,
    Play,
}

impl AudioSink {
    pub fn program(&self) -> &'static str {
        match self {
            AudioSink::Aplay => crate::capabilities::APLAY,
            AudioSink::Play => crate::capabilities::SOX_PLAY,
        }
    }
}

/// Live audio sub-state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioSessionState {
    pub active: bool,
    pub frequency_hz: Option<u64>,
    pub mode: Option<DemodMode>,
    pub gain: Option<Gain>,
    pub squelch: u32,
    pub sample_rate: Option<u32>,
    pub sink: Option<AudioSink>,
    /// Process id of the tuner.
    pub pid: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    /// Remediation or exit message from the last failed or ended session.
    pub error: Option<String>,
}

impl AudioSessionState {
    /// Inactive state carrying an error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}
