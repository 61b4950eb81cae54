use crate::audio::{MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - SDR bin width is positive and every band is a non-empty range
/// - Default audio sample rate is within the accepted range
/// - Ingest URL and batch size, when configured
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.scanner.sdr_bin_width_hz == 0 {
        return Err(ConfigError::ValidationError(
            "scanner.sdr_bin_width_hz must be positive".to_string(),
        ));
    }

    for band in &config.scanner.sdr_bands {
        if band.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "scanner.sdr_bands entries need a name".to_string(),
            ));
        }
        if band.start_hz >= band.end_hz {
            return Err(ConfigError::ValidationError(format!(
                "scanner.sdr_bands '{}': start_hz must be below end_hz",
                band.name
            )));
        }
    }

    let rate = config.audio.default_sample_rate;
    if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&rate) {
        return Err(ConfigError::ValidationError(format!(
            "audio.default_sample_rate {} outside {}..={}",
            rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
        )));
    }

    if let Some(ingest) = &config.ingest {
        if ingest.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ingest.url cannot be empty".to_string(),
            ));
        }
        if ingest.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.batch_size must be positive".to_string(),
            ));
        }
    }

    Ok(())
}
