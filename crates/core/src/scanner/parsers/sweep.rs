//! `rtl_power` CSV rows.
//!
//! Row layout: `date, time, low_hz, high_hz, step_hz, samples, dB, dB, ...`.

use crate::identify::identify_frequency;
use crate::scanner::types::SdrSignal;

use super::ParseError;

const LOW_FIELD: usize = 2;
const STEP_FIELD: usize = 4;
const FIRST_POWER_FIELD: usize = 6;

/// Label given to bins that match no known allocation.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Extracts every bin above `threshold_dbfs`.
///
/// Unidentified bins are labelled [`UNKNOWN_LABEL`] with `band_name` as
/// their band. Fails only when the output has rows and none of them parse.
pub fn parse_sweep(
    output: &str,
    band_name: &str,
    threshold_dbfs: f64,
) -> Result<Vec<SdrSignal>, ParseError> {
    let mut signals = Vec::new();
    let mut rows = 0usize;
    let mut bad_rows = 0usize;

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        rows += 1;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let header = (
            fields.get(LOW_FIELD).and_then(|f| parse_hz(f)),
            fields.get(STEP_FIELD).and_then(|f| parse_hz(f)),
        );
        let (Some(low_hz), Some(step_hz)) = header else {
            bad_rows += 1;
            continue;
        };
        if fields.len() <= FIRST_POWER_FIELD {
            bad_rows += 1;
            continue;
        }

        for (i, power) in fields[FIRST_POWER_FIELD..].iter().enumerate() {
            let Ok(power_dbfs) = power.parse::<f64>() else {
                continue;
            };
            if power_dbfs.is_nan() || power_dbfs <= threshold_dbfs {
                continue;
            }
            let frequency_hz = low_hz + i as u64 * step_hz;
            let (label, band) = match identify_frequency(frequency_hz as f64 / 1e6) {
                Some(id) => (id.label, id.band),
                None => (UNKNOWN_LABEL.to_string(), band_name.to_string()),
            };
            signals.push(SdrSignal {
                frequency_hz,
                power_dbfs,
                bandwidth_hz: step_hz,
                label,
                band,
            });
        }
    }

    if rows > 0 && bad_rows == rows {
        return Err(ParseError::new(format!(
            "no valid rtl_power rows in {} line(s)",
            rows
        )));
    }
    Ok(signals)
}

/// Hz values are integers, but some builds print them as floats.
fn parse_hz(field: &str) -> Option<u64> {
    field
        .parse::<u64>()
        .ok()
        .or_else(|| {
            field
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v.round() as u64)
        })
}
