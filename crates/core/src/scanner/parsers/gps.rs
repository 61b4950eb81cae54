//! `gpspipe -w` JSON lines.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::scanner::types::GpsFix;

use super::ParseError;

/// Extracts a fix from gpsd watch output.
///
/// The first `TPV` record with `lat`/`lon` wins; any other record carrying a
/// position is used only if no TPV has one. Accuracy is the larger of
/// `epx`/`epy`, then `eph`, then `default_accuracy_meters`.
pub fn parse_gpspipe(output: &str, default_accuracy_meters: f64) -> Result<GpsFix, ParseError> {
    let mut fallback: Option<GpsFix> = None;

    for line in output.lines().map(str::trim).filter(|l| l.starts_with('{')) {
        let Ok(record) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        let Some(fix) = fix_from_record(&record, default_accuracy_meters) else {
            continue;
        };
        if record.get("class").and_then(Value::as_str) == Some("TPV") {
            return Ok(fix);
        }
        if fallback.is_none() {
            fallback = Some(fix);
        }
    }

    fallback.ok_or_else(|| ParseError::new("no record with lat/lon in gpspipe output"))
}

fn fix_from_record(record: &Value, default_accuracy_meters: f64) -> Option<GpsFix> {
    let number = |key: &str| record.get(key).and_then(Value::as_f64).filter(|v| v.is_finite());

    let latitude = number("lat")?;
    let longitude = number("lon")?;

    let accuracy_meters = match (number("epx"), number("epy")) {
        (Some(x), Some(y)) => x.max(y),
        (Some(e), None) | (None, Some(e)) => e,
        (None, None) => number("eph").unwrap_or(default_accuracy_meters),
    };

    let timestamp_ms = record
        .get("time")
        .and_then(Value::as_str)
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.timestamp_millis())
        .unwrap_or_else(|| Utc::now().timestamp_millis());

    Some(GpsFix {
        latitude,
        longitude,
        altitude: number("altMSL").or_else(|| number("alt")),
        speed: number("speed"),
        heading: number("track"),
        accuracy_meters,
        timestamp_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_tpv() {
        let output = r#"{"class":"VERSION","release":"3.22"}
{"class":"SKY","lat":1.0,"lon":1.0}
{"class":"TPV","mode":3,"time":"2024-05-01T12:00:00.000Z","lat":51.5007,"lon":-0.1246,"alt":35.2,"speed":1.5,"track":270.0,"epx":4.5,"epy":6.0}
"#;
        let fix = parse_gpspipe(output, 10.0).unwrap();
        assert_eq!(fix.latitude, 51.5007);
        assert_eq!(fix.longitude, -0.1246);
        assert_eq!(fix.altitude, Some(35.2));
        assert_eq!(fix.speed, Some(1.5));
        assert_eq!(fix.heading, Some(270.0));
        assert_eq!(fix.accuracy_meters, 6.0);
        assert_eq!(fix.timestamp_ms, 1_714_564_800_000);
    }

    #[test]
    fn test_falls_back_to_any_positioned_record() {
        let output = "{\"class\":\"TPV\",\"mode\":1}\n{\"class\":\"GST\",\"lat\":10.0,\"lon\":20.0}\n";
        let fix = parse_gpspipe(output, 25.0).unwrap();
        assert_eq!(fix.latitude, 10.0);
        assert_eq!(fix.accuracy_meters, 25.0);
        assert!(fix.altitude.is_none());
    }

    #[test]
    fn test_no_fix_is_error() {
        assert!(parse_gpspipe("", 10.0).is_err());
        assert!(parse_gpspipe("{\"class\":\"TPV\",\"mode\":1}\nnot json\n", 10.0).is_err());
    }
}
