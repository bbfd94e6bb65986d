//! ISO 8601 duration parsing (`PT1H2M10S`, `P1DT30M`, `PT0.5S`, ...).
//!
//! `try_parse` reports why a value could not be read; `parse` collapses every
//! failure to `0` for callers that only need a best-effort length.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^P(?:(?P<years>\d+(?:[.,]\d+)?)Y)?(?:(?P<months>\d+(?:[.,]\d+)?)M)?(?:(?P<weeks>\d+(?:[.,]\d+)?)W)?(?:(?P<days>\d+(?:[.,]\d+)?)D)?(?:T(?:(?P<hours>\d+(?:[.,]\d+)?)H)?(?:(?P<minutes>\d+(?:[.,]\d+)?)M)?(?:(?P<seconds>\d+(?:[.,]\d+)?)S)?)?$",
    )
    .expect("valid duration regex")
});

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_WEEK: f64 = 604_800.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("duration is empty")]
    Empty,
    #[error("malformed duration: {0:?}")]
    Malformed(String),
    /// Calendar units have no fixed length in seconds.
    #[error("unsupported unit {unit} in duration {text:?}")]
    UnsupportedUnit { unit: &'static str, text: String },
}

/// Parse an ISO 8601 duration into whole seconds, truncating any fraction.
pub fn try_parse(text: &str) -> Result<u64, DurationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DurationError::Empty);
    }
    // "P" / "PT" / "P1DT" carry no time component after the designator.
    if text.ends_with('P') || text.ends_with('T') {
        return Err(DurationError::Malformed(text.to_string()));
    }
    let caps = ISO_DURATION
        .captures(text)
        .ok_or_else(|| DurationError::Malformed(text.to_string()))?;

    for (name, unit) in [("years", "Y"), ("months", "M")] {
        if component(&caps, name)?.unwrap_or(0.0) != 0.0 {
            return Err(DurationError::UnsupportedUnit {
                unit,
                text: text.to_string(),
            });
        }
    }

    let mut total = 0.0;
    for (name, factor) in [
        ("weeks", SECONDS_PER_WEEK),
        ("days", SECONDS_PER_DAY),
        ("hours", SECONDS_PER_HOUR),
        ("minutes", SECONDS_PER_MINUTE),
        ("seconds", 1.0),
    ] {
        if let Some(value) = component(&caps, name)? {
            total += value * factor;
        }
    }
    Ok(total.trunc() as u64)
}

/// Best-effort variant of [`try_parse`]: any failure yields `0`.
///
/// A zero result is ambiguous between an instantaneous duration and an
/// unreadable one; use [`try_parse`] when the difference matters.
pub fn parse(text: &str) -> u64 {
    try_parse(text).unwrap_or(0)
}

fn component(caps: &Captures<'_>, name: &str) -> Result<Option<f64>, DurationError> {
    let Some(m) = caps.name(name) else {
        return Ok(None);
    };
    m.as_str()
        .replace(',', ".")
        .parse::<f64>()
        .map(Some)
        .map_err(|_| DurationError::Malformed(m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hours_minutes_seconds() {
        assert_eq!(parse("PT1H2M10S"), 3732);
        assert_eq!(parse("PT45S"), 45);
        assert_eq!(parse("PT15M"), 15 * 60);
    }

    #[test]
    fn parses_days_and_weeks() {
        assert_eq!(parse("P1DT1S"), 86_401);
        assert_eq!(parse("P2W"), 2 * 604_800);
        assert_eq!(parse("P0D"), 0);
    }

    #[test]
    fn truncates_fractional_seconds() {
        assert_eq!(parse("PT1.9S"), 1);
        assert_eq!(parse("PT0,5M"), 30);
        assert_eq!(try_parse("PT59.999S"), Ok(59));
    }

    #[test]
    fn empty_and_garbage_default_to_zero() {
        assert_eq!(parse(""), 0);
        assert_eq!(parse("garbage"), 0);
        assert_eq!(try_parse("   "), Err(DurationError::Empty));
        assert!(matches!(try_parse("garbage"), Err(DurationError::Malformed(_))));
    }

    #[test]
    fn bare_designators_are_malformed() {
        for text in ["P", "PT", "P1DT", "-PT5S", "PT5H3H"] {
            assert!(
                matches!(try_parse(text), Err(DurationError::Malformed(_))),
                "{text} should be malformed"
            );
        }
    }

    #[test]
    fn calendar_units_are_unsupported() {
        assert!(matches!(
            try_parse("P1Y"),
            Err(DurationError::UnsupportedUnit { unit: "Y", .. })
        ));
        assert!(matches!(
            try_parse("P2MT1S"),
            Err(DurationError::UnsupportedUnit { unit: "M", .. })
        ));
        assert_eq!(parse("P1Y"), 0);
        // A zero calendar component is harmless.
        assert_eq!(parse("P0YT5S"), 5);
    }

    #[test]
    fn distinguishes_zero_from_failure() {
        assert_eq!(try_parse("PT0S"), Ok(0));
        assert!(try_parse("PT?S").is_err());
    }
}
