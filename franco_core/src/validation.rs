//! Input validation helpers shared by the subsystems.
//!
//! Each subsystem validates its own input structs with these helpers before
//! touching state; every failure is an [`Error::Validation`].

use crate::{Error, Result};
use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::RangeInclusive;

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid time regex"));

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color regex"));

/// Trimmed, non-empty text of at most `max` characters
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(format!("{} is required", field)));
    }
    check_length(field, value, max)?;
    Ok(value.to_string())
}

/// Optional text; blank input becomes `None`
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => {
            check_length(field, v, max)?;
            Ok(Some(v.to_string()))
        }
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::validation(format!(
            "{}: at most {} characters",
            field, max
        )));
    }
    Ok(())
}

pub fn int_in(field: &str, value: i64, range: RangeInclusive<i64>) -> Result<i64> {
    if !range.contains(&value) {
        return Err(Error::validation(format!(
            "{} must be between {} and {}",
            field,
            range.start(),
            range.end()
        )));
    }
    Ok(value)
}

/// Optional hour count within a single day
pub fn hours(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(h) if !(0.0..=24.0).contains(&h) => Err(Error::validation(format!(
            "{} must be between 0 and 24",
            field
        ))),
        other => Ok(other),
    }
}

pub fn non_negative(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !(v >= 0.0) => Err(Error::validation(format!(
            "{} cannot be negative",
            field
        ))),
        other => Ok(other),
    }
}

pub fn finite(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() => Err(Error::validation(format!("{} must be a number", field))),
        other => Ok(other),
    }
}

/// `HH:MM` on a 24h clock
pub fn clock_time(field: &str, value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    if !TIME_RE.is_match(value) {
        return Err(Error::validation(format!(
            "{}: invalid format, use HH:MM (e.g. 09:00)",
            field
        )));
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| Error::validation(format!("{}: {}", field, e)))
}

pub fn optional_clock_time(field: &str, value: Option<&str>) -> Result<Option<NaiveTime>> {
    value.map(|v| clock_time(field, v)).transpose()
}

/// `#rrggbb`
pub fn hex_color(value: &str) -> Result<String> {
    let value = value.trim();
    if !HEX_COLOR_RE.is_match(value) {
        return Err(Error::validation(
            "color must be a hex color (e.g. #3b82f6)",
        ));
    }
    Ok(value.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("title", "  Gym  ", 100).unwrap(), "Gym");
        assert!(required_text("title", "   ", 100).is_err());
        assert!(required_text("title", &"x".repeat(101), 100).is_err());
        assert!(required_text("title", &"ñ".repeat(100), 100).is_ok());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("notes", None, 10).unwrap(), None);
        assert_eq!(optional_text("notes", Some(" "), 10).unwrap(), None);
        assert_eq!(
            optional_text("notes", Some("ok"), 10).unwrap(),
            Some("ok".to_string())
        );
        assert!(optional_text("notes", Some("too long text"), 10).is_err());
    }

    #[test]
    fn test_clock_time() {
        assert_eq!(
            clock_time("time", "09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert!(clock_time("time", "24:00").is_err());
        assert!(clock_time("time", "9:30").is_err());
        assert!(clock_time("time", "09:60").is_err());
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#3B82F6").unwrap(), "#3b82f6");
        assert!(hex_color("3b82f6").is_err());
        assert!(hex_color("#3b82f").is_err());
    }

    #[test]
    fn test_numeric_ranges() {
        assert!(int_in("xp", 0, 1..=1000).is_err());
        assert_eq!(int_in("xp", 1000, 1..=1000).unwrap(), 1000);
        assert!(hours("sleep", Some(25.0)).is_err());
        assert_eq!(hours("sleep", Some(7.5)).unwrap(), Some(7.5));
        assert!(non_negative("income", Some(-1.0)).is_err());
        assert!(non_negative("income", Some(f64::NAN)).is_err());
        assert!(finite("savings", Some(f64::INFINITY)).is_err());
    }
}
