//! Time-of-day normalization.
//!
//! Accepts either 12-hour (`8:00pm`, `8:00 PM`) or 24-hour (`20:00`) input and produces a
//! zero-padded 24-hour [`ClockTime`].

use std::fmt;

use chrono::{NaiveTime, Timelike};

use crate::error::TimeError;

/// A canonical time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Zero-padded 24-hour `HH:MM`.
    pub fn hhmm(&self) -> String {
        self.0.format("%H:%M").to_string()
    }

    /// Minutes since midnight, `0..=1439`.
    pub fn minutes(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// Parse a time-of-day string into a [`ClockTime`].
///
/// The 12-hour form is tried first on the trimmed, lowercased input with all spaces
/// removed. If that fails, the trimmed input is parsed as strict 24-hour `HH:MM`.
/// Out-of-range clock digits are a parse failure, never clamped.
pub fn normalize_time(raw: &str) -> Result<ClockTime, TimeError> {
    let trimmed = raw.trim();
    let compact: String = trimmed
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    NaiveTime::parse_from_str(&compact, "%I:%M%p")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map(ClockTime)
        .map_err(|_| TimeError::InvalidTimeFormat {
            raw: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::normalize_time;
    use crate::error::TimeError;

    fn norm(s: &str) -> (String, u32) {
        let t = normalize_time(s).unwrap();
        (t.hhmm(), t.minutes())
    }

    #[test]
    fn twelve_hour_inputs() {
        assert_eq!(norm("8:00pm"), ("20:00".to_string(), 1200));
        assert_eq!(norm("12:00am"), ("00:00".to_string(), 0));
        assert_eq!(norm("12:30pm"), ("12:30".to_string(), 750));
        assert_eq!(norm("11:59pm"), ("23:59".to_string(), 1439));
        assert_eq!(norm("9:05am"), ("09:05".to_string(), 545));
    }

    #[test]
    fn twelve_hour_tolerates_case_and_spaces() {
        assert_eq!(norm(" 8:00 PM "), ("20:00".to_string(), 1200));
        assert_eq!(norm("8:00 Pm"), ("20:00".to_string(), 1200));
    }

    #[test]
    fn twenty_four_hour_inputs() {
        assert_eq!(norm("20:00"), ("20:00".to_string(), 1200));
        assert_eq!(norm("00:00"), ("00:00".to_string(), 0));
        assert_eq!(norm(" 7:30 "), ("07:30".to_string(), 450));
    }

    #[test]
    fn twenty_four_hour_is_idempotent() {
        for s in ["00:00", "07:30", "12:00", "18:45", "23:59"] {
            let once = normalize_time(s).unwrap();
            let twice = normalize_time(&once.hhmm()).unwrap();
            assert_eq!(once, twice, "input {s}");
            assert_eq!(once.hhmm(), s);
        }
    }

    #[test]
    fn rejects_empty_and_garbage() {
        for s in ["", "   "] {
            assert_eq!(
                normalize_time(s),
                Err(TimeError::InvalidTimeFormat { raw: s.to_string() })
            );
        }
        assert!(matches!(
            normalize_time("soon"),
            Err(TimeError::InvalidTimeFormat { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_clock_digits() {
        for s in ["24:00", "12:60", "13:00pm", "25:10", "20:00:00"] {
            assert!(
                matches!(normalize_time(s), Err(TimeError::InvalidTimeFormat { .. })),
                "expected {s} to be rejected"
            );
        }
    }
}
