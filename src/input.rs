//! Birth data parsing and validation.
//!
//! Malformed input is rejected here, before any computation begins; the
//! engine itself only ever sees a validated UTC instant and coordinates.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("invalid date `{value}`; expected YYYY-MM-DD")]
    Date { value: String },
    #[error("invalid time `{value}`; expected HH:MM or HH:MM:SS")]
    Time { value: String },
    #[error("invalid UTC offset `{value}`; expected e.g. +09:00 or -05:30")]
    Offset { value: String },
    #[error("latitude {value}° is outside [-90, 90]")]
    Latitude { value: f64 },
    #[error("longitude {value}° is outside [-180, 180]")]
    Longitude { value: f64 },
}

/// Validated birth instant and place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BirthInfo {
    pub moment_utc: DateTime<Utc>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl BirthInfo {
    /// Parse and validate the raw form fields: local date, local
    /// wall-clock time, the place's UTC offset, and coordinates.
    pub fn from_fields(
        date: &str,
        time: &str,
        utc_offset: &str,
        latitude_deg: f64,
        longitude_deg: f64,
    ) -> Result<Self, InputError> {
        if !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(InputError::Latitude {
                value: latitude_deg,
            });
        }
        if !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(InputError::Longitude {
                value: longitude_deg,
            });
        }
        let date = parse_date(date)?;
        let time = parse_time(time)?;
        let offset = parse_utc_offset(utc_offset)?;
        let moment_utc = date
            .and_time(time)
            .and_local_timezone(offset)
            .single()
            .ok_or(InputError::Offset {
                value: utc_offset.to_string(),
            })?
            .with_timezone(&Utc);
        Ok(Self {
            moment_utc,
            latitude_deg,
            longitude_deg,
        })
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate, InputError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| InputError::Date {
        value: value.to_string(),
    })
}

/// Parse a wall-clock time, `HH:MM` or `HH:MM:SS`.
pub fn parse_time(value: &str) -> Result<NaiveTime, InputError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| InputError::Time {
            value: value.to_string(),
        })
}

/// Parse a UTC offset like `+09:00`, `-05:30`, or `+09`.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, InputError> {
    let err = || InputError::Offset {
        value: value.to_string(),
    };
    let (sign, rest) = match value.split_at_checked(1) {
        Some(("+", rest)) => (1i32, rest),
        Some(("-", rest)) => (-1i32, rest),
        _ => return Err(err()),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| err())?;
    let minutes: i32 = minutes.parse().map_err(|_| err())?;
    if hours > 14 || minutes >= 60 {
        return Err(err());
    }
    let seconds = sign * (hours * 3600 + minutes * 60);
    FixedOffset::east_opt(seconds).ok_or_else(err)
}

/// Whole years elapsed between a birth date and a later date, the
/// has-the-birthday-passed way.
pub fn age_years(birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}
