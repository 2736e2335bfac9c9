//! Julian-day and civil-time conversions (UT, proleptic Gregorian).

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Julian Day of the Unix epoch, 1970-01-01T00:00:00 UT.
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Seconds per day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian Day (UT) of a civil instant.
pub fn julian_day_from_civil(moment: &DateTime<Utc>) -> f64 {
    let micros = moment.timestamp_micros() as f64;
    UNIX_EPOCH_JD + micros / (SECONDS_PER_DAY * 1e6)
}

/// Civil instant of a Julian Day (UT), microsecond precision.
///
/// Returns `None` for Julian Days outside chrono's representable range.
pub fn civil_from_julian_day(jd_ut: f64) -> Option<DateTime<Utc>> {
    let micros = (jd_ut - UNIX_EPOCH_JD) * SECONDS_PER_DAY * 1e6;
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_micros(micros.round() as i64).single()
}

/// Calendar date of a Julian Day (UT) as (year, month, day).
pub fn date_from_julian_day(jd_ut: f64) -> Option<(i32, u32, u32)> {
    let civil = civil_from_julian_day(jd_ut)?;
    Some((civil.year(), civil.month(), civil.day()))
}
