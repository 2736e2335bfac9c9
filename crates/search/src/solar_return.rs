//! Newton-style solve for the instant the Sun returns to its natal
//! longitude in a given year.

use astro_core::angle::signed_delta_deg;
use astro_ephem::time::julian_day_from_civil;
use astro_ephem::{Body, Ephemeris, EphemerisError, Frame};
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use thiserror::Error;

/// The solve stops once the Sun sits within this of the natal longitude.
pub const CONVERGENCE_TOLERANCE_DEG: f64 = 1e-7;

/// Iteration cap. The problem is near-linear (the Sun moves ~0.985°/day at
/// ~constant speed), so convergence takes three or four steps; hitting the
/// cap means something is wrong with the oracle data.
pub const MAX_ITERATIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum SolarReturnError {
    /// Zero instantaneous speed cannot seed a Newton step. Never true of
    /// the real Sun; guards against degenerate tabulated data.
    #[error("sun speed is zero at JD {jd_ut}; cannot linearize the return search")]
    DegenerateSpeed { jd_ut: f64 },
    #[error("solar return for {year} did not converge within {MAX_ITERATIONS} iterations")]
    NoConvergence { year: i32 },
    #[error("cannot seed an initial guess in year {year}")]
    InvalidGuess { year: i32 },
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
}

/// Julian Day (UT) at which the Sun's geocentric longitude equals
/// `natal_sun_deg`, in the return window anchored near the birthday of
/// `target_year`.
///
/// The initial guess is the birth instant with its year replaced (a
/// February 29 birthday is clamped to February 28 in common years); each
/// Newton step divides the signed longitude offset, folded to
/// (-180, +180], by the instantaneous speed.
pub fn find_solar_return(
    ephemeris: &dyn Ephemeris,
    birth_utc: &DateTime<Utc>,
    natal_sun_deg: f64,
    target_year: i32,
) -> Result<f64, SolarReturnError> {
    let mut jd = initial_guess(birth_utc, target_year)?;
    for iteration in 0..MAX_ITERATIONS {
        let sun = ephemeris.position_at(jd, Body::Sun, Frame::Geocentric)?;
        let offset = signed_delta_deg(sun.longitude_deg - natal_sun_deg);
        log::debug!("solar return {target_year}: iteration {iteration}, offset {offset:.6}°");
        if offset.abs() < CONVERGENCE_TOLERANCE_DEG {
            return Ok(jd);
        }
        if sun.speed_deg_per_day == 0.0 {
            return Err(SolarReturnError::DegenerateSpeed { jd_ut: jd });
        }
        jd -= offset / sun.speed_deg_per_day;
    }
    Err(SolarReturnError::NoConvergence { year: target_year })
}

fn initial_guess(birth_utc: &DateTime<Utc>, target_year: i32) -> Result<f64, SolarReturnError> {
    let (month, day) = (birth_utc.month(), birth_utc.day());
    let date = NaiveDate::from_ymd_opt(target_year, month, day)
        .or_else(|| {
            // February 29 in a common year.
            NaiveDate::from_ymd_opt(target_year, month, day - 1)
        })
        .ok_or(SolarReturnError::InvalidGuess { year: target_year })?;
    let guess = date
        .and_hms_micro_opt(
            birth_utc.hour(),
            birth_utc.minute(),
            birth_utc.second(),
            birth_utc.timestamp_subsec_micros(),
        )
        .ok_or(SolarReturnError::InvalidGuess { year: target_year })?
        .and_utc();
    Ok(julian_day_from_civil(&guess))
}
