mod common;

use astro_chart_calculator::ephem::time::julian_day_from_civil;
use astro_chart_calculator::ephem::{Body, Ephemeris, Frame};
use astro_chart_calculator::geometry::angle::separation_deg;
use astro_chart_calculator::search::{SolarReturnError, find_solar_return};
use chrono::NaiveDate;
use common::SyntheticEphemeris;

fn birth() -> chrono::DateTime<chrono::Utc> {
    NaiveDate::from_ymd_opt(2000, 3, 15)
        .unwrap()
        .and_hms_opt(7, 25, 0)
        .unwrap()
        .and_utc()
}

#[test]
fn return_reproduces_the_natal_sun_longitude() {
    let ephemeris = SyntheticEphemeris::standard();
    let birth = birth();
    let natal_sun = ephemeris
        .position_at(julian_day_from_civil(&birth), Body::Sun, Frame::Geocentric)
        .unwrap()
        .longitude_deg;

    for target_year in [2001, 2005, 2024] {
        let return_jd = find_solar_return(&ephemeris, &birth, natal_sun, target_year)
            .expect("return converges");
        let sun_at_return = ephemeris
            .position_at(return_jd, Body::Sun, Frame::Geocentric)
            .unwrap()
            .longitude_deg;
        assert!(
            separation_deg(sun_at_return, natal_sun) < 1e-4,
            "year {target_year}: sun off by {}",
            separation_deg(sun_at_return, natal_sun)
        );
    }
}

#[test]
fn return_lands_within_days_of_the_birthday() {
    let ephemeris = SyntheticEphemeris::standard();
    let birth = birth();
    let natal_sun = ephemeris
        .position_at(julian_day_from_civil(&birth), Body::Sun, Frame::Geocentric)
        .unwrap()
        .longitude_deg;
    let return_jd = find_solar_return(&ephemeris, &birth, natal_sun, 2010).expect("converges");
    let guess_jd = julian_day_from_civil(
        &NaiveDate::from_ymd_opt(2010, 3, 15)
            .unwrap()
            .and_hms_opt(7, 25, 0)
            .unwrap()
            .and_utc(),
    );
    // The synthetic Sun runs at its mean speed, so the correction stays
    // under the ~2.5 day wobble real years accumulate.
    assert!((return_jd - guess_jd).abs() < 6.0);
}

#[test]
fn zero_speed_is_a_degenerate_solve() {
    let ephemeris = SyntheticEphemeris::empty().with_geocentric(Body::Sun, 10.0, 0.0);
    let err = find_solar_return(&ephemeris, &birth(), 50.0, 2001).unwrap_err();
    assert!(matches!(err, SolarReturnError::DegenerateSpeed { .. }));
}

#[test]
fn leap_day_births_are_clamped_in_common_years() {
    let ephemeris = SyntheticEphemeris::standard();
    let leap_birth = NaiveDate::from_ymd_opt(2000, 2, 29)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc();
    let natal_sun = ephemeris
        .position_at(
            julian_day_from_civil(&leap_birth),
            Body::Sun,
            Frame::Geocentric,
        )
        .unwrap()
        .longitude_deg;
    let return_jd =
        find_solar_return(&ephemeris, &leap_birth, natal_sun, 2001).expect("clamped guess");
    let sun_at_return = ephemeris
        .position_at(return_jd, Body::Sun, Frame::Geocentric)
        .unwrap()
        .longitude_deg;
    assert!(separation_deg(sun_at_return, natal_sun) < 1e-4);
}
