mod common;

use std::collections::HashMap;

use astro_chart_calculator::chart::{ChartLayer, ChartPoint, LayerKind, PointId};
use astro_chart_calculator::config::{AspectTable, ScanSettings};
use astro_chart_calculator::ephem::{
    Body, BodyPosition, Ephemeris, EphemerisError, Frame, HousePlacement,
};
use astro_chart_calculator::search::{
    CancelToken, ScanError, ScanProgress, ScanRequest, TimeWindow, scan_transits,
};
use common::SyntheticEphemeris;

const START_JD: f64 = 2_460_000.5;

/// Oracle that replays a per-day longitude script for Mars. Days missing
/// from the script park the body far from every natal point.
struct ScriptedEphemeris {
    script: HashMap<i64, f64>,
}

impl ScriptedEphemeris {
    fn new(entries: &[(i64, f64)]) -> Self {
        Self {
            script: entries.iter().copied().collect(),
        }
    }
}

impl Ephemeris for ScriptedEphemeris {
    fn position_at(
        &self,
        jd_ut: f64,
        body: Body,
        frame: Frame,
    ) -> Result<BodyPosition, EphemerisError> {
        if body != Body::Mars {
            return Err(EphemerisError::UnsupportedBody { body, frame });
        }
        let day = (jd_ut - START_JD).round() as i64;
        let longitude_deg = self.script.get(&day).copied().unwrap_or(200.0);
        Ok(BodyPosition {
            longitude_deg,
            speed_deg_per_day: 0.5,
        })
    }

    fn house_cusps(
        &self,
        _jd_ut: f64,
        latitude_deg: f64,
        _longitude_deg: f64,
    ) -> Result<HousePlacement, EphemerisError> {
        Err(EphemerisError::HouseSystemDomain { latitude_deg })
    }
}

fn natal_with_venus_at(longitude_deg: f64) -> ChartLayer {
    ChartLayer {
        kind: LayerKind::Natal,
        jd_ut: START_JD - 10_000.0,
        frame: Frame::Geocentric,
        points: vec![ChartPoint {
            id: PointId::Body(Body::Venus),
            longitude_deg,
            speed_deg_per_day: 1.2,
            retrograde: false,
            luminary: false,
        }],
        cusps: None,
        house_warning: None,
    }
}

fn scan_request<'a>(
    natal: &'a ChartLayer,
    roster: &'a [Body],
    table: &'a AspectTable,
    horizon_days: u32,
    settings: ScanSettings,
) -> ScanRequest<'a> {
    ScanRequest {
        natal,
        window: TimeWindow {
            start_jd_ut: START_JD,
            horizon_days,
        },
        latitude_deg: 35.69,
        longitude_deg: 139.692,
        roster,
        table,
        settings,
    }
}

#[test]
fn separate_passes_stay_separate_intervals() {
    // In orb days 10-15, out on 16, back in 40-42: two intervals, not one
    // spanning 10-42.
    let mut script: Vec<(i64, f64)> = (10..=15).map(|d| (d, 1.0)).collect();
    script.extend((40..=42).map(|d| (d, 359.0)));
    let ephemeris = ScriptedEphemeris::new(&script);
    let natal = natal_with_venus_at(0.0);
    let roster = [Body::Mars];
    let table = AspectTable::transit_search();

    let intervals = scan_transits(
        &ephemeris,
        &scan_request(&natal, &roster, &table, 100, ScanSettings::default()),
        None,
        None,
    )
    .expect("scan");

    assert_eq!(intervals.len(), 2);
    assert!((intervals[0].start_jd_ut - (START_JD + 10.0)).abs() < 1e-9);
    assert!((intervals[0].end_jd_ut - (START_JD + 15.0)).abs() < 1e-9);
    assert!((intervals[1].start_jd_ut - (START_JD + 40.0)).abs() < 1e-9);
    assert!((intervals[1].end_jd_ut - (START_JD + 42.0)).abs() < 1e-9);
    assert!(!intervals[0].extends_beyond_horizon);
    assert!(!intervals[1].extends_beyond_horizon);
    assert_eq!(intervals[0].aspect, "Conjunction");
    assert_eq!(intervals[0].natal, PointId::Body(Body::Venus));
}

#[test]
fn linear_motion_produces_one_interval_per_pass() {
    // Mars at 3°/day laps the zodiac every 120 days: two conjunction
    // passes over Venus inside a 200-day horizon.
    let ephemeris = SyntheticEphemeris::empty()
        .with_epoch(START_JD)
        .with_geocentric(Body::Mars, 350.0, 3.0);
    let natal = natal_with_venus_at(0.0);
    let roster = [Body::Mars];
    let table = AspectTable::transit_search();

    let intervals = scan_transits(
        &ephemeris,
        &scan_request(&natal, &roster, &table, 200, ScanSettings::default()),
        None,
        None,
    )
    .expect("scan");

    let conjunctions: Vec<_> = intervals
        .iter()
        .filter(|i| i.aspect == "Conjunction")
        .collect();
    assert_eq!(conjunctions.len(), 2);
    // First pass: 350 + 3d within ±6 of 360 → days 2..=5.
    assert!((conjunctions[0].start_jd_ut - (START_JD + 2.0)).abs() < 1e-9);
    assert!((conjunctions[0].end_jd_ut - (START_JD + 5.0)).abs() < 1e-9);
    // Tightest orb on day 3 (359° → 1° of separation).
    assert!((conjunctions[0].peak_jd_ut - (START_JD + 3.0)).abs() < 1e-9);
    assert!((conjunctions[0].min_orb_deg - 1.0).abs() < 1e-9);
    // Second pass one synodic lap later.
    assert!((conjunctions[1].start_jd_ut - (START_JD + 122.0)).abs() < 1e-9);
}

#[test]
fn interval_open_at_horizon_extends_to_its_true_end() {
    // Mars creeps at 0.5°/day from 4° below the conjunction: in orb from
    // day 0 (sep 4) until day 19 (sep 5.5), out at day 20. Horizon 10
    // days: the interval is still open at the boundary and must extend
    // past it to day 19.
    let ephemeris = SyntheticEphemeris::empty()
        .with_epoch(START_JD)
        .with_geocentric(Body::Mars, 356.0, 0.5);
    let natal = natal_with_venus_at(0.0);
    let roster = [Body::Mars];
    let table = AspectTable::transit_search();

    let intervals = scan_transits(
        &ephemeris,
        &scan_request(&natal, &roster, &table, 10, ScanSettings::default()),
        None,
        None,
    )
    .expect("scan");

    assert_eq!(intervals.len(), 1);
    let interval = &intervals[0];
    assert!(interval.extends_beyond_horizon);
    assert!((interval.start_jd_ut - START_JD).abs() < 1e-9);
    assert!((interval.end_jd_ut - (START_JD + 19.0)).abs() < 1e-9);
    // Exact conjunction on day 8.
    assert!((interval.peak_jd_ut - (START_JD + 8.0)).abs() < 1e-9);
}

#[test]
fn extension_stops_at_the_cap_and_keeps_the_flag() {
    // A stationary transit never leaves orb; the extension must stop at
    // the configured cap.
    let ephemeris = SyntheticEphemeris::empty()
        .with_epoch(START_JD)
        .with_geocentric(Body::Mars, 2.0, 0.0);
    let natal = natal_with_venus_at(0.0);
    let roster = [Body::Mars];
    let table = AspectTable::transit_search();
    let settings = ScanSettings {
        extension_cap_days: 15,
        ..ScanSettings::default()
    };

    let intervals = scan_transits(
        &ephemeris,
        &scan_request(&natal, &roster, &table, 5, settings),
        None,
        None,
    )
    .expect("scan");

    assert_eq!(intervals.len(), 1);
    let interval = &intervals[0];
    assert!(interval.extends_beyond_horizon);
    assert!((interval.end_jd_ut - (START_JD + 20.0)).abs() < 1e-9);
}

#[test]
fn cancellation_aborts_the_scan() {
    let ephemeris = SyntheticEphemeris::empty()
        .with_epoch(START_JD)
        .with_geocentric(Body::Mars, 200.0, 0.0);
    let natal = natal_with_venus_at(0.0);
    let roster = [Body::Mars];
    let table = AspectTable::transit_search();

    let token = CancelToken::new();
    token.cancel();
    let err = scan_transits(
        &ephemeris,
        &scan_request(&natal, &roster, &table, 365, ScanSettings::default()),
        Some(&token),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ScanError::Cancelled { .. }));
}

#[test]
fn progress_is_reported_once_per_sampled_day() {
    let ephemeris = SyntheticEphemeris::empty()
        .with_epoch(START_JD)
        .with_geocentric(Body::Mars, 200.0, 0.0);
    let natal = natal_with_venus_at(0.0);
    let roster = [Body::Mars];
    let table = AspectTable::transit_search();

    let mut reports = 0u32;
    let mut on_progress = |_progress: ScanProgress| reports += 1;
    scan_transits(
        &ephemeris,
        &scan_request(&natal, &roster, &table, 30, ScanSettings::default()),
        None,
        Some(&mut on_progress),
    )
    .expect("scan");
    assert_eq!(reports, 31);
}
