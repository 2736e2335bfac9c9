use std::collections::BTreeMap;
use std::path::Path;

use assert_cmd::Command;
use chrono::{NaiveDate, Utc};
use predicates::prelude::*;

use astro_chart_calculator::config::rosters;
use astro_chart_calculator::ephem::tabulated::{
    DATASET_VERSION, EphemerisDataset, HouseSample, PositionSample,
};
use astro_chart_calculator::ephem::time::julian_day_from_civil;
use astro_chart_calculator::ephem::Body;

const LAT: f64 = 35.69;
const LON: f64 = 139.692;
const LAT_ARG: &str = "35.69";
const LON_ARG: &str = "139.692";

fn birth_utc() -> chrono::DateTime<Utc> {
    // 2020-03-10 21:00 +09:00 is 12:00 UTC.
    NaiveDate::from_ymd_opt(2020, 3, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc()
}

/// Linear per-body motion sampled daily from two days before birth to
/// sixty days after, plus one house entry at the birth instant.
fn write_dataset(path: &Path) {
    let birth_jd = julian_day_from_civil(&birth_utc());
    let geocentric_model: &[(Body, f64, f64)] = &[
        (Body::Sun, 350.0, 0.9856),
        (Body::Moon, 40.0, 13.1764),
        (Body::Mercury, 335.0, 1.4),
        (Body::Venus, 20.0, 1.2),
        (Body::Mars, 295.0, 0.524),
        (Body::Jupiter, 292.0, 0.083),
        (Body::Saturn, 299.0, 0.034),
        (Body::Uranus, 34.0, 0.012),
        (Body::Neptune, 348.0, 0.006),
        (Body::Pluto, 294.5, 0.004),
        (Body::Chiron, 4.0, 0.018),
        (Body::MeanNode, 92.0, -0.053),
        (Body::MeanApogee, 8.0, 0.111),
    ];
    let heliocentric_model: &[(Body, f64, f64)] = &[
        (Body::Earth, 170.0, 0.9856),
        (Body::Mercury, 150.0, 4.092),
        (Body::Venus, 250.0, 1.602),
        (Body::Mars, 190.0, 0.524),
        (Body::Jupiter, 290.0, 0.083),
        (Body::Saturn, 300.0, 0.034),
        (Body::Uranus, 35.0, 0.012),
        (Body::Neptune, 349.0, 0.006),
        (Body::Pluto, 295.0, 0.004),
    ];

    let sample_table = |model: &[(Body, f64, f64)]| -> BTreeMap<Body, Vec<PositionSample>> {
        model
            .iter()
            .map(|&(body, lon0, speed)| {
                let samples = (-2..=60)
                    .map(|day| PositionSample {
                        jd_ut: birth_jd + f64::from(day),
                        longitude_deg: (lon0 + speed * f64::from(day)).rem_euclid(360.0),
                        speed_deg_per_day: speed,
                    })
                    .collect();
                (body, samples)
            })
            .collect()
    };

    let mut cusps = [0.0; 12];
    for (i, cusp) in cusps.iter_mut().enumerate() {
        *cusp = (83.0 + 30.0 * i as f64).rem_euclid(360.0);
    }
    let dataset = EphemerisDataset {
        version: DATASET_VERSION,
        description: Some("integration fixture".to_string()),
        geocentric: sample_table(geocentric_model),
        heliocentric: sample_table(heliocentric_model),
        houses: vec![HouseSample {
            jd_ut: birth_jd,
            latitude_deg: LAT,
            longitude_deg: LON,
            cusps,
            ascendant_deg: 83.0,
            midheaven_deg: 353.0,
        }],
    };
    dataset.save(path).expect("write dataset");
}

#[test]
fn natal_report_prints_a_layer_summary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dataset = dir.path().join("ephemeris.json");
    write_dataset(&dataset);

    Command::cargo_bin("natal_report")
        .expect("binary")
        .args([
            "--date",
            "2020-03-10",
            "--time",
            "21:00",
            "--utc-offset",
            "+09:00",
            "--lat",
            LAT_ARG,
            "--lon",
            LON_ARG,
            "--ephemeris",
            dataset.to_str().unwrap(),
            "--reference",
            "2020-04-09T12:00:00Z",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("N.Sun"))
        .stdout(predicate::str::contains("N.ASC"))
        .stdout(predicate::str::contains("-- T. layer --"))
        .stdout(predicate::str::contains("solar return at JD"));
}

#[test]
fn natal_report_writes_a_json_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dataset = dir.path().join("ephemeris.json");
    write_dataset(&dataset);
    let output = dir.path().join("report.json");

    Command::cargo_bin("natal_report")
        .expect("binary")
        .args([
            "--date",
            "2020-03-10",
            "--time",
            "21:00",
            "--utc-offset",
            "+09:00",
            "--lat",
            LAT_ARG,
            "--lon",
            LON_ARG,
            "--ephemeris",
            dataset.to_str().unwrap(),
            "--reference",
            "2020-04-09T12:00:00Z",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let artifact = std::fs::read_to_string(&output).expect("artifact");
    assert!(artifact.contains("\"natal\""));
    assert!(artifact.contains("\"natal_aspects\""));
}

#[test]
fn natal_report_rejects_a_missing_dataset() {
    Command::cargo_bin("natal_report")
        .expect("binary")
        .args([
            "--date",
            "2020-03-10",
            "--time",
            "21:00",
            "--lat",
            "0.0",
            "--lon",
            "0.0",
            "--ephemeris",
            "/nonexistent/ephemeris.json",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unavailable"));
}

#[test]
fn transit_scan_writes_the_interval_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dataset = dir.path().join("ephemeris.json");
    write_dataset(&dataset);
    let settings = dir.path().join("settings.toml");
    std::fs::write(
        &settings,
        "[scan]\nhorizon_days = 20\nextension_cap_days = 10\n",
    )
    .expect("settings");
    let output = dir.path().join("transits.csv");

    Command::cargo_bin("transit_scan")
        .expect("binary")
        .args([
            "--date",
            "2020-03-10",
            "--time",
            "21:00",
            "--utc-offset",
            "+09:00",
            "--lat",
            LAT_ARG,
            "--lon",
            LON_ARG,
            "--ephemeris",
            dataset.to_str().unwrap(),
            "--start",
            "2020-03-11T12:00:00Z",
            "--settings",
            settings.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let table = std::fs::read_to_string(&output).expect("csv");
    let mut lines = table.lines();
    assert_eq!(
        lines.next().unwrap(),
        "transiting,aspect,natal,start_date,end_date,extends_beyond_horizon,min_orb_deg,peak_date,transiting_sign,transiting_retrograde,natal_sign,natal_house"
    );
    // The fixture pins slow bodies near their natal places, so at least
    // one window must appear.
    assert!(lines.next().is_some());
}

#[test]
fn fixture_covers_every_rostered_body() {
    // Guards the fixture against roster drift: every natal body must be
    // tabulated or the natal phase would fail outright.
    use astro_chart_calculator::ephem::{Ephemeris, Frame};
    use astro_chart_calculator::ephem::tabulated::TabulatedEphemeris;

    let dir = tempfile::tempdir().expect("tempdir");
    let dataset_path = dir.path().join("ephemeris.json");
    write_dataset(&dataset_path);
    let ephemeris = TabulatedEphemeris::load(&dataset_path).expect("load");
    let birth_jd = julian_day_from_civil(&birth_utc());
    for body in rosters::natal() {
        ephemeris
            .position_at(birth_jd, body, Frame::Geocentric)
            .unwrap_or_else(|err| panic!("fixture must tabulate {body}: {err}"));
    }
    for body in rosters::heliocentric() {
        ephemeris
            .position_at(birth_jd, body, Frame::Heliocentric)
            .unwrap_or_else(|err| panic!("fixture must tabulate {body}: {err}"));
    }
}
