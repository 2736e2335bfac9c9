//! Multi-layer chart report orchestration.
//!
//! Each derived layer is a phase computed independently: one failing phase
//! is reported as a message scoped to that layer while the rest of the
//! report still fills in. Only the natal layer is a hard prerequisite;
//! without it nothing downstream can run.

use astro_aspects::{AspectScan, HarmonicMatch, detect_between, detect_within, find_resonances};
use astro_chart::{
    ChartError, ChartLayer, ChartRequest, LayerKind, PofFormula, PointId, build_layer,
    derive_solar_arc,
};
use astro_config::{AspectTable, ChartSettings, rosters};
use astro_core::angle::signed_delta_deg;
use astro_ephem::time::julian_day_from_civil;
use astro_ephem::{Body, Ephemeris, Frame};
use astro_search::{CancelToken, ScanRequest, TimeWindow, TransitInterval, scan_transits};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::{BirthInfo, age_years};

/// Inputs for one full report run.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub birth: BirthInfo,
    /// Reference instant for the transit, progression, solar-arc, and
    /// solar-return phases. Injected rather than sampled so identical
    /// requests stay reproducible.
    pub now_utc: DateTime<Utc>,
    pub settings: ChartSettings,
    pub pof_formula: PofFormula,
    /// The year-horizon window scan is the one expensive phase; callers
    /// opt in.
    pub scan_transit_windows: bool,
}

/// Outcome of one independent phase. Failures carry the layer-scoped
/// message shown to the user; they never abort the other phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhaseOutcome<T> {
    Completed(T),
    Failed { message: String },
}

impl<T> PhaseOutcome<T> {
    fn from_result<E: std::fmt::Display>(result: Result<T, E>, phase: &str) -> Self {
        match result {
            Ok(value) => PhaseOutcome::Completed(value),
            Err(err) => {
                log::warn!("{phase} phase failed: {err}");
                PhaseOutcome::Failed {
                    message: err.to_string(),
                }
            }
        }
    }

    pub fn completed(&self) -> Option<&T> {
        match self {
            PhaseOutcome::Completed(value) => Some(value),
            PhaseOutcome::Failed { .. } => None,
        }
    }
}

/// A derived layer plus its aspects to the natal layer (or within itself,
/// for the heliocentric phase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerAspects {
    pub layer: ChartLayer,
    pub aspects: AspectScan,
}

/// Solar-return phase result: the solved instant plus the return chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarReturnPhase {
    pub return_jd_ut: f64,
    pub layer: ChartLayer,
    pub aspects: AspectScan,
}

/// Complete report across all layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartReport {
    pub birth_utc: String,
    pub reference_utc: String,
    pub age_years: i32,
    pub natal: ChartLayer,
    pub natal_aspects: AspectScan,
    pub transit: PhaseOutcome<LayerAspects>,
    pub progressed: PhaseOutcome<LayerAspects>,
    pub solar_arc: PhaseOutcome<LayerAspects>,
    pub solar_return: PhaseOutcome<SolarReturnPhase>,
    pub heliocentric: PhaseOutcome<LayerAspects>,
    pub harmonics: Vec<HarmonicMatch>,
    /// Present only when the window scan was requested.
    pub transit_windows: Option<PhaseOutcome<Vec<TransitInterval>>>,
}

/// Errors that abort the whole report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("natal chart computation failed: {0}")]
    Natal(#[from] ChartError),
    #[error("natal layer is missing the Sun; derived layers cannot anchor")]
    MissingSun,
}

/// Run every phase and collect a best-effort report.
pub fn compute_report(
    ephemeris: &dyn Ephemeris,
    request: &ReportRequest,
    cancel: Option<&CancelToken>,
) -> Result<ChartReport, ReportError> {
    let birth = request.birth;
    let birth_jd = julian_day_from_civil(&birth.moment_utc);
    let now_jd = julian_day_from_civil(&request.now_utc);
    let age = age_years(
        birth.moment_utc.date_naive(),
        request.now_utc.date_naive(),
    );
    let natal_roster = rosters::natal();
    let table = &request.settings.aspects;

    let natal = build_layer(
        ephemeris,
        &ChartRequest {
            pof_formula: request.pof_formula,
            ..ChartRequest::geocentric(
                LayerKind::Natal,
                birth_jd,
                birth.latitude_deg,
                birth.longitude_deg,
                &natal_roster,
            )
        },
    )?;
    let natal_sun = natal
        .longitude_of(PointId::Body(Body::Sun))
        .ok_or(ReportError::MissingSun)?;
    let natal_aspects = detect_within(&natal, table);

    let transit_roster = rosters::transit();
    let transit = PhaseOutcome::from_result(
        build_layer(
            ephemeris,
            &ChartRequest::transiting(
                now_jd,
                birth.latitude_deg,
                birth.longitude_deg,
                &transit_roster,
            ),
        )
        .map(|layer| LayerAspects {
            aspects: detect_between(&layer, &natal, table),
            layer,
        }),
        "transit",
    );

    // Secondary progression: one day of motion stands for one year of life.
    let progressed_roster = rosters::progressed();
    let progressed_jd = birth_jd + f64::from(age);
    let progressed = PhaseOutcome::from_result(
        build_layer(
            ephemeris,
            &ChartRequest {
                with_houses: false,
                ..ChartRequest::geocentric(
                    LayerKind::Progressed,
                    progressed_jd,
                    birth.latitude_deg,
                    birth.longitude_deg,
                    &progressed_roster,
                )
            },
        )
        .map(|layer| LayerAspects {
            aspects: detect_between(&layer, &natal, table),
            layer,
        }),
        "progression",
    );

    // Solar arc queries its own progressed Sun so a failed progression
    // phase cannot take this one down with it.
    let solar_arc = PhaseOutcome::from_result(
        ephemeris
            .position_at(progressed_jd, Body::Sun, Frame::Geocentric)
            .map(|sun| {
                let arc = signed_delta_deg(sun.longitude_deg - natal_sun);
                let layer = derive_solar_arc(&natal, arc, &progressed_roster);
                LayerAspects {
                    aspects: detect_between(&layer, &natal, table),
                    layer,
                }
            }),
        "solar arc",
    );

    let solar_return = PhaseOutcome::from_result(
        solar_return_phase(
            ephemeris,
            &birth,
            natal_sun,
            request.now_utc.year(),
            &natal,
            &natal_roster,
            table,
            request.pof_formula,
        ),
        "solar return",
    );

    let helio_roster = rosters::heliocentric();
    let heliocentric = PhaseOutcome::from_result(
        build_layer(ephemeris, &ChartRequest::heliocentric(birth_jd, &helio_roster)).map(
            |layer| LayerAspects {
                aspects: detect_within(&layer, table),
                layer,
            },
        ),
        "heliocentric",
    );

    let harmonics = find_resonances(&natal, &request.settings.harmonics);

    let transit_windows = request.scan_transit_windows.then(|| {
        let scan_table = AspectTable::transit_search();
        PhaseOutcome::from_result(
            scan_transits(
                ephemeris,
                &ScanRequest {
                    natal: &natal,
                    window: TimeWindow {
                        start_jd_ut: now_jd,
                        horizon_days: request.settings.scan.horizon_days,
                    },
                    latitude_deg: birth.latitude_deg,
                    longitude_deg: birth.longitude_deg,
                    roster: &transit_roster,
                    table: &scan_table,
                    settings: request.settings.scan,
                },
                cancel,
                None,
            ),
            "transit windows",
        )
    });

    Ok(ChartReport {
        birth_utc: birth.moment_utc.to_rfc3339(),
        reference_utc: request.now_utc.to_rfc3339(),
        age_years: age,
        natal,
        natal_aspects,
        transit,
        progressed,
        solar_arc,
        solar_return,
        heliocentric,
        harmonics,
        transit_windows,
    })
}

#[derive(Debug, Error)]
enum SolarReturnPhaseError {
    #[error(transparent)]
    Search(#[from] astro_search::SolarReturnError),
    #[error(transparent)]
    Chart(#[from] ChartError),
}

#[allow(clippy::too_many_arguments)]
fn solar_return_phase(
    ephemeris: &dyn Ephemeris,
    birth: &BirthInfo,
    natal_sun: f64,
    target_year: i32,
    natal: &ChartLayer,
    roster: &[Body],
    table: &AspectTable,
    pof_formula: PofFormula,
) -> Result<SolarReturnPhase, SolarReturnPhaseError> {
    let return_jd =
        astro_search::find_solar_return(ephemeris, &birth.moment_utc, natal_sun, target_year)?;
    let layer = build_layer(
        ephemeris,
        &ChartRequest {
            pof_formula,
            ..ChartRequest::geocentric(
                LayerKind::SolarReturn,
                return_jd,
                birth.latitude_deg,
                birth.longitude_deg,
                roster,
            )
        },
    )?;
    Ok(SolarReturnPhase {
        return_jd_ut: return_jd,
        aspects: detect_between(&layer, natal, table),
        layer,
    })
}
