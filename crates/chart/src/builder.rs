//! Builds a [`ChartLayer`] from an ephemeris oracle.

use astro_core::angle::normalize_deg;
use astro_ephem::{Body, Ephemeris, EphemerisError, Frame};

use crate::{ChartError, ChartLayer, ChartPoint, LayerKind, PointId};

/// Part-of-Fortune formula selection.
///
/// The traditional formula is day/night-sensitive. The always-day variant
/// survives as an explicit legacy mode because older chart sources used it
/// for every birth; it is not the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PofFormula {
    #[default]
    DayNightSensitive,
    AlwaysDay,
}

/// Inputs for one layer build. Rosters differ per layer kind; the caller
/// selects which bodies to include.
#[derive(Debug, Clone)]
pub struct ChartRequest<'a> {
    pub kind: LayerKind,
    pub jd_ut: f64,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub frame: Frame,
    pub roster: &'a [Body],
    /// House cusps and angle points are only computed when requested;
    /// transit layers built inside the scanner skip them.
    pub with_houses: bool,
    pub pof_formula: PofFormula,
}

impl<'a> ChartRequest<'a> {
    /// Geocentric request with houses, the common case for natal and
    /// solar-return layers.
    pub fn geocentric(
        kind: LayerKind,
        jd_ut: f64,
        latitude_deg: f64,
        longitude_deg: f64,
        roster: &'a [Body],
    ) -> Self {
        Self {
            kind,
            jd_ut,
            latitude_deg,
            longitude_deg,
            frame: Frame::Geocentric,
            roster,
            with_houses: true,
            pof_formula: PofFormula::default(),
        }
    }

    /// Geocentric request without house data (transit layers).
    pub fn transiting(jd_ut: f64, latitude_deg: f64, longitude_deg: f64, roster: &'a [Body]) -> Self {
        Self {
            with_houses: false,
            ..Self::geocentric(LayerKind::Transit, jd_ut, latitude_deg, longitude_deg, roster)
        }
    }

    /// Heliocentric request; houses and angle points do not exist in this
    /// frame and are never computed.
    pub fn heliocentric(jd_ut: f64, roster: &'a [Body]) -> Self {
        Self {
            kind: LayerKind::Heliocentric,
            jd_ut,
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            frame: Frame::Heliocentric,
            roster,
            with_houses: false,
            pof_formula: PofFormula::default(),
        }
    }
}

/// Assemble one chart layer: body positions, then (geocentric only) house
/// cusps, Ascendant, Midheaven, and the Part of Fortune.
///
/// A house computation failing with [`EphemerisError::HouseSystemDomain`]
/// degrades gracefully: the layer is returned without cusps or angle
/// points and carries a warning. Any other oracle failure aborts the
/// build.
pub fn build_layer(
    ephemeris: &dyn Ephemeris,
    request: &ChartRequest<'_>,
) -> Result<ChartLayer, ChartError> {
    let mut points = Vec::with_capacity(request.roster.len() + 3);
    for &body in request.roster {
        let position = ephemeris.position_at(request.jd_ut, body, request.frame)?;
        points.push(ChartPoint {
            id: PointId::Body(body),
            longitude_deg: normalize_deg(position.longitude_deg),
            speed_deg_per_day: position.speed_deg_per_day,
            retrograde: position.speed_deg_per_day < 0.0,
            luminary: body.is_luminary(request.frame),
        });
    }

    let mut layer = ChartLayer {
        kind: request.kind,
        jd_ut: request.jd_ut,
        frame: request.frame,
        points,
        cusps: None,
        house_warning: None,
    };

    if request.frame != Frame::Geocentric || !request.with_houses {
        return Ok(layer);
    }

    match ephemeris.house_cusps(request.jd_ut, request.latitude_deg, request.longitude_deg) {
        Ok(placement) => {
            layer.cusps = Some(placement.cusps);
            let asc = normalize_deg(placement.ascendant_deg);
            let mc = normalize_deg(placement.midheaven_deg);
            layer.points.push(angle_point(PointId::Ascendant, asc));
            layer.points.push(angle_point(PointId::Midheaven, mc));
            let sun = layer.longitude_of(PointId::Body(Body::Sun));
            let moon = layer.longitude_of(PointId::Body(Body::Moon));
            if let (Some(sun), Some(moon)) = (sun, moon) {
                let pof = part_of_fortune(asc, sun, moon, request.pof_formula);
                layer.points.push(ChartPoint {
                    id: PointId::PartOfFortune,
                    longitude_deg: pof,
                    speed_deg_per_day: 0.0,
                    retrograde: false,
                    luminary: false,
                });
            }
        }
        Err(EphemerisError::HouseSystemDomain { latitude_deg }) => {
            layer.house_warning = Some(format!(
                "house cusps unavailable at latitude {latitude_deg}°; layer carries no house or angle data"
            ));
        }
        Err(other) => return Err(other.into()),
    }

    Ok(layer)
}

/// Part of Fortune longitude.
///
/// Day birth: `ASC + Moon − Sun`; night birth: `ASC + Sun − Moon`. A birth
/// is a night birth when the Sun sits strictly between the Ascendant and
/// the Descendant in zodiacal order (houses 1–6, below the horizon); a Sun
/// exactly on either angle counts as day.
pub fn part_of_fortune(asc_deg: f64, sun_deg: f64, moon_deg: f64, formula: PofFormula) -> f64 {
    let day_birth = match formula {
        PofFormula::AlwaysDay => true,
        PofFormula::DayNightSensitive => {
            let rel = normalize_deg(sun_deg - asc_deg);
            !(rel > 0.0 && rel < 180.0)
        }
    };
    if day_birth {
        normalize_deg(asc_deg + moon_deg - sun_deg)
    } else {
        normalize_deg(asc_deg + sun_deg - moon_deg)
    }
}

/// Derive a solar-arc layer: every natal point in `roster` shifted by the
/// same arc. Speeds and retrograde flags carry over from natal; the points
/// have no motion of their own.
pub fn derive_solar_arc(natal: &ChartLayer, arc_deg: f64, roster: &[Body]) -> ChartLayer {
    let points = roster
        .iter()
        .filter_map(|&body| natal.point(PointId::Body(body)))
        .map(|p| ChartPoint {
            longitude_deg: normalize_deg(p.longitude_deg + arc_deg),
            ..*p
        })
        .collect();
    ChartLayer {
        kind: LayerKind::SolarArc,
        jd_ut: natal.jd_ut,
        frame: natal.frame,
        points,
        cusps: None,
        house_warning: None,
    }
}

fn angle_point(id: PointId, longitude_deg: f64) -> ChartPoint {
    ChartPoint {
        id,
        longitude_deg,
        speed_deg_per_day: 0.0,
        retrograde: false,
        luminary: true,
    }
}
