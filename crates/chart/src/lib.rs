//! Chart point assembly: one [`ChartLayer`] per (moment, place, frame).
//!
//! A layer is an ordered, immutable set of [`ChartPoint`]s plus optional
//! house cusps. Downstream consumers (aspect detection, harmonic search,
//! transit scanning) only ever read it.

use std::fmt;

use astro_core::houses::HouseCusps;
use astro_core::sign::ZodiacSign;
use astro_ephem::{Body, EphemerisError, Frame};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod builder;

pub use builder::{ChartRequest, PofFormula, build_layer, derive_solar_arc, part_of_fortune};

/// Identity of a chart point: a celestial body or a derived angular point.
///
/// Strongly typed on purpose: a typo in a free-form name key would silently
/// create a point nothing ever aspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointId {
    Body(Body),
    Ascendant,
    Midheaven,
    PartOfFortune,
}

impl PointId {
    pub fn name(self) -> &'static str {
        match self {
            PointId::Body(body) => body.name(),
            PointId::Ascendant => "ASC",
            PointId::Midheaven => "MC",
            PointId::PartOfFortune => "Part of Fortune",
        }
    }

    /// Angular/sensitive points derived from the horizon and meridian.
    pub fn is_angular(self) -> bool {
        matches!(
            self,
            PointId::Ascendant | PointId::Midheaven | PointId::PartOfFortune
        )
    }

    /// Minor points that never aspect the angular points in this model.
    pub fn is_minor(self) -> bool {
        matches!(
            self,
            PointId::Body(Body::Chiron) | PointId::Body(Body::MeanNode) | PointId::Body(Body::MeanApogee)
        )
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One celestial or mathematical point at one moment. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub id: PointId,
    /// Ecliptic longitude in [0, 360).
    pub longitude_deg: f64,
    /// Signed daily motion; 0 for points with no defined instantaneous
    /// motion (angles, Part of Fortune).
    pub speed_deg_per_day: f64,
    pub retrograde: bool,
    pub luminary: bool,
}

impl ChartPoint {
    pub fn sign(&self) -> ZodiacSign {
        ZodiacSign::from_longitude(self.longitude_deg)
    }

    pub fn degree_in_sign(&self) -> f64 {
        astro_core::sign::degree_in_sign(self.longitude_deg)
    }
}

/// Which derived chart a layer belongs to. The prefix is a display label
/// only; no computation branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Natal,
    Transit,
    Progressed,
    SolarArc,
    SolarReturn,
    Heliocentric,
}

impl LayerKind {
    pub fn prefix(self) -> &'static str {
        match self {
            LayerKind::Natal => "N.",
            LayerKind::Transit => "T.",
            LayerKind::Progressed => "P.",
            LayerKind::SolarArc => "SA.",
            LayerKind::SolarReturn => "SR.",
            LayerKind::Heliocentric => "H.",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Ordered point collection for one moment/place/frame. Insertion order is
/// the display order; ids are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLayer {
    pub kind: LayerKind,
    pub jd_ut: f64,
    pub frame: Frame,
    pub points: Vec<ChartPoint>,
    /// Present for geocentric layers when the house computation succeeded.
    pub cusps: Option<HouseCusps>,
    /// Set when house data was requested but had to be omitted (Placidus
    /// undefined at the latitude). The rest of the layer is still valid.
    pub house_warning: Option<String>,
}

impl ChartLayer {
    pub fn point(&self, id: PointId) -> Option<&ChartPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn longitude_of(&self, id: PointId) -> Option<f64> {
        self.point(id).map(|p| p.longitude_deg)
    }

    /// House number of a point, when this layer carries cusps.
    pub fn house_of(&self, id: PointId) -> Option<u8> {
        let cusps = self.cusps.as_ref()?;
        let point = self.point(id)?;
        astro_core::houses::house_of(point.longitude_deg, cusps).ok()
    }
}

/// Errors from assembling a chart layer.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("ephemeris query failed: {0}")]
    Ephemeris(#[from] EphemerisError),
}
