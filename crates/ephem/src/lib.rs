//! Ephemeris oracle boundary for the astro chart calculator workspace.
//!
//! The chart engine never integrates an orbit itself; it consumes ecliptic
//! longitudes and daily speeds computed elsewhere. This crate defines the
//! [`Ephemeris`] trait every consumer goes through, plus a file-backed
//! [`tabulated::TabulatedEphemeris`] adapter over precomputed sample files.

use std::fmt;
use std::path::PathBuf;

use astro_core::houses::HouseCusps;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod tabulated;
pub mod time;

/// House system used for all cusp computations. Fixed choice, not
/// user-configurable in the core.
pub const HOUSE_SYSTEM: &str = "Placidus";

/// Bodies the chart engine can ask an oracle about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    Chiron,
    MeanNode,
    MeanApogee,
    Earth,
}

impl Body {
    /// Human-readable name, also used in artifact files.
    pub fn name(self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
            Body::Pluto => "Pluto",
            Body::Chiron => "Chiron",
            Body::MeanNode => "Mean Node",
            Body::MeanApogee => "Lilith",
            Body::Earth => "Earth",
        }
    }

    /// Luminaries get wider aspect orbs: Sun and Moon as seen from Earth,
    /// Earth itself in the heliocentric frame.
    pub fn is_luminary(self, frame: Frame) -> bool {
        match frame {
            Frame::Geocentric => matches!(self, Body::Sun | Body::Moon),
            Frame::Heliocentric => matches!(self, Body::Earth),
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference frame for a position query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frame {
    Geocentric,
    Heliocentric,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Frame::Geocentric => "geocentric",
            Frame::Heliocentric => "heliocentric",
        })
    }
}

/// Ecliptic longitude and instantaneous daily motion of one body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyPosition {
    pub longitude_deg: f64,
    pub speed_deg_per_day: f64,
}

/// House cusps plus the two angles returned by a cusp computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HousePlacement {
    pub cusps: HouseCusps,
    pub ascendant_deg: f64,
    pub midheaven_deg: f64,
}

/// Errors surfaced at the oracle boundary.
#[derive(Debug, Error)]
pub enum EphemerisError {
    /// Ephemeris data files are missing or misconfigured. Fatal to the
    /// whole request; no partial results.
    #[error("ephemeris data unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("failed to read ephemeris dataset at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse ephemeris dataset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ephemeris dataset is malformed: {reason}")]
    InvalidData { reason: String },
    #[error("no {frame} samples for {body} in this dataset")]
    UnsupportedBody { body: Body, frame: Frame },
    #[error("{frame} samples for {body} do not cover JD {jd_ut}")]
    OutOfRange { body: Body, frame: Frame, jd_ut: f64 },
    /// House cusps are undefined at this latitude for the fixed house
    /// system. Recovered locally by omitting house data for the layer.
    #[error("{HOUSE_SYSTEM} house cusps are undefined at latitude {latitude_deg}°")]
    HouseSystemDomain { latitude_deg: f64 },
}

/// External oracle answering position and house-cusp queries.
///
/// Implementations must be deterministic for fixed underlying data: the
/// engine re-queries freely and assumes identical answers for identical
/// inputs.
pub trait Ephemeris {
    /// Ecliptic longitude and speed of `body` at `jd_ut`, in `frame`.
    /// Speed computation is always requested.
    fn position_at(&self, jd_ut: f64, body: Body, frame: Frame)
    -> Result<BodyPosition, EphemerisError>;

    /// Placidus house cusps and angles for the given moment and place.
    fn house_cusps(
        &self,
        jd_ut: f64,
        latitude_deg: f64,
        longitude_deg: f64,
    ) -> Result<HousePlacement, EphemerisError>;
}

impl<T: Ephemeris + ?Sized> Ephemeris for &T {
    fn position_at(
        &self,
        jd_ut: f64,
        body: Body,
        frame: Frame,
    ) -> Result<BodyPosition, EphemerisError> {
        (**self).position_at(jd_ut, body, frame)
    }

    fn house_cusps(
        &self,
        jd_ut: f64,
        latitude_deg: f64,
        longitude_deg: f64,
    ) -> Result<HousePlacement, EphemerisError> {
        (**self).house_cusps(jd_ut, latitude_deg, longitude_deg)
    }
}
