//! File-backed [`Ephemeris`] adapter over precomputed position samples.
//!
//! The dataset is a JSON artifact produced outside this workspace (the
//! ephemeris computation itself is an external collaborator). Queries
//! between samples are answered by linear interpolation along the shorter
//! arc, which is accurate at the daily sample spacing these files ship
//! with.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use astro_core::angle::{normalize_deg, signed_delta_deg};
use serde::{Deserialize, Serialize};

use crate::{Body, BodyPosition, Ephemeris, EphemerisError, Frame, HousePlacement};

/// Current dataset format version.
pub const DATASET_VERSION: u32 = 1;

/// Latitude limit beyond which Placidus cusps are reported as undefined.
pub const MAX_HOUSE_LATITUDE_DEG: f64 = 66.0;

/// Match tolerance when looking up a tabulated house entry, in days.
const HOUSE_JD_TOLERANCE_DAYS: f64 = 1e-3;

/// Match tolerance for the place a house entry was computed for, in degrees.
const HOUSE_PLACE_TOLERANCE_DEG: f64 = 0.5;

/// One (moment, longitude, speed) reading for a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub jd_ut: f64,
    pub longitude_deg: f64,
    pub speed_deg_per_day: f64,
}

/// One precomputed house-cusp entry for a moment and place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseSample {
    pub jd_ut: f64,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub cusps: [f64; 12],
    pub ascendant_deg: f64,
    pub midheaven_deg: f64,
}

/// On-disk shape of a tabulated ephemeris artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemerisDataset {
    pub version: u32,
    #[serde(default)]
    pub description: Option<String>,
    /// Per-body samples sorted by Julian Day, geocentric frame.
    pub geocentric: BTreeMap<Body, Vec<PositionSample>>,
    /// Per-body samples sorted by Julian Day, heliocentric frame.
    #[serde(default)]
    pub heliocentric: BTreeMap<Body, Vec<PositionSample>>,
    /// Precomputed Placidus entries for the moments the dataset targets.
    #[serde(default)]
    pub houses: Vec<HouseSample>,
}

impl EphemerisDataset {
    /// Write the dataset as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), EphemerisError> {
        let file = File::create(path).map_err(|source| EphemerisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// [`Ephemeris`] implementation backed by an [`EphemerisDataset`].
#[derive(Debug, Clone)]
pub struct TabulatedEphemeris {
    dataset: EphemerisDataset,
}

impl TabulatedEphemeris {
    /// Validate and wrap an in-memory dataset.
    pub fn from_dataset(dataset: EphemerisDataset) -> Result<Self, EphemerisError> {
        if dataset.version != DATASET_VERSION {
            return Err(EphemerisError::InvalidData {
                reason: format!(
                    "unsupported dataset version {} (expected {DATASET_VERSION})",
                    dataset.version
                ),
            });
        }
        for (frame, table) in [
            (Frame::Geocentric, &dataset.geocentric),
            (Frame::Heliocentric, &dataset.heliocentric),
        ] {
            for (body, samples) in table {
                if samples.is_empty() {
                    return Err(EphemerisError::InvalidData {
                        reason: format!("{frame} sample list for {body} is empty"),
                    });
                }
                if samples.windows(2).any(|w| w[1].jd_ut <= w[0].jd_ut) {
                    return Err(EphemerisError::InvalidData {
                        reason: format!("{frame} samples for {body} are not strictly ascending"),
                    });
                }
            }
        }
        Ok(Self { dataset })
    }

    /// Load a dataset artifact from disk. A missing file is reported as
    /// [`EphemerisError::Unavailable`], matching the fatal "ephemeris not
    /// configured" condition.
    pub fn load(path: &Path) -> Result<Self, EphemerisError> {
        if !path.exists() {
            return Err(EphemerisError::Unavailable {
                reason: format!("dataset file {} does not exist", path.display()),
            });
        }
        let file = File::open(path).map_err(|source| EphemerisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset: EphemerisDataset = serde_json::from_reader(BufReader::new(file))?;
        Self::from_dataset(dataset)
    }

    fn samples(&self, body: Body, frame: Frame) -> Result<&[PositionSample], EphemerisError> {
        let table = match frame {
            Frame::Geocentric => &self.dataset.geocentric,
            Frame::Heliocentric => &self.dataset.heliocentric,
        };
        table
            .get(&body)
            .map(Vec::as_slice)
            .ok_or(EphemerisError::UnsupportedBody { body, frame })
    }
}

impl Ephemeris for TabulatedEphemeris {
    fn position_at(
        &self,
        jd_ut: f64,
        body: Body,
        frame: Frame,
    ) -> Result<BodyPosition, EphemerisError> {
        let samples = self.samples(body, frame)?;
        let first = samples[0];
        let last = samples[samples.len() - 1];
        if jd_ut < first.jd_ut || jd_ut > last.jd_ut {
            return Err(EphemerisError::OutOfRange { body, frame, jd_ut });
        }
        let upper = samples.partition_point(|s| s.jd_ut < jd_ut);
        if upper == 0 {
            return Ok(BodyPosition {
                longitude_deg: normalize_deg(first.longitude_deg),
                speed_deg_per_day: first.speed_deg_per_day,
            });
        }
        let after = samples[upper.min(samples.len() - 1)];
        let before = samples[upper - 1];
        let span = after.jd_ut - before.jd_ut;
        if span <= 0.0 {
            return Ok(BodyPosition {
                longitude_deg: normalize_deg(before.longitude_deg),
                speed_deg_per_day: before.speed_deg_per_day,
            });
        }
        let t = (jd_ut - before.jd_ut) / span;
        // Interpolate along the shorter arc so the 0°/360° wrap does not
        // produce a spurious half-circle jump.
        let arc = signed_delta_deg(after.longitude_deg - before.longitude_deg);
        Ok(BodyPosition {
            longitude_deg: normalize_deg(before.longitude_deg + arc * t),
            speed_deg_per_day: before.speed_deg_per_day
                + (after.speed_deg_per_day - before.speed_deg_per_day) * t,
        })
    }

    fn house_cusps(
        &self,
        jd_ut: f64,
        latitude_deg: f64,
        longitude_deg: f64,
    ) -> Result<HousePlacement, EphemerisError> {
        if latitude_deg.abs() > MAX_HOUSE_LATITUDE_DEG {
            return Err(EphemerisError::HouseSystemDomain { latitude_deg });
        }
        let nearest = self
            .dataset
            .houses
            .iter()
            .min_by(|a, b| {
                let da = (a.jd_ut - jd_ut).abs();
                let db = (b.jd_ut - jd_ut).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or_else(|| EphemerisError::Unavailable {
                reason: "dataset carries no house table".to_string(),
            })?;
        if (nearest.jd_ut - jd_ut).abs() > HOUSE_JD_TOLERANCE_DAYS {
            return Err(EphemerisError::Unavailable {
                reason: format!("no house entry within tolerance of JD {jd_ut}"),
            });
        }
        if (nearest.latitude_deg - latitude_deg).abs() > HOUSE_PLACE_TOLERANCE_DEG
            || signed_delta_deg(nearest.longitude_deg - longitude_deg).abs()
                > HOUSE_PLACE_TOLERANCE_DEG
        {
            return Err(EphemerisError::Unavailable {
                reason: "house table was computed for a different place".to_string(),
            });
        }
        Ok(HousePlacement {
            cusps: nearest.cusps,
            ascendant_deg: nearest.ascendant_deg,
            midheaven_deg: nearest.midheaven_deg,
        })
    }
}
