//! Shared synthetic ephemeris fixtures.
//!
//! Bodies move linearly from their epoch longitudes, which is all the
//! engine's geometry ever assumes; houses are equal 30° slices from a
//! fixed Ascendant. Deterministic, no data files.
#![allow(dead_code)]

use std::collections::HashMap;

use astro_chart_calculator::ephem::{
    Body, BodyPosition, Ephemeris, EphemerisError, Frame, HousePlacement,
};
use astro_chart_calculator::geometry::angle::normalize_deg;

/// Epoch the fixture longitudes are quoted at (2000-01-01 12:00 UT).
pub const EPOCH_JD: f64 = 2_451_545.0;

/// Latitude beyond which the fixture, like the tabulated adapter,
/// declares house cusps undefined.
pub const POLAR_LATITUDE_DEG: f64 = 66.0;

#[derive(Debug, Clone)]
pub struct SyntheticEphemeris {
    pub epoch_jd: f64,
    pub ascendant_deg: f64,
    geocentric: HashMap<Body, (f64, f64)>,
    heliocentric: HashMap<Body, (f64, f64)>,
}

impl SyntheticEphemeris {
    pub fn empty() -> Self {
        Self {
            epoch_jd: EPOCH_JD,
            ascendant_deg: 0.0,
            geocentric: HashMap::new(),
            heliocentric: HashMap::new(),
        }
    }

    /// Fixture covering the full natal and heliocentric rosters with
    /// plausible mean speeds.
    pub fn standard() -> Self {
        let mut fixture = Self::empty();
        let geocentric = [
            (Body::Sun, 280.0, 0.9856),
            (Body::Moon, 40.0, 13.1764),
            (Body::Mercury, 265.0, 1.4),
            (Body::Venus, 310.0, 1.2),
            (Body::Mars, 125.0, 0.524),
            (Body::Jupiter, 35.0, 0.083),
            (Body::Saturn, 50.0, 0.034),
            (Body::Uranus, 315.0, 0.012),
            (Body::Neptune, 303.0, 0.006),
            (Body::Pluto, 251.0, 0.004),
            (Body::Chiron, 251.5, 0.018),
            (Body::MeanNode, 125.1, -0.053),
            (Body::MeanApogee, 210.0, 0.111),
        ];
        for (body, lon, speed) in geocentric {
            fixture = fixture.with_geocentric(body, lon, speed);
        }
        let heliocentric = [
            (Body::Earth, 100.0, 0.9856),
            (Body::Mercury, 200.0, 4.092),
            (Body::Venus, 80.0, 1.602),
            (Body::Mars, 340.0, 0.524),
            (Body::Jupiter, 33.0, 0.083),
            (Body::Saturn, 48.0, 0.034),
            (Body::Uranus, 316.0, 0.012),
            (Body::Neptune, 304.0, 0.006),
            (Body::Pluto, 252.0, 0.004),
        ];
        for (body, lon, speed) in heliocentric {
            fixture = fixture.with_heliocentric(body, lon, speed);
        }
        fixture
    }

    pub fn with_geocentric(mut self, body: Body, longitude_deg: f64, speed: f64) -> Self {
        self.geocentric.insert(body, (longitude_deg, speed));
        self
    }

    pub fn with_heliocentric(mut self, body: Body, longitude_deg: f64, speed: f64) -> Self {
        self.heliocentric.insert(body, (longitude_deg, speed));
        self
    }

    pub fn with_ascendant(mut self, ascendant_deg: f64) -> Self {
        self.ascendant_deg = ascendant_deg;
        self
    }

    pub fn with_epoch(mut self, epoch_jd: f64) -> Self {
        self.epoch_jd = epoch_jd;
        self
    }

    pub fn without_heliocentric(mut self) -> Self {
        self.heliocentric.clear();
        self
    }
}

impl Ephemeris for SyntheticEphemeris {
    fn position_at(
        &self,
        jd_ut: f64,
        body: Body,
        frame: Frame,
    ) -> Result<BodyPosition, EphemerisError> {
        let table = match frame {
            Frame::Geocentric => &self.geocentric,
            Frame::Heliocentric => &self.heliocentric,
        };
        let (lon0, speed) = table
            .get(&body)
            .copied()
            .ok_or(EphemerisError::UnsupportedBody { body, frame })?;
        Ok(BodyPosition {
            longitude_deg: normalize_deg(lon0 + speed * (jd_ut - self.epoch_jd)),
            speed_deg_per_day: speed,
        })
    }

    fn house_cusps(
        &self,
        _jd_ut: f64,
        latitude_deg: f64,
        _longitude_deg: f64,
    ) -> Result<HousePlacement, EphemerisError> {
        if latitude_deg.abs() > POLAR_LATITUDE_DEG {
            return Err(EphemerisError::HouseSystemDomain { latitude_deg });
        }
        let mut cusps = [0.0; 12];
        for (i, cusp) in cusps.iter_mut().enumerate() {
            *cusp = normalize_deg(self.ascendant_deg + 30.0 * i as f64);
        }
        Ok(HousePlacement {
            cusps,
            ascendant_deg: self.ascendant_deg,
            midheaven_deg: normalize_deg(self.ascendant_deg + 270.0),
        })
    }
}
