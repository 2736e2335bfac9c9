//! Angular geometry primitives shared across the astro chart calculator workspace.

/// Zodiac and calendar constants.
pub mod constants {
    /// Degrees in a full ecliptic circle.
    pub const FULL_CIRCLE_DEG: f64 = 360.0;
    /// Degrees spanned by one zodiac sign.
    pub const SIGN_SPAN_DEG: f64 = 30.0;
    /// Number of zodiac signs (and houses).
    pub const SIGN_COUNT: usize = 12;
    /// Mean length of a tropical year in days.
    pub const TROPICAL_YEAR_DAYS: f64 = 365.242_19;
}

/// Angle folding helpers for ecliptic longitudes.
pub mod angle {
    use super::constants::FULL_CIRCLE_DEG;

    /// Wrap an angle into [0, 360).
    #[inline]
    pub fn normalize_deg(deg: f64) -> f64 {
        deg.rem_euclid(FULL_CIRCLE_DEG)
    }

    /// Fold an angle into (-180, +180].
    #[inline]
    pub fn signed_delta_deg(deg: f64) -> f64 {
        let mut d = deg % FULL_CIRCLE_DEG;
        if d > 180.0 {
            d -= FULL_CIRCLE_DEG;
        } else if d <= -180.0 {
            d += FULL_CIRCLE_DEG;
        }
        d
    }

    /// Smaller arc between two longitudes, in [0, 180].
    #[inline]
    pub fn separation_deg(a: f64, b: f64) -> f64 {
        let d = normalize_deg(a - b);
        if d > 180.0 { FULL_CIRCLE_DEG - d } else { d }
    }
}

/// Zodiac sign classification of a longitude.
pub mod sign {
    use super::constants::{SIGN_COUNT, SIGN_SPAN_DEG};
    use crate::angle::normalize_deg;
    use std::fmt;

    /// The twelve tropical zodiac signs, in ecliptic order from 0° Aries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ZodiacSign {
        Aries,
        Taurus,
        Gemini,
        Cancer,
        Leo,
        Virgo,
        Libra,
        Scorpio,
        Sagittarius,
        Capricorn,
        Aquarius,
        Pisces,
    }

    impl ZodiacSign {
        const ALL: [ZodiacSign; SIGN_COUNT] = [
            ZodiacSign::Aries,
            ZodiacSign::Taurus,
            ZodiacSign::Gemini,
            ZodiacSign::Cancer,
            ZodiacSign::Leo,
            ZodiacSign::Virgo,
            ZodiacSign::Libra,
            ZodiacSign::Scorpio,
            ZodiacSign::Sagittarius,
            ZodiacSign::Capricorn,
            ZodiacSign::Aquarius,
            ZodiacSign::Pisces,
        ];

        /// Sign containing the given ecliptic longitude.
        pub fn from_longitude(longitude_deg: f64) -> ZodiacSign {
            Self::ALL[sign_index(longitude_deg)]
        }

        pub fn name(self) -> &'static str {
            match self {
                ZodiacSign::Aries => "Aries",
                ZodiacSign::Taurus => "Taurus",
                ZodiacSign::Gemini => "Gemini",
                ZodiacSign::Cancer => "Cancer",
                ZodiacSign::Leo => "Leo",
                ZodiacSign::Virgo => "Virgo",
                ZodiacSign::Libra => "Libra",
                ZodiacSign::Scorpio => "Scorpio",
                ZodiacSign::Sagittarius => "Sagittarius",
                ZodiacSign::Capricorn => "Capricorn",
                ZodiacSign::Aquarius => "Aquarius",
                ZodiacSign::Pisces => "Pisces",
            }
        }
    }

    impl fmt::Display for ZodiacSign {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.name())
        }
    }

    /// Index of the sign containing the longitude, 0 (Aries) .. 11 (Pisces).
    #[inline]
    pub fn sign_index(longitude_deg: f64) -> usize {
        ((normalize_deg(longitude_deg) / SIGN_SPAN_DEG) as usize).min(SIGN_COUNT - 1)
    }

    /// Degrees into the containing sign, in [0, 30).
    #[inline]
    pub fn degree_in_sign(longitude_deg: f64) -> f64 {
        normalize_deg(longitude_deg) % SIGN_SPAN_DEG
    }
}

/// Circular house-bucket lookup over a 12-cusp ring.
pub mod houses {
    use super::constants::SIGN_COUNT;
    use crate::angle::normalize_deg;
    use thiserror::Error;

    /// Twelve house cusp longitudes in [0, 360), cusp of house 1 first.
    /// The ring is circular: house 12 runs from cusp 12 back to cusp 1.
    pub type HouseCusps = [f64; SIGN_COUNT];

    /// No cusp interval matched the longitude. Only reachable with a cusp
    /// set that is not monotone on the circle.
    #[derive(Debug, Clone, Error, PartialEq)]
    #[error("longitude {longitude_deg}° matched no house interval")]
    pub struct HouseLookupError {
        pub longitude_deg: f64,
    }

    /// House number (1..=12) whose circular interval [cusp[i], cusp[i+1])
    /// contains the longitude.
    pub fn house_of(longitude_deg: f64, cusps: &HouseCusps) -> Result<u8, HouseLookupError> {
        let lon = normalize_deg(longitude_deg);
        for i in 0..SIGN_COUNT {
            let start = cusps[i];
            let end = cusps[(i + 1) % SIGN_COUNT];
            let inside = if start > end {
                // Interval crosses 0° Aries.
                lon >= start || lon < end
            } else {
                lon >= start && lon < end
            };
            if inside {
                return Ok((i + 1) as u8);
            }
        }
        Err(HouseLookupError {
            longitude_deg: lon,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::angle::{normalize_deg, separation_deg, signed_delta_deg};
    use super::houses::house_of;
    use super::sign::{ZodiacSign, degree_in_sign, sign_index};

    #[test]
    fn normalization_wraps_both_directions() {
        assert_eq!(normalize_deg(370.0), 10.0);
        assert_eq!(normalize_deg(-10.0), 350.0);
        assert_eq!(normalize_deg(720.0), 0.0);
    }

    #[test]
    fn signed_delta_folds_to_half_open_range() {
        assert_eq!(signed_delta_deg(180.0), 180.0);
        assert_eq!(signed_delta_deg(-180.0), 180.0);
        assert_eq!(signed_delta_deg(190.0), -170.0);
        assert_eq!(signed_delta_deg(-190.0), 170.0);
    }

    #[test]
    fn separation_is_symmetric_and_folded() {
        assert_eq!(separation_deg(10.0, 350.0), 20.0);
        assert_eq!(separation_deg(350.0, 10.0), 20.0);
        assert_eq!(separation_deg(90.0, 270.0), 180.0);
        assert_eq!(separation_deg(123.4, 123.4), 0.0);
    }

    #[test]
    fn sign_split_matches_thirty_degree_bands() {
        assert_eq!(sign_index(0.0), 0);
        assert_eq!(sign_index(29.999), 0);
        assert_eq!(sign_index(30.0), 1);
        assert_eq!(ZodiacSign::from_longitude(359.9), ZodiacSign::Pisces);
        assert!((degree_in_sign(95.5) - 5.5).abs() < 1e-12);
    }

    #[test]
    fn house_lookup_handles_wrap_interval() {
        let cusps = [
            330.0, 0.0, 30.0, 60.0, 90.0, 120.0, 150.0, 180.0, 210.0, 240.0, 270.0, 300.0,
        ];
        assert_eq!(house_of(345.0, &cusps), Ok(1));
        assert_eq!(house_of(15.0, &cusps), Ok(2));
        assert_eq!(house_of(329.9, &cusps), Ok(12));
    }
}
