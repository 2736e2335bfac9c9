//! Harmonic resonance search: does scaling a pair's separation by a small
//! integer land near an exact conjunction?

use astro_chart::{ChartLayer, PointId};
use astro_config::HarmonicSettings;
use astro_core::angle::{normalize_deg, separation_deg};
use serde::{Deserialize, Serialize};

use crate::excluded_pair;

/// One resonant pair at one harmonic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicMatch {
    pub a: PointId,
    pub b: PointId,
    pub harmonic: u32,
    /// Base separation of the pair, in [0, 180].
    pub separation_deg: f64,
    /// Distance of the scaled separation from 0° (mod 360).
    pub residual_deg: f64,
}

/// Scan every unordered pair of the layer for harmonic resonance.
///
/// Pairs under the exclusion policy are skipped, as are pairs already
/// within `conjunction_exclusion_deg` of an exact conjunction (they
/// resonate trivially at every multiplier). Pure pattern matching, no
/// iteration.
pub fn find_resonances(layer: &ChartLayer, settings: &HarmonicSettings) -> Vec<HarmonicMatch> {
    let mut matches = Vec::new();
    for (i, a) in layer.points.iter().enumerate() {
        for b in &layer.points[i + 1..] {
            if excluded_pair(a.id, b.id) {
                continue;
            }
            let separation = separation_deg(a.longitude_deg, b.longitude_deg);
            if separation < settings.conjunction_exclusion_deg {
                continue;
            }
            for &harmonic in &settings.multipliers {
                let scaled = normalize_deg(separation * f64::from(harmonic));
                let residual = scaled.min(360.0 - scaled);
                if residual < settings.orb_deg {
                    matches.push(HarmonicMatch {
                        a: a.id,
                        b: b.id,
                        harmonic,
                        separation_deg: separation,
                        residual_deg: residual,
                    });
                }
            }
        }
    }
    matches
}
