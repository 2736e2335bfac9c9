//! All-pairs angular-difference classification against an aspect table.

use astro_chart::{ChartLayer, ChartPoint, PointId};
use astro_config::AspectTable;
use astro_core::angle::separation_deg;
use serde::{Deserialize, Serialize};

pub mod harmonics;

pub use harmonics::{HarmonicMatch, find_resonances};

/// One detected aspect between two chart points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectMatch {
    pub a: PointId,
    pub b: PointId,
    /// Label of the matching rule (e.g. "Trine").
    pub aspect: String,
    pub exact_angle_deg: f64,
    /// Folded angular separation of the pair, in [0, 180].
    pub separation_deg: f64,
    /// Measured deviation from the exact angle; always below the
    /// applicable orb limit.
    pub orb_deg: f64,
}

/// Detector outcome. An explicit empty variant distinguishes "ran and
/// found nothing" from "did not run".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AspectScan {
    Found(Vec<AspectMatch>),
    NoneWithinOrb,
}

impl AspectScan {
    fn from_matches(matches: Vec<AspectMatch>) -> Self {
        if matches.is_empty() {
            AspectScan::NoneWithinOrb
        } else {
            AspectScan::Found(matches)
        }
    }

    pub fn matches(&self) -> &[AspectMatch] {
        match self {
            AspectScan::Found(matches) => matches,
            AspectScan::NoneWithinOrb => &[],
        }
    }
}

/// Pairs of an angular/sensitive point with a minor point are never
/// aspect-worthy in this model, in either order.
pub fn excluded_pair(a: PointId, b: PointId) -> bool {
    (a.is_angular() && b.is_minor()) || (a.is_minor() && b.is_angular())
}

/// Classify one pair against the table. The first rule in insertion order
/// whose orb covers the separation wins; the canonical tables space their
/// angles so orbs never overlap.
pub fn classify_pair(a: &ChartPoint, b: &ChartPoint, table: &AspectTable) -> Option<AspectMatch> {
    if excluded_pair(a.id, b.id) {
        return None;
    }
    let separation = separation_deg(a.longitude_deg, b.longitude_deg);
    let luminary_involved = a.luminary || b.luminary;
    for rule in &table.rules {
        let limit = if luminary_involved {
            rule.orb_luminary_deg
        } else {
            rule.orb_standard_deg
        };
        let orb = (separation - rule.exact_angle_deg).abs();
        if limit > 0.0 && orb < limit {
            return Some(AspectMatch {
                a: a.id,
                b: b.id,
                aspect: rule.label.clone(),
                exact_angle_deg: rule.exact_angle_deg,
                separation_deg: separation,
                orb_deg: orb,
            });
        }
    }
    None
}

/// Aspects between two distinct layers: every cross pair, in enumeration
/// order (not sorted by orb tightness).
pub fn detect_between(first: &ChartLayer, second: &ChartLayer, table: &AspectTable) -> AspectScan {
    let mut matches = Vec::new();
    for a in &first.points {
        for b in &second.points {
            if let Some(hit) = classify_pair(a, b, table) {
                matches.push(hit);
            }
        }
    }
    AspectScan::from_matches(matches)
}

/// Aspects within a single layer: unordered pairs only, never a point
/// against itself and never both (X, Y) and (Y, X).
pub fn detect_within(layer: &ChartLayer, table: &AspectTable) -> AspectScan {
    let mut matches = Vec::new();
    for (i, a) in layer.points.iter().enumerate() {
        for b in &layer.points[i + 1..] {
            if let Some(hit) = classify_pair(a, b, table) {
                matches.push(hit);
            }
        }
    }
    AspectScan::from_matches(matches)
}
