//! Configuration models and loaders for the astro chart calculator.
//!
//! The canonical tables (aspect rules, rosters, harmonic multipliers, scan
//! settings) are fixed values of the domain and ship as `Default` impls;
//! every one of them can be overridden from a YAML file, a TOML file, or a
//! directory of TOML files. Components take these tables as explicit
//! inputs, never as process-wide globals.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// One aspect rule: an exact angle plus the orb limits on either side of it.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AspectRule {
    pub label: String,
    pub exact_angle_deg: f64,
    /// Orb when either point of the pair is a luminary.
    pub orb_luminary_deg: f64,
    /// Orb when neither point is a luminary.
    pub orb_standard_deg: f64,
}

impl AspectRule {
    fn new(label: &str, exact_angle_deg: f64, orb_luminary_deg: f64, orb_standard_deg: f64) -> Self {
        Self {
            label: label.to_string(),
            exact_angle_deg,
            orb_luminary_deg,
            orb_standard_deg,
        }
    }
}

/// Ordered aspect rule collection. Insertion order decides which label is
/// reported if two rules could both match; the canonical tables keep their
/// angles far enough apart that orbs never overlap.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AspectTable {
    pub rules: Vec<AspectRule>,
}

impl AspectTable {
    /// The full table: conjunction, sextile, square, trine, opposition.
    /// Major aspects carry the 8°/6° orbs, the sextile a flat 3°.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                AspectRule::new("Conjunction", 0.0, 8.0, 6.0),
                AspectRule::new("Sextile", 60.0, 3.0, 3.0),
                AspectRule::new("Square", 90.0, 8.0, 6.0),
                AspectRule::new("Trine", 120.0, 8.0, 6.0),
                AspectRule::new("Opposition", 180.0, 8.0, 6.0),
            ],
        }
    }

    /// Subset used by the transit window scanner. The sextile is too brief
    /// at daily sampling to produce meaningful intervals, so the period
    /// search runs on the major aspects only.
    pub fn transit_search() -> Self {
        Self {
            rules: vec![
                AspectRule::new("Conjunction", 0.0, 8.0, 6.0),
                AspectRule::new("Square", 90.0, 8.0, 6.0),
                AspectRule::new("Trine", 120.0, 8.0, 6.0),
                AspectRule::new("Opposition", 180.0, 8.0, 6.0),
            ],
        }
    }
}

impl Default for AspectTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Harmonic resonance search settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HarmonicSettings {
    /// Integer multipliers tested against every natal pair.
    #[serde(default = "default_harmonics")]
    pub multipliers: Vec<u32>,
    /// How close the scaled separation must land to 0° (mod 360).
    #[serde(default = "default_harmonic_orb")]
    pub orb_deg: f64,
    /// Pairs closer than this to an exact conjunction are skipped; they
    /// resonate trivially at every harmonic.
    #[serde(default = "default_conjunction_exclusion")]
    pub conjunction_exclusion_deg: f64,
}

fn default_harmonics() -> Vec<u32> {
    vec![5, 7, 16, 18, 24, 50]
}

fn default_harmonic_orb() -> f64 {
    2.0
}

fn default_conjunction_exclusion() -> f64 {
    1.0
}

impl Default for HarmonicSettings {
    fn default() -> Self {
        Self {
            multipliers: default_harmonics(),
            orb_deg: default_harmonic_orb(),
            conjunction_exclusion_deg: default_conjunction_exclusion(),
        }
    }
}

/// Transit window scanner settings.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ScanSettings {
    /// Scan horizon in days from the start instant.
    #[serde(default = "default_horizon")]
    pub horizon_days: u32,
    /// Sampling step in days. Daily sampling is the deliberate
    /// accuracy/cost tradeoff; sub-day Moon transits can slip through.
    #[serde(default = "default_step")]
    pub step_days: f64,
    /// In-orb hits further apart than this start a new interval instead of
    /// extending the open one.
    #[serde(default = "default_merge_gap")]
    pub merge_gap_days: f64,
    /// Safety valve for intervals still in orb at the horizon: keep
    /// stepping at most this many days past it.
    #[serde(default = "default_extension_cap")]
    pub extension_cap_days: u32,
}

fn default_horizon() -> u32 {
    365
}

fn default_step() -> f64 {
    1.0
}

fn default_merge_gap() -> f64 {
    1.5
}

fn default_extension_cap() -> u32 {
    365
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon(),
            step_days: default_step(),
            merge_gap_days: default_merge_gap(),
            extension_cap_days: default_extension_cap(),
        }
    }
}

/// Named place resolving to coordinates, parsed from location catalogs.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LocationConfig {
    pub name: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

/// Per-layer body rosters. Which bodies a layer carries is a fixed
/// convention of the domain, not a per-run knob.
pub mod rosters {
    use astro_ephem::Body;

    /// Natal and solar-return layers: everything the oracle knows
    /// geocentrically, minor points included.
    pub fn natal() -> Vec<Body> {
        vec![
            Body::Sun,
            Body::Moon,
            Body::Mercury,
            Body::Venus,
            Body::Mars,
            Body::Jupiter,
            Body::Saturn,
            Body::Uranus,
            Body::Neptune,
            Body::Pluto,
            Body::Chiron,
            Body::MeanNode,
            Body::MeanApogee,
        ]
    }

    /// Transit layers: the ten planets; minor points move too slowly or
    /// too noisily to transit meaningfully.
    pub fn transit() -> Vec<Body> {
        vec![
            Body::Sun,
            Body::Moon,
            Body::Mercury,
            Body::Venus,
            Body::Mars,
            Body::Jupiter,
            Body::Saturn,
            Body::Uranus,
            Body::Neptune,
            Body::Pluto,
        ]
    }

    /// Progressed and solar-arc layers: personal planets only; the outers
    /// barely move in a progressed lifetime.
    pub fn progressed() -> Vec<Body> {
        vec![
            Body::Sun,
            Body::Moon,
            Body::Mercury,
            Body::Venus,
            Body::Mars,
            Body::Jupiter,
            Body::Saturn,
        ]
    }

    /// Heliocentric layer: Earth plus the planets. Sun, Moon, and the
    /// minor points have no reading from the Sun's vantage.
    pub fn heliocentric() -> Vec<Body> {
        vec![
            Body::Earth,
            Body::Mercury,
            Body::Venus,
            Body::Mars,
            Body::Jupiter,
            Body::Saturn,
            Body::Uranus,
            Body::Neptune,
            Body::Pluto,
        ]
    }
}

/// Top-level override file: any omitted section keeps its default.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ChartSettings {
    #[serde(default)]
    pub aspects: AspectTable,
    #[serde(default)]
    pub harmonics: HarmonicSettings,
    #[serde(default)]
    pub scan: ScanSettings,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Load a settings override file (YAML or TOML by extension).
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<ChartSettings, ConfigError> {
    let path = path.as_ref();
    if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// Load a location catalog from a YAML file, a TOML file, or a directory
/// of TOML files.
pub fn load_locations<P: AsRef<Path>>(path: P) -> Result<Vec<LocationConfig>, ConfigError> {
    load_records(path)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> serde::Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "toml").unwrap_or(false))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}

/// Case-insensitive lookup in a location catalog.
pub fn find_location<'a>(
    locations: &'a [LocationConfig],
    name: &str,
) -> Option<&'a LocationConfig> {
    locations
        .iter()
        .find(|loc| loc.name.eq_ignore_ascii_case(name))
}
