//! Export helpers for CSV and JSON artifacts.

use thiserror::Error;

/// Errors surfaced while writing or reading artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// JSON artifact save/load for any serializable result structure.
pub mod json {
    use std::fs::{self, File};
    use std::io::BufReader;
    use std::path::Path;

    use serde::Serialize;
    use serde::de::DeserializeOwned;

    use crate::ExportError;

    /// Write a value as pretty-printed JSON, creating parent directories.
    pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        serde_json::to_writer_pretty(File::create(path)?, value)?;
        Ok(())
    }

    /// Read a JSON artifact back.
    pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, ExportError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// CSV table of transit scan intervals.
pub mod transits {
    use std::fs;
    use std::io::{self, Write};
    use std::path::Path;

    use astro_ephem::time::date_from_julian_day;
    use astro_search::TransitInterval;

    use crate::ExportError;

    /// Create a writer for the target path, handling stdout (`-`) by
    /// convention.
    pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
        if path == Path::new("-") {
            return Ok(Box::new(io::stdout()));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Box::new(fs::File::create(path)?))
    }

    /// Write one row per interval, sorted as produced by the scanner.
    pub fn write_intervals(
        writer: Box<dyn Write>,
        intervals: &[TransitInterval],
    ) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([
            "transiting",
            "aspect",
            "natal",
            "start_date",
            "end_date",
            "extends_beyond_horizon",
            "min_orb_deg",
            "peak_date",
            "transiting_sign",
            "transiting_retrograde",
            "natal_sign",
            "natal_house",
        ])?;
        for interval in intervals {
            csv.write_record([
                interval.transiting.to_string(),
                interval.aspect.clone(),
                interval.natal.to_string(),
                iso_date(interval.start_jd_ut),
                iso_date(interval.end_jd_ut),
                interval.extends_beyond_horizon.to_string(),
                format!("{:.2}", interval.min_orb_deg),
                iso_date(interval.peak_jd_ut),
                interval.transiting_sign.clone(),
                interval.transiting_retrograde.to_string(),
                interval.natal_sign.clone(),
                interval
                    .natal_house
                    .map(|h| h.to_string())
                    .unwrap_or_default(),
            ])?;
        }
        csv.flush()?;
        Ok(())
    }

    fn iso_date(jd_ut: f64) -> String {
        match date_from_julian_day(jd_ut) {
            Some((year, month, day)) => format!("{year:04}-{month:02}-{day:02}"),
            None => String::new(),
        }
    }
}
