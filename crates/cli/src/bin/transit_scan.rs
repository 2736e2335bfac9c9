use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;

use astro_chart_calculator::chart::{ChartRequest, LayerKind, build_layer};
use astro_chart_calculator::config::{self, AspectTable, ChartSettings, rosters};
use astro_chart_calculator::ephem::tabulated::TabulatedEphemeris;
use astro_chart_calculator::ephem::time::julian_day_from_civil;
use astro_chart_calculator::export;
use astro_chart_calculator::input::BirthInfo;
use astro_chart_calculator::search::{ScanProgress, ScanRequest, TimeWindow, scan_transits};

/// Scan a one-year horizon for transiting aspects against a natal chart
/// and write the detected windows as CSV.
#[derive(Parser, Debug)]
#[command(author, version, about = "Transit window scanner (CSV output)")]
struct Cli {
    /// Birth date, YYYY-MM-DD (local to the birth place)
    #[arg(long)]
    date: String,

    /// Birth time, HH:MM or HH:MM:SS (local to the birth place)
    #[arg(long)]
    time: String,

    /// UTC offset of the birth place, e.g. +09:00
    #[arg(long, default_value = "+00:00")]
    utc_offset: String,

    /// Birth latitude in degrees
    #[arg(long)]
    lat: f64,

    /// Birth longitude in degrees
    #[arg(long)]
    lon: f64,

    /// Tabulated ephemeris dataset (JSON)
    #[arg(long)]
    ephemeris: PathBuf,

    /// Scan start instant (RFC 3339; default now)
    #[arg(long)]
    start: Option<DateTime<Utc>>,

    /// Settings override file (YAML or TOML)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Output CSV file (use '-' for stdout)
    #[arg(long, default_value = "artifacts/transits.csv")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let birth = BirthInfo::from_fields(&cli.date, &cli.time, &cli.utc_offset, cli.lat, cli.lon)?;
    let settings = match &cli.settings {
        Some(path) => config::load_settings(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => ChartSettings::default(),
    };
    let ephemeris = TabulatedEphemeris::load(&cli.ephemeris)?;

    let natal_roster = rosters::natal();
    let natal = build_layer(
        &ephemeris,
        &ChartRequest::geocentric(
            LayerKind::Natal,
            julian_day_from_civil(&birth.moment_utc),
            birth.latitude_deg,
            birth.longitude_deg,
            &natal_roster,
        ),
    )?;

    let start = cli.start.unwrap_or_else(Utc::now);
    let transit_roster = rosters::transit();
    let scan_table = AspectTable::transit_search();
    let mut report_progress = |progress: ScanProgress| {
        if progress.day_offset as u32 % 30 == 0 {
            log::info!(
                "scanned day {}/{} ({} open intervals)",
                progress.day_offset,
                progress.horizon_days,
                progress.open_intervals
            );
        }
    };
    let intervals = scan_transits(
        &ephemeris,
        &ScanRequest {
            natal: &natal,
            window: TimeWindow {
                start_jd_ut: julian_day_from_civil(&start),
                horizon_days: settings.scan.horizon_days,
            },
            latitude_deg: birth.latitude_deg,
            longitude_deg: birth.longitude_deg,
            roster: &transit_roster,
            table: &scan_table,
            settings: settings.scan,
        },
        None,
        Some(&mut report_progress),
    )?;

    let writer = export::transits::writer_for_path(&cli.output)?;
    export::transits::write_intervals(writer, &intervals)?;
    if cli.output != PathBuf::from("-") {
        println!(
            "{} intervals written to {}",
            intervals.len(),
            cli.output.display()
        );
    }
    Ok(())
}
