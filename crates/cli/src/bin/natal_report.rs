use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::Parser;

use astro_chart_calculator::aspects::AspectScan;
use astro_chart_calculator::chart::{ChartLayer, PofFormula};
use astro_chart_calculator::config::{self, ChartSettings};
use astro_chart_calculator::ephem::tabulated::TabulatedEphemeris;
use astro_chart_calculator::export;
use astro_chart_calculator::geometry::sign::degree_in_sign;
use astro_chart_calculator::input::BirthInfo;
use astro_chart_calculator::report::{ChartReport, PhaseOutcome, ReportRequest, compute_report};

/// Compute a full chart report from birth data and a tabulated ephemeris
/// artifact.
#[derive(Parser, Debug)]
#[command(author, version, about = "Natal chart and derived-layer report")]
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

    /// Birth latitude in degrees (ignored when --place is given)
    #[arg(long)]
    lat: Option<f64>,

    /// Birth longitude in degrees (ignored when --place is given)
    #[arg(long)]
    lon: Option<f64>,

    /// Named place resolved against the location catalog
    #[arg(long)]
    place: Option<String>,

    /// Location catalog (YAML file, TOML file, or directory of TOML)
    #[arg(long)]
    locations: Option<PathBuf>,

    /// Tabulated ephemeris dataset (JSON)
    #[arg(long)]
    ephemeris: PathBuf,

    /// Reference instant for transits/progressions (RFC 3339; default now)
    #[arg(long)]
    reference: Option<DateTime<Utc>>,

    /// Settings override file (YAML or TOML)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Use the legacy always-day Part of Fortune formula
    #[arg(long, default_value_t = false)]
    legacy_pof: bool,

    /// Also run the year-horizon transit window scan
    #[arg(long, default_value_t = false)]
    scan_windows: bool,

    /// Write the full report as JSON instead of the text summary
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let (latitude, longitude) = resolve_place(&cli)?;
    let birth = BirthInfo::from_fields(&cli.date, &cli.time, &cli.utc_offset, latitude, longitude)?;
    let settings = match &cli.settings {
        Some(path) => config::load_settings(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => ChartSettings::default(),
    };
    let ephemeris = TabulatedEphemeris::load(&cli.ephemeris)?;

    let request = ReportRequest {
        birth,
        now_utc: cli.reference.unwrap_or_else(Utc::now),
        settings,
        pof_formula: if cli.legacy_pof {
            PofFormula::AlwaysDay
        } else {
            PofFormula::DayNightSensitive
        },
        scan_transit_windows: cli.scan_windows,
    };
    let report = compute_report(&ephemeris, &request, None)?;

    match &cli.output {
        Some(path) => {
            export::json::save(path, &report)?;
            println!("report written to {}", path.display());
        }
        None => print_summary(&report),
    }
    Ok(())
}

fn resolve_place(cli: &Cli) -> anyhow::Result<(f64, f64)> {
    if let Some(place) = &cli.place {
        let Some(catalog) = &cli.locations else {
            bail!("--place requires --locations");
        };
        let locations = config::load_locations(catalog)
            .with_context(|| format!("loading locations from {}", catalog.display()))?;
        let found = config::find_location(&locations, place)
            .with_context(|| format!("place `{place}` not found in the catalog"))?;
        return Ok((found.latitude_deg, found.longitude_deg));
    }
    match (cli.lat, cli.lon) {
        (Some(lat), Some(lon)) => Ok((lat, lon)),
        _ => bail!("either --place or both --lat and --lon are required"),
    }
}

fn print_summary(report: &ChartReport) {
    println!(
        "birth {} | reference {} | age {}",
        report.birth_utc, report.reference_utc, report.age_years
    );
    print_layer(&report.natal);
    println!("natal aspects: {}", aspect_summary(&report.natal_aspects));
    for (name, phase) in [
        ("transit", &report.transit),
        ("progressed", &report.progressed),
        ("solar arc", &report.solar_arc),
        ("heliocentric", &report.heliocentric),
    ] {
        match phase {
            PhaseOutcome::Completed(result) => {
                print_layer(&result.layer);
                println!("{name} aspects: {}", aspect_summary(&result.aspects));
            }
            PhaseOutcome::Failed { message } => println!("{name}: {message}"),
        }
    }
    match &report.solar_return {
        PhaseOutcome::Completed(result) => {
            println!("solar return at JD {:.5}", result.return_jd_ut);
            print_layer(&result.layer);
        }
        PhaseOutcome::Failed { message } => println!("solar return: {message}"),
    }
    for matched in &report.harmonics {
        println!(
            "harmonic {}: {} / {} (residual {:.2}°)",
            matched.harmonic, matched.a, matched.b, matched.residual_deg
        );
    }
    if let Some(PhaseOutcome::Completed(windows)) = &report.transit_windows {
        println!("{} transit windows detected", windows.len());
    }
}

fn aspect_summary(scan: &AspectScan) -> String {
    match scan {
        AspectScan::Found(matches) => {
            let lines: Vec<String> = matches
                .iter()
                .map(|m| format!("{} {} {} (orb {:.2}°)", m.a, m.aspect, m.b, m.orb_deg))
                .collect();
            format!("{} found\n  {}", matches.len(), lines.join("\n  "))
        }
        AspectScan::NoneWithinOrb => "none within the configured orbs".to_string(),
    }
}

fn print_layer(layer: &ChartLayer) {
    println!("-- {} layer --", layer.kind);
    for point in &layer.points {
        let retro = if point.retrograde { " (R)" } else { "" };
        let house = layer
            .house_of(point.id)
            .map(|h| format!(" house {h}"))
            .unwrap_or_default();
        println!(
            "{}{:<16} {:<11} {:>5.2}°{}{}",
            layer.kind.prefix(),
            point.id.name(),
            point.sign().name(),
            degree_in_sign(point.longitude_deg),
            retro,
            house
        );
    }
    if let Some(warning) = &layer.house_warning {
        println!("   note: {warning}");
    }
}
