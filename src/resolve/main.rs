//! Batch resolver.
//!
//! Reads `lat,lon` rows from CSV and writes one resolution per row. Handy for
//! checking a dataset or timing lookups without the HTTP server.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use csv::{ReaderBuilder, WriterBuilder};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use geoservice::config::{Config, Overrides, SourcesConfig};
use geoservice::{GeocodeResolver, Resolution};

#[derive(Parser, Debug)]
#[command(name = "resolve")]
#[command(about = "Resolve a batch of coordinates to US state and city/county")]
struct Args {
    /// Optional TOML config file providing the sources
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// State boundaries GeoJSON
    #[arg(long, env = "STATES")]
    states: Option<PathBuf>,

    /// City/county/community boundaries GeoJSON
    #[arg(long, env = "CITIES_COUNTIES")]
    regions: Option<PathBuf>,

    /// CSV with `lat` and `lon` columns (optionally .gz)
    #[arg(short, long, conflicts_with_all = ["lat", "lon"])]
    input: Option<PathBuf>,

    /// Single point latitude
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Single point longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Output CSV, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct InputRow {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    lat: f64,
    lon: f64,
    status: &'static str,
    city: &'a str,
    state: &'a str,
    community_id: &'a str,
}

impl<'a> OutputRow<'a> {
    fn new(input: InputRow, resolution: &'a Resolution) -> Self {
        let mut row = OutputRow {
            lat: input.lat,
            lon: input.lon,
            status: resolution.status(),
            city: "",
            state: "",
            community_id: "",
        };
        match resolution {
            Resolution::Resolved(region) => {
                row.city = region.name.as_str();
                row.state = region.state.as_str();
                row.community_id = region.community_id.as_deref().unwrap_or("");
            }
            Resolution::NotFoundRegion { state } => row.state = state.as_str(),
            Resolution::NotFoundState => {}
        }
        row
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean CSV
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let sources = sources(&args)?;

    let rows = match (&args.input, args.lat, args.lon) {
        (Some(path), _, _) => load_rows(path)?,
        (None, Some(lat), Some(lon)) => vec![InputRow { lat, lon }],
        _ => bail!("Provide --input or both --lat and --lon"),
    };

    let resolver = GeocodeResolver::load(&sources).context("Failed to build geocode index")?;

    info!("Resolving {} points...", rows.len());
    let started = Instant::now();

    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let resolutions: Vec<Resolution> = rows
        .par_iter()
        .map(|row| {
            let resolution = resolver.resolve(row.lat, row.lon);
            pb.inc(1);
            resolution
        })
        .collect();
    pb.finish_and_clear();

    let elapsed = started.elapsed();
    let resolved = resolutions
        .iter()
        .filter(|r| matches!(r, Resolution::Resolved(_)))
        .count();
    info!(
        "Resolved {}/{} points in {:.2?} ({:.1} us/point)",
        resolved,
        rows.len(),
        elapsed,
        elapsed.as_secs_f64() * 1e6 / rows.len().max(1) as f64
    );

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = WriterBuilder::new().from_writer(sink);
    for (row, resolution) in rows.iter().zip(&resolutions) {
        writer.serialize(OutputRow::new(*row, resolution))?;
    }
    writer.flush()?;

    Ok(())
}

/// Flags and environment win over the config file, per field
fn sources(args: &Args) -> Result<SourcesConfig> {
    let config = Config::load_with_overrides(
        args.config.as_deref(),
        Overrides {
            states: args.states.clone(),
            regions: args.regions.clone(),
            ..Default::default()
        },
    )?;
    Ok(config.sources)
}

fn load_rows(path: &Path) -> Result<Vec<InputRow>> {
    info!("Loading points from {}", path.display());

    let file = File::open(path).context("Failed to open input file")?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (line, record) in csv_reader.deserialize::<InputRow>().enumerate() {
        rows.push(record.with_context(|| format!("Bad input row {}", line + 1))?);
    }
    Ok(rows)
}
