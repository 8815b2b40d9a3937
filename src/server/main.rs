//! Reverse geocoding server.
//!
//! Builds the state catalog and region index once at startup, then answers
//! lookups over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use geoservice::api;
use geoservice::config::{Config, Overrides};
use geoservice::GeocodeResolver;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "geoservice")]
#[command(about = "Resolve coordinates to US state and city/county")]
struct Args {
    /// Optional TOML config file
    #[arg(short, long, env = "GEOSERVICE_CONFIG")]
    config: Option<PathBuf>,

    /// State boundaries GeoJSON
    #[arg(long, env = "STATES")]
    states: Option<PathBuf>,

    /// City/county/community boundaries GeoJSON
    #[arg(long, env = "CITIES_COUNTIES")]
    regions: Option<PathBuf>,

    /// Listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// Listen port on 0.0.0.0, ignored when --listen is given
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

impl Args {
    /// Flags and environment win over the optional config file, per field
    fn into_config(self) -> Result<Config> {
        Config::load_with_overrides(
            self.config.as_deref(),
            Overrides {
                listen: self.listen,
                port: self.port,
                states: self.states,
                regions: self.regions,
            },
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config()?;

    info!("Geoservice starting");
    info!("Processing GeoJSON files. This normally takes a bit.");

    let sources = config.sources.clone();
    let resolver = tokio::task::spawn_blocking(move || GeocodeResolver::load(&sources))
        .await
        .context("Index build task panicked")?
        .context("Failed to build geocode index")?;

    let app = api::router(Arc::new(resolver));

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    axum::serve(listener, app).await?;

    Ok(())
}
