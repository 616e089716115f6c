//! cuemix - headless driver for the audio cue engine
//!
//! Loads the audio configuration, builds the clip catalog and runs a
//! scripted walk through the engine, logging gains as it goes.

mod config;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use config::AppConfig;
use cuemix_audio::{AudioManager, OutputBackend};
use scenario::Scenario;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless driver for the cuemix audio engine", long_about = None)]
struct Args {
    /// Audio configuration (engine tunables, settings and clip manifest)
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Number of simulation ticks to run
    #[arg(long, default_value_t = 1200)]
    ticks: u64,

    /// Simulation ticks per second
    #[arg(long, default_value_t = 60)]
    tick_rate: u32,

    /// Seed for pitch and note selection (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Play through the default output device (needs the `rodio_backend` feature)
    #[arg(long)]
    device: bool,
}

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting cuemix v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let mut app = AppConfig::load_from_path(&args.config);
    if args.seed.is_some() {
        app.engine.rng_seed = args.seed;
    }
    if args.tick_rate == 0 {
        anyhow::bail!("--tick-rate must be at least 1");
    }

    let catalog = Arc::new(app.catalog()?);
    let backend = build_backend(&app, args.device)?;
    let mut audio = AudioManager::new(app.engine.clone(), catalog, backend);
    audio.update_settings(app.settings.clone());
    audio.init().context("Failed to initialize audio engine")?;

    let dt = 1.0 / args.tick_rate as f32;
    let summary = Scenario::new(args.ticks).run(&mut audio, dt);
    info!(?summary, "Scenario finished");
    println!(
        "{} ticks: {} shots, {} steps, {} pickups, {} landings, {} notes, peak {} one-shots",
        summary.ticks,
        summary.shots,
        summary.steps,
        summary.pickups,
        summary.landings,
        summary.notes,
        summary.peak_one_shots
    );
    Ok(())
}

#[cfg(feature = "rodio_backend")]
fn build_backend(app: &AppConfig, device: bool) -> Result<Box<dyn OutputBackend>> {
    if !device {
        return Ok(Box::new(app.simulated_backend()));
    }
    let mut backend = cuemix_audio::RodioBackend::new()?;
    for clip in &app.clips {
        let Some(path) = &clip.path else {
            continue;
        };
        match std::fs::read(path) {
            Ok(data) => backend.load_clip(clip.entry.handle, data),
            Err(err) => tracing::warn!("Failed to read {}: {err}", path.display()),
        }
    }
    Ok(Box::new(backend))
}

#[cfg(not(feature = "rodio_backend"))]
fn build_backend(app: &AppConfig, device: bool) -> Result<Box<dyn OutputBackend>> {
    if device {
        tracing::warn!("--device needs the rodio_backend feature; using the simulated backend");
    }
    Ok(Box::new(app.simulated_backend()))
}
