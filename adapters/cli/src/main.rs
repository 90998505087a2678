#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Rollout Reef visualization.

mod runtime;
mod scheduler;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rollout_reef_core::Category;
use rollout_reef_rendering::{Color, Presentation, RenderingBackend, Scene, SurfaceExtent};
use rollout_reef_rendering_macroquad::MacroquadBackend;
use rollout_reef_system_backend::{Config as BackendConfig, SimulatedBackend};
use rollout_reef_system_panel::{ControlPanel, EnvOverrides};
use rollout_reef_system_traffic::{Config as TrafficConfig, Traffic};

use crate::runtime::{run_headless, Runtime};

const WINDOW_TITLE: &str = "Rollout Reef";
const DEFAULT_SURFACE_WIDTH: f32 = 1280.0;
const DEFAULT_SURFACE_HEIGHT: f32 = 720.0;

/// Deep-water backdrop used when no background image is available.
const CLEAR_COLOR: Color = Color::from_rgb_u8(39, 12, 83);

#[derive(Debug, Parser)]
#[command(name = "rollout-reef", about = "Canary rollout traffic visualization")]
struct Args {
    /// Category the in-process simulated backend serves.
    #[arg(long, default_value = "blue")]
    category: String,

    /// Environment-style error rate percent used when the panel carries no
    /// entry for the backend's category.
    #[arg(long, default_value_t = 0)]
    error_rate: u32,

    /// Environment-style injected latency in seconds.
    #[arg(long, default_value_t = 0.0)]
    latency: f64,

    /// Path to an env.js-style overrides resource seeding new panel entries.
    #[arg(long)]
    env_config: Option<PathBuf>,

    /// Master seed for deterministic runs.
    #[arg(long, default_value_t = 0x0ddb_a11)]
    seed: u64,

    /// Run without a window for this many nominal frames, then exit.
    #[arg(long)]
    headless_frames: Option<u64>,

    /// Path to the image manifest.
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Print frame rate metrics once per second.
    #[arg(long, default_value_t = false)]
    show_fps: bool,

    /// Render as fast as possible instead of synchronising with the display.
    #[arg(long, default_value_t = false)]
    no_vsync: bool,
}

/// Entry point for the Rollout Reef command-line interface.
fn main() -> Result<()> {
    init_logging();

    let args = Args::parse();
    let category = Category::from_wire(&args.category)
        .ok_or_else(|| anyhow!("unknown category `{}`", args.category))?;

    let overrides = load_env_overrides(args.env_config.as_deref());

    let mut seeds = ChaCha8Rng::seed_from_u64(args.seed);
    let backend = SimulatedBackend::new(BackendConfig::new(
        category,
        args.error_rate,
        args.latency,
        seeds.gen(),
    ));
    let traffic = Traffic::new(TrafficConfig::new(seeds.gen()));
    let runtime = Runtime::new(traffic, ControlPanel::new(), backend, overrides);

    match args.headless_frames {
        Some(frames) => {
            run_headless(runtime, frames);
            Ok(())
        }
        None => run_windowed(&args, runtime),
    }
}

fn run_windowed(args: &Args, mut runtime: Runtime) -> Result<()> {
    let scene = Scene {
        surface: SurfaceExtent::new(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT),
        ..Scene::default()
    };
    let presentation = Presentation::new(WINDOW_TITLE, CLEAR_COLOR, scene);

    let mut backend = MacroquadBackend::new()
        .with_vsync(!args.no_vsync)
        .with_show_fps(args.show_fps);
    if let Some(manifest) = &args.manifest {
        backend = backend.with_manifest_path(manifest.clone());
    }

    backend.run(presentation, move |dt, input, scene| {
        runtime.frame(dt, input, scene);
    })
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Reads the env.js-style overrides resource once at startup.
///
/// An unreadable resource behaves like a non-200 fetch: every override
/// resets to zero. Callers wanting fresher values restart the process; the
/// staleness is deliberate.
fn load_env_overrides(path: Option<&Path>) -> EnvOverrides {
    let Some(path) = path else {
        return EnvOverrides::default();
    };

    match fs::read_to_string(path) {
        Ok(body) => EnvOverrides::from_fetch(200, &body),
        Err(error) => {
            tracing::warn!(
                %error,
                path = %path.display(),
                "env overrides unavailable; resetting to zero"
            );
            EnvOverrides::from_fetch(0, "")
        }
    }
}
