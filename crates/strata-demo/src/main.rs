//! Headless Strata terrain demo.
//!
//! Builds a terrain from the configured heightfield source, scatters objects
//! on it, then flies a camera around it for a fixed number of frames while
//! streaming chunk geometry into an in-memory scene. Stats are printed once
//! per second.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p strata-demo -- --frames 300 --workers 4`.

mod scenario;

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use strata_config::{CliArgs, Config, default_config_dir};
use strata_world::{DrawMode, FrameLoop, RecordingScene, TerrainOptions, TerrainWorld};
use tracing::{error, info};

use crate::scenario::{CameraFlight, DemoError, build_source, place_objects};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(|| default_config_dir().ok())
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Demo failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), DemoError> {
    config.validate()?;

    let source = build_source(config)?;
    let options = TerrainOptions::from_config(config);
    let started = Instant::now();
    let mut world = TerrainWorld::new(RecordingScene::new(), source.as_ref(), options)?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        source = ?config.demo.source,
        world_size = world.world_size(),
        "Terrain loaded"
    );

    let objects = place_objects(&world, config.demo.object_count, config.demo.seed);
    let steepest = objects
        .iter()
        .map(|o| o.orientation.angle_between(glam::Quat::IDENTITY).to_degrees())
        .fold(0.0_f32, f32::max);
    info!(
        count = objects.len(),
        steepest_deg = steepest,
        "Placed objects on the terrain"
    );

    let mut frame_loop = FrameLoop::from_config(&config.debug);
    if config.debug.wireframe_mode {
        world.set_draw_mode(DrawMode::Wireframe);
    }

    let frames = config.demo.frames;
    let frame_time = config.demo.frame_time;
    let flight = CameraFlight::new(
        world.world_size(),
        config.demo.camera_speed,
        config.demo.camera_altitude,
    );

    let mut last = Instant::now();
    for frame in 0..frames {
        // Scripted key presses: freeze for a stretch, then flip to wireframe.
        if frame == frames / 3 || frame == frames / 2 {
            frame_loop.toggle_freeze();
        }
        if frame == frames * 2 / 3 {
            frame_loop.toggle_wireframe(&mut world);
        }

        let observer = flight.position(&world, frame as f32 * frame_time);
        let dt = last.elapsed().as_secs_f32();
        last = Instant::now();
        if let Some(report) = frame_loop.tick(&mut world, observer, dt) {
            println!(
                "FPS: {:.1} batches: {} triangles: {}",
                report.fps, report.batches, report.triangles
            );
        }
    }

    let stats = *world.stats();
    info!(
        frames = stats.frame,
        leaves = stats.leaves,
        attached = stats.attached,
        in_flight = stats.in_flight,
        stale_discards = stats.stale_discards,
        triangles = stats.triangles,
        elapsed_s = started.elapsed().as_secs_f32(),
        "Demo finished"
    );
    Ok(())
}
