//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, SourceKind};

/// Strata demo command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata-demo", about = "Headless terrain LOD demo")]
pub struct CliArgs {
    /// Heightfield source.
    #[arg(long, value_parser = parse_source)]
    pub source: Option<SourceKind>,

    /// Grayscale image to use as heightmap (implies `--source image`).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Chunk builds allowed per frame.
    #[arg(long)]
    pub budget: Option<u32>,

    /// Background build threads (0 builds inline).
    #[arg(long, conflicts_with = "auto_workers")]
    pub workers: Option<u32>,

    /// Size the build pool from the CPU count.
    #[arg(long)]
    pub auto_workers: bool,

    /// Random seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start in wireframe mode.
    #[arg(long)]
    pub wireframe: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_source(value: &str) -> Result<SourceKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "sinusoid" | "sine" => Ok(SourceKind::Sinusoid),
        "flat" => Ok(SourceKind::Flat),
        "noise" => Ok(SourceKind::Noise),
        "image" => Ok(SourceKind::Image),
        other => Err(format!(
            "unknown source `{other}` (expected sinusoid, flat, noise or image)"
        )),
    }
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(source) = args.source {
            self.demo.source = source;
        }
        if let Some(ref path) = args.image {
            self.demo.source = SourceKind::Image;
            self.demo.image_path = Some(path.clone());
        }
        if let Some(frames) = args.frames {
            self.demo.frames = frames;
        }
        if let Some(budget) = args.budget {
            self.streaming.build_budget = budget;
        }
        if let Some(workers) = args.workers {
            self.streaming.worker_threads = Some(workers);
        }
        if args.auto_workers {
            self.streaming.worker_threads = None;
        }
        if let Some(seed) = args.seed {
            self.demo.seed = seed;
        }
        if args.wireframe {
            self.debug.wireframe_mode = true;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
