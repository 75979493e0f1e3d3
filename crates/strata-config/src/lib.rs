//! Configuration system for the Strata terrain core.
//!
//! Settings persist to disk as RON files, can be overridden from the command
//! line via clap, and support hot-reload detection with forward/backward
//! compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AlignmentSetting, Config, DebugConfig, DemoConfig, LodConfig, SourceKind, StreamingConfig,
    TerrainConfig, default_config_dir,
};
pub use error::ConfigError;
