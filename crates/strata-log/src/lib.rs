//! Structured logging for the Strata terrain core.
//!
//! Wraps `tracing-subscriber`: a console layer with uptime timestamps and
//! module paths, plus a JSON file layer in debug builds. The filter comes from
//! `RUST_LOG` when set, otherwise from the config's `debug.log_level`.

use std::path::Path;

use strata_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";
const LOG_FILE: &str = "strata.log";

/// Build the filter directive string for a config.
///
/// Crate-level targets are appended so that the terrain crates follow the
/// configured level while third-party crates stay at `warn`.
pub fn filter_directives(config: Option<&Config>) -> String {
    let level = config
        .map(|c| c.debug.log_level.trim())
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_FILTER);

    if level.contains('=') || level.contains(',') {
        // Already a full directive list.
        level.to_string()
    } else {
        format!(
            "warn,strata_world={level},strata_mesh={level},strata_lod={level},\
             strata_heightfield={level},strata_demo={level},strata_config={level}"
        )
    }
}

/// Install the global tracing subscriber.
///
/// # Arguments
///
/// * `log_dir` - Directory for the JSON log file (debug builds only)
/// * `debug_build` - Whether to enable the JSON file layer
/// * `config` - Optional configuration providing `debug.log_level`
///
/// Calling this twice is harmless: the second installation attempt is ignored.
///
/// # Examples
///
/// ```no_run
/// use strata_log::init_logging;
/// use strata_config::Config;
///
/// init_logging(None, false, Some(&Config::default()));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let directives = filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true) // build workers are named
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        let _ = subscriber.with(file_layer).try_init();
        return;
    }

    let _ = subscriber.try_init();
}

/// Path of the JSON log file inside `log_dir`.
pub fn log_file_path(log_dir: &Path) -> std::path::PathBuf {
    log_dir.join(LOG_FILE)
}
