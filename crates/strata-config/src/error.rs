//! Configuration error types.

/// Errors raised while loading, saving, or validating `config.ron`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),

    /// The config file or its directory could not be written.
    #[error("failed to write config: {0}")]
    Write(#[source] std::io::Error),

    /// The file is not valid RON for [`Config`](crate::Config).
    #[error("failed to parse config: {0}")]
    Parse(#[source] ron::error::SpannedError),

    /// The in-memory config could not be turned into RON.
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] ron::Error),

    /// The platform has no per-user configuration directory.
    #[error("no configuration directory available on this platform")]
    NoConfigDir,

    /// A value parsed fine but is outside its allowed range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Dotted path of the offending field, e.g. `lod.hysteresis`.
        field: &'static str,
        /// Human-readable constraint that was violated.
        reason: String,
    },
}
