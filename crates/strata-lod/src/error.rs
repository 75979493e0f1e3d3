/// Invalid LOD policy parameters.
#[derive(Debug, thiserror::Error)]
pub enum LodError {
    /// An explicit threshold table with no entries.
    #[error("LOD threshold table is empty")]
    EmptyThresholds,

    /// A threshold that is zero, negative or not finite.
    #[error("LOD threshold {index} must be positive and finite, got {value}")]
    NonPositiveThreshold {
        /// Position in the table.
        index: usize,
        /// The bad value.
        value: f32,
    },

    /// Thresholds must strictly increase with level.
    #[error("LOD threshold {index} does not exceed the previous threshold")]
    ThresholdsNotIncreasing {
        /// First offending position.
        index: usize,
    },

    /// The hysteresis margin must lie in `[0, 0.5)`.
    #[error("LOD hysteresis {0} must lie in [0, 0.5)")]
    InvalidHysteresis(f32),
}
