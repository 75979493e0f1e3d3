use strata_heightfield::HeightfieldError;
use strata_lod::LodError;

/// Errors that prevent a terrain world from being constructed.
///
/// Nothing after construction returns an error: queries clamp and
/// per-frame problems are absorbed by [`crate::TerrainWorld::update`].
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    /// The heightfield source supplied malformed data.
    #[error("invalid heightfield: {0}")]
    Heightfield(#[from] HeightfieldError),

    /// The LOD threshold table or hysteresis is unusable.
    #[error("invalid LOD policy: {0}")]
    Lod(#[from] LodError),

    /// A terrain option is out of range.
    #[error("invalid terrain option `{field}`: {reason}")]
    InvalidOption {
        /// Offending option name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
