//! Level-of-detail management: chunk addressing, distance-based LOD selection
//! with hysteresis, the balanced chunk quadtree, and build prioritisation.

mod bounds;
mod error;
mod key;
mod layout;
mod priority;
mod selector;
mod tree;

pub use bounds::ChunkBounds;
pub use error::LodError;
pub use key::{ChunkKey, Edge, EdgeMask};
pub use layout::ChunkLayout;
pub use priority::{BuildCandidate, ChunkPriorityFactors, compute_priority, sort_by_priority};
pub use selector::{DEFAULT_HYSTERESIS, LodPolicy, LodThresholds};
pub use tree::{ChunkTree, LeafChunk, NodeId, TreeUpdate};
