//! Quadtree chunk addressing.

use std::fmt;

/// Address of one quadtree node: depth (0 = root, coarsest) and the node's
/// position in the `2^depth x 2^depth` grid of nodes at that depth.
///
/// `x` runs along terrain x, `z` along terrain z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    /// Subdivision depth.
    pub depth: u8,
    /// Column in the node grid at this depth.
    pub x: u32,
    /// Row in the node grid at this depth.
    pub z: u32,
}

impl ChunkKey {
    /// The root node.
    pub const ROOT: Self = Self { depth: 0, x: 0, z: 0 };

    /// Create a key.
    pub const fn new(depth: u8, x: u32, z: u32) -> Self {
        Self { depth, x, z }
    }

    /// Nodes per side at `depth`.
    #[inline]
    pub const fn grid_size(depth: u8) -> u32 {
        1 << depth
    }

    /// Child `index` in `0..4`, where bit 0 selects +x and bit 1 selects +z.
    #[inline]
    pub fn child(self, index: usize) -> Self {
        debug_assert!(index < 4);
        Self {
            depth: self.depth + 1,
            x: self.x * 2 + (index as u32 & 1),
            z: self.z * 2 + (index as u32 >> 1),
        }
    }

    /// All four children, ordered by [`child`](Self::child) index.
    pub fn children(self) -> [Self; 4] {
        [self.child(0), self.child(1), self.child(2), self.child(3)]
    }

    /// Index of this key among its parent's children.
    #[inline]
    pub fn child_index(self) -> usize {
        ((self.x & 1) + 2 * (self.z & 1)) as usize
    }

    /// Parent node, or `None` for the root.
    pub fn parent(self) -> Option<Self> {
        (self.depth > 0).then(|| Self {
            depth: self.depth - 1,
            x: self.x >> 1,
            z: self.z >> 1,
        })
    }

    /// The ancestor (or self) at `depth`. `None` if `depth` is deeper than self.
    pub fn ancestor_at(self, depth: u8) -> Option<Self> {
        let shift = self.depth.checked_sub(depth)?;
        Some(Self {
            depth,
            x: self.x >> shift,
            z: self.z >> shift,
        })
    }

    /// Whether `other`'s region lies inside this key's region (inclusive of
    /// `other == self`).
    pub fn contains(self, other: Self) -> bool {
        other.ancestor_at(self.depth) == Some(self)
    }

    /// Whether the two regions share any area.
    pub fn overlaps(self, other: Self) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Same-depth neighbour across `edge`, or `None` at the domain border.
    pub fn neighbor(self, edge: Edge) -> Option<Self> {
        let size = Self::grid_size(self.depth);
        let (dx, dz) = edge.offset();
        let nx = self.x.checked_add_signed(dx)?;
        let nz = self.z.checked_add_signed(dz)?;
        (nx < size && nz < size).then_some(Self {
            depth: self.depth,
            x: nx,
            z: nz,
        })
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}({}, {})", self.depth, self.x, self.z)
    }
}

/// One of the four chunk borders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Border at minimum x.
    NegX,
    /// Border at maximum x.
    PosX,
    /// Border at minimum z.
    NegZ,
    /// Border at maximum z.
    PosZ,
}

impl Edge {
    /// Every edge, in bit order of [`EdgeMask`].
    pub const ALL: [Edge; 4] = [Edge::NegX, Edge::PosX, Edge::NegZ, Edge::PosZ];

    fn offset(self) -> (i32, i32) {
        match self {
            Edge::NegX => (-1, 0),
            Edge::PosX => (1, 0),
            Edge::NegZ => (0, -1),
            Edge::PosZ => (0, 1),
        }
    }

    #[inline]
    fn bit(self) -> u8 {
        match self {
            Edge::NegX => 1,
            Edge::PosX => 2,
            Edge::NegZ => 4,
            Edge::PosZ => 8,
        }
    }
}

/// Set of chunk edges; used to mark edges that face a coarser neighbour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EdgeMask(u8);

impl EdgeMask {
    /// No edges.
    pub const NONE: Self = Self(0);

    /// Add `edge`.
    #[inline]
    pub fn insert(&mut self, edge: Edge) {
        self.0 |= edge.bit();
    }

    /// Whether `edge` is set.
    #[inline]
    pub fn contains(self, edge: Edge) -> bool {
        self.0 & edge.bit() != 0
    }

    /// Whether no edge is set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bits, one per edge in [`Edge::ALL`] order.
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl FromIterator<Edge> for EdgeMask {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        let mut mask = Self::NONE;
        for edge in iter {
            mask.insert(edge);
        }
        mask
    }
}
