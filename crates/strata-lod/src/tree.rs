//! Arena quadtree that splits and merges chunk nodes around an observer.

use glam::Vec3;
use strata_heightfield::SampleGrid;

use crate::{ChunkBounds, ChunkKey, ChunkLayout, Edge, EdgeMask, LodPolicy};

/// Index of a node in the tree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct ChunkNode {
    key: ChunkKey,
    children: Option<[NodeId; 4]>,
}

/// A leaf of the tree after an update: one chunk the world should display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafChunk {
    /// Node address.
    pub key: ChunkKey,
    /// LOD level (0 = finest).
    pub lod: u8,
    /// Edges that border a coarser leaf and need stitching.
    pub coarser_edges: EdgeMask,
}

/// Counts of structural changes made by one [`ChunkTree::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeUpdate {
    /// Leaves split because the policy asked for more detail (or the node
    /// exceeded the maximum chunk size).
    pub splits: usize,
    /// Branches collapsed back into leaves.
    pub merges: usize,
    /// Leaves split to keep neighbours within one level.
    pub balance_splits: usize,
}

impl TreeUpdate {
    /// Whether the leaf set changed.
    pub fn changed(&self) -> bool {
        self.splits + self.merges + self.balance_splits > 0
    }
}

/// Quadtree over the terrain's root square.
///
/// Nodes live in a `Vec` arena with a free list; children are referenced by
/// index so ownership stays strictly tree-shaped. After every update the
/// leaves tile the root exactly and edge-adjacent leaves differ by at most
/// one depth.
#[derive(Debug)]
pub struct ChunkTree {
    layout: ChunkLayout,
    nodes: Vec<ChunkNode>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl ChunkTree {
    /// A tree holding only the root leaf.
    pub fn new(layout: ChunkLayout) -> Self {
        Self {
            layout,
            nodes: vec![ChunkNode {
                key: ChunkKey::ROOT,
                children: None,
            }],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Tree geometry.
    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    /// Live node count (leaves and branches).
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Re-evaluate every node against the observer (terrain space), then
    /// restore the balance constraint.
    pub fn update(&mut self, grid: &SampleGrid, policy: &LodPolicy, observer: Vec3) -> TreeUpdate {
        let mut stats = TreeUpdate::default();
        self.refine(self.root, grid, policy, observer, &mut stats);
        stats.balance_splits = self.balance();
        if stats.changed() {
            tracing::debug!(
                splits = stats.splits,
                merges = stats.merges,
                balance_splits = stats.balance_splits,
                nodes = self.node_count(),
                "Chunk tree changed"
            );
        }
        stats
    }

    fn refine(
        &mut self,
        id: NodeId,
        grid: &SampleGrid,
        policy: &LodPolicy,
        observer: Vec3,
        stats: &mut TreeUpdate,
    ) {
        let key = self.nodes[id.index()].key;
        let lod = self.layout.lod_of(key.depth);
        let forced = key.depth < self.layout.min_depth();
        let bounds = ChunkBounds::of(grid, &self.layout, key);

        match self.nodes[id.index()].children {
            None => {
                if lod == 0 {
                    return;
                }
                let desired = policy.desired_level(observer, &bounds, Some(lod));
                if forced || desired < lod {
                    let children = self.split(id);
                    stats.splits += 1;
                    for child in children {
                        self.refine(child, grid, policy, observer, stats);
                    }
                }
            }
            Some(children) => {
                // The children currently display this region at `lod - 1`.
                let desired = policy.desired_level(observer, &bounds, Some(lod - 1));
                if !forced && desired >= lod {
                    self.merge(id);
                    stats.merges += 1;
                } else {
                    for child in children {
                        self.refine(child, grid, policy, observer, stats);
                    }
                }
            }
        }
    }

    /// Split leaves that border a leaf more than one level finer, until no
    /// such pair remains. Terminates because it only ever splits and depth
    /// is bounded. Returns the number of splits.
    fn balance(&mut self) -> usize {
        let mut total = 0;
        loop {
            let mut changed = 0;
            for id in self.leaf_ids() {
                let key = self.nodes[id.index()].key;
                for edge in Edge::ALL {
                    let Some(neighbor) = key.neighbor(edge) else {
                        continue;
                    };
                    let nid = self.deepest_containing(neighbor);
                    let node = &self.nodes[nid.index()];
                    if node.children.is_none() && node.key.depth + 1 < key.depth {
                        self.split(nid);
                        changed += 1;
                    }
                }
            }
            if changed == 0 {
                return total;
            }
            total += changed;
        }
    }

    fn alloc(&mut self, node: ChunkNode) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            id
        } else {
            self.nodes.push(node);
            NodeId((self.nodes.len() - 1) as u32)
        }
    }

    fn split(&mut self, id: NodeId) -> [NodeId; 4] {
        debug_assert!(self.nodes[id.index()].children.is_none());
        let keys = self.nodes[id.index()].key.children();
        let children = keys.map(|key| self.alloc(ChunkNode {
            key,
            children: None,
        }));
        self.nodes[id.index()].children = Some(children);
        children
    }

    fn merge(&mut self, id: NodeId) {
        if let Some(children) = self.nodes[id.index()].children.take() {
            for child in children {
                self.merge(child);
                self.free.push(child);
            }
        }
    }

    /// The deepest existing node containing `target`, stopping at `target`'s
    /// depth. Returns a leaf unless `target` itself is a branch.
    fn deepest_containing(&self, target: ChunkKey) -> NodeId {
        let mut id = self.root;
        loop {
            let node = &self.nodes[id.index()];
            let Some(children) = node.children else {
                return id;
            };
            if node.key.depth >= target.depth {
                return id;
            }
            let Some(next) = target.ancestor_at(node.key.depth + 1) else {
                return id;
            };
            id = children[next.child_index()];
        }
    }

    fn leaf_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match self.nodes[id.index()].children {
                Some(children) => stack.extend(children.iter().rev()),
                None => out.push(id),
            }
        }
        out
    }

    /// Current leaves with their LOD and the edges facing coarser leaves.
    pub fn leaves(&self) -> Vec<LeafChunk> {
        self.leaf_ids()
            .into_iter()
            .map(|id| {
                let key = self.nodes[id.index()].key;
                let coarser_edges = Edge::ALL
                    .into_iter()
                    .filter(|&edge| {
                        key.neighbor(edge).is_some_and(|n| {
                            self.nodes[self.deepest_containing(n).index()].key.depth < key.depth
                        })
                    })
                    .collect();
                LeafChunk {
                    key,
                    lod: self.layout.lod_of(key.depth),
                    coarser_edges,
                }
            })
            .collect()
    }

    /// The leaf whose region contains world `(x, z)` (clamped onto the root).
    pub fn leaf_at(&self, x: f32, z: f32) -> ChunkKey {
        let target = self.layout.key_at(self.layout.max_depth(), x, z);
        self.nodes[self.deepest_containing(target).index()].key
    }
}
