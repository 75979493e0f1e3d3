//! The terrain world: owns the grid and chunk tree and keeps the scene's
//! chunk set in step with the observer.

use std::sync::Arc;

use glam::Vec3;
use rustc_hash::FxHashMap;
use strata_heightfield::{Alignment, HeightfieldError, HeightfieldSource, SampleGrid};
use strata_lod::{
    BuildCandidate, ChunkBounds, ChunkKey, ChunkLayout, ChunkPriorityFactors, ChunkTree, EdgeMask,
    LeafChunk, LodPolicy, LodThresholds, compute_priority, sort_by_priority,
};
use strata_mesh::{
    BuildPipeline, BuildResult, BuildSignature, ChunkBuildRequest, ChunkBuilder, InlineBuilder,
    MeshSettings,
};

use crate::scene::{DrawMode, SceneSink, TerrainDescriptor, TerrainMaterial};
use crate::{TerrainError, TerrainOptions, TerrainStats};

/// Geometry currently handed to the scene.
#[derive(Clone, Copy, Debug)]
struct AttachedChunk {
    signature: BuildSignature,
    triangles: usize,
}

/// Viewpoint-driven terrain.
///
/// Call [`update`](Self::update) once per frame with the observer position.
/// Chunks whose geometry must change are rebuilt (at most `build_budget`
/// starts per update) and swapped in as groups: old geometry covering an
/// area stays attached until every replacement chunk for that area is
/// built, then all of them are exchanged in one step. The scene therefore
/// never shows a hole or two overlapping chunks once the first full cover
/// has been attached.
///
/// Dropping the world detaches every chunk and unregisters from the scene.
pub struct TerrainWorld<S: SceneSink> {
    scene: S,
    grid: Arc<SampleGrid>,
    options: TerrainOptions,
    layout: ChunkLayout,
    policy: LodPolicy,
    tree: ChunkTree,
    builder: Box<dyn ChunkBuilder>,
    leaves: Vec<LeafChunk>,
    desired: FxHashMap<ChunkKey, BuildSignature>,
    attached: FxHashMap<ChunkKey, AttachedChunk>,
    ready: FxHashMap<ChunkKey, BuildResult>,
    draw_mode: DrawMode,
    stats: TerrainStats,
}

impl<S: SceneSink> TerrainWorld<S> {
    /// Ingest `source`, set up the chunk tree and register with `scene`.
    ///
    /// No geometry exists until the first [`update`](Self::update).
    pub fn new(
        mut scene: S,
        source: &dyn HeightfieldSource,
        options: TerrainOptions,
    ) -> Result<Self, TerrainError> {
        options.validate()?;

        let cell_spacing = match options.cell_spacing {
            Some(spacing) => spacing,
            None => {
                let side = source.heightmap_size();
                if side < 2 {
                    return Err(HeightfieldError::HeightmapTooSmall(side).into());
                }
                source.world_size() / side as f32
            }
        };
        let grid = Arc::new(SampleGrid::from_source(source, cell_spacing)?);

        let layout = ChunkLayout::new(
            grid.root_cells(),
            options.chunk_resolution,
            options.max_chunk_cells,
            cell_spacing,
        );
        let thresholds = match &options.thresholds {
            Some(table) => LodThresholds::custom(table.clone())?,
            None => LodThresholds::derived(
                layout.leaf_world_size(),
                options.distance_factor,
                layout.max_lod(),
            ),
        };
        let policy = LodPolicy::new(thresholds, options.hysteresis, layout.max_lod())?;

        let settings = MeshSettings {
            layout,
            alignment: options.alignment,
            skirt_depth: options.skirt_depth,
            stitch_edges: options.stitch_edges,
            max_layers: options.max_layers_per_chunk,
        };
        let workers = options.worker_count();
        let builder: Box<dyn ChunkBuilder> = if workers == 0 {
            Box::new(InlineBuilder::new(Arc::clone(&grid), settings))
        } else {
            Box::new(BuildPipeline::new(
                Arc::clone(&grid),
                settings,
                workers,
                options.result_capacity,
            ))
        };

        scene.register_terrain(&TerrainDescriptor {
            world_size: grid.world_size(),
            alignment: options.alignment,
            layers: grid.layers().to_vec(),
        });

        tracing::info!(
            heightmap = grid.heightmap_size(),
            blendmap = grid.blendmap_size(),
            layers = grid.layers().len(),
            world_size = grid.world_size(),
            max_depth = layout.max_depth(),
            min_depth = layout.min_depth(),
            chunk_resolution = layout.chunk_resolution(),
            workers,
            "Terrain world created"
        );

        Ok(Self {
            scene,
            tree: ChunkTree::new(layout),
            grid,
            options,
            layout,
            policy,
            builder,
            leaves: Vec::new(),
            desired: FxHashMap::default(),
            attached: FxHashMap::default(),
            ready: FxHashMap::default(),
            draw_mode: DrawMode::Solid,
            stats: TerrainStats::default(),
        })
    }

    /// Advance one frame with the observer at `observer` (world space).
    ///
    /// Re-evaluates the chunk tree, starts at most `build_budget` builds
    /// (nearest and uncovered areas first), collects finished builds, and
    /// swaps every complete group into the scene. Never fails.
    pub fn update(&mut self, observer: Vec3) -> &TerrainStats {
        let observer = self.options.alignment.to_terrain(observer);
        let tree = self.tree.update(&self.grid, &self.policy, observer);
        if tree.changed() || self.leaves.is_empty() {
            self.refresh_desired();
        }

        let mut stale = self.discard_stale_ready();
        let (started, deferred) = self.schedule_builds(observer);
        stale += self.collect_builds();
        let swaps = self.commit_swaps();

        let stats = &mut self.stats;
        stats.frame += 1;
        stats.tree = tree;
        stats.leaves = self.leaves.len();
        stats.attached = self.attached.len();
        stats.ready = self.ready.len();
        stats.in_flight = self.builder.in_flight();
        stats.builds_started = started;
        stats.deferred = deferred;
        stats.swaps = swaps;
        stats.stale_discards += stale;
        stats.triangles = self.attached.values().map(|c| c.triangles).sum();
        &self.stats
    }

    /// Recompute the wanted build signature of every leaf.
    fn refresh_desired(&mut self) {
        self.leaves = self.tree.leaves();
        let stitch = self.options.stitch_edges;
        self.desired = self
            .leaves
            .iter()
            .map(|leaf| {
                let coarser_edges = if stitch {
                    leaf.coarser_edges
                } else {
                    EdgeMask::NONE
                };
                let signature = BuildSignature {
                    lod: leaf.lod,
                    coarser_edges,
                };
                (leaf.key, signature)
            })
            .collect();
    }

    fn is_current(&self, key: ChunkKey, signature: BuildSignature) -> bool {
        self.attached
            .get(&key)
            .is_some_and(|chunk| chunk.signature == signature)
    }

    fn is_wanted(&self, key: ChunkKey, signature: BuildSignature) -> bool {
        self.desired.get(&key) == Some(&signature)
    }

    /// Drop built-but-unattached chunks the tree no longer wants.
    fn discard_stale_ready(&mut self) -> u64 {
        let desired = &self.desired;
        let before = self.ready.len();
        self.ready
            .retain(|key, result| desired.get(key) == Some(&result.signature));
        let discarded = (before - self.ready.len()) as u64;
        if discarded > 0 {
            tracing::debug!(discarded, "Discarded stale chunk builds awaiting swap");
        }
        discarded
    }

    /// Rank every leaf that needs geometry and submit the most important
    /// ones, up to the per-frame budget. Returns `(started, deferred)`.
    fn schedule_builds(&mut self, observer: Vec3) -> (usize, usize) {
        let mut candidates: Vec<BuildCandidate> = self
            .desired
            .iter()
            .filter(|&(&key, &signature)| {
                !self.is_current(key, signature)
                    && !self.ready.contains_key(&key)
                    && !self.builder.is_pending(key)
            })
            .map(|(&key, &signature)| {
                let bounds = ChunkBounds::of(&self.grid, &self.layout, key);
                let factors = ChunkPriorityFactors {
                    distance: bounds.distance_to(observer),
                    lod: signature.lod,
                    fills_gap: !self.attached.keys().any(|attached| attached.overlaps(key)),
                };
                BuildCandidate {
                    key,
                    priority: compute_priority(&factors),
                }
            })
            .collect();
        sort_by_priority(&mut candidates);

        let mut started = 0;
        for candidate in &candidates {
            if started == self.options.build_budget {
                break;
            }
            let Some(&signature) = self.desired.get(&candidate.key) else {
                continue;
            };
            let request = ChunkBuildRequest {
                key: candidate.key,
                signature,
            };
            if !self.builder.submit(request) {
                break;
            }
            started += 1;
        }

        let deferred = candidates.len() - started;
        if deferred > 0 {
            tracing::debug!(
                started,
                deferred,
                budget = self.options.build_budget,
                "Chunk builds deferred to later frames"
            );
        }
        (started, deferred)
    }

    /// Move finished builds into the ready set, discarding ones whose
    /// signature the tree no longer wants.
    fn collect_builds(&mut self) -> u64 {
        let mut stale = 0;
        for result in self.builder.drain() {
            if self.is_wanted(result.key, result.signature)
                && !self.is_current(result.key, result.signature)
            {
                self.ready.insert(result.key, result);
            } else {
                stale += 1;
                tracing::debug!(
                    key = %result.key,
                    lod = result.signature.lod,
                    "Discarded stale chunk build"
                );
            }
        }
        stale
    }

    /// Exchange attached geometry for ready geometry, one overlap group at a
    /// time. A group is a connected set of outdated attached chunks and
    /// wanted-but-unattached leaves whose regions overlap; it is swapped only
    /// when every leaf in it is ready. Returns the number of groups swapped.
    fn commit_swaps(&mut self) -> usize {
        let mut incoming: Vec<ChunkKey> = self
            .desired
            .iter()
            .filter(|&(&key, &signature)| !self.is_current(key, signature))
            .map(|(&key, _)| key)
            .collect();
        let mut outgoing: Vec<ChunkKey> = self
            .attached
            .iter()
            .filter(|&(&key, chunk)| !self.is_wanted(key, chunk.signature))
            .map(|(&key, _)| key)
            .collect();
        if incoming.is_empty() && outgoing.is_empty() {
            return 0;
        }
        incoming.sort_unstable();
        outgoing.sort_unstable();

        // Union-find over incoming (0..n) followed by outgoing (n..).
        let n = incoming.len();
        let mut parent: Vec<usize> = (0..n + outgoing.len()).collect();
        for (i, a) in incoming.iter().enumerate() {
            for (j, b) in outgoing.iter().enumerate() {
                if a.overlaps(*b) {
                    union(&mut parent, i, n + j);
                }
            }
        }

        let mut groups: FxHashMap<usize, (Vec<ChunkKey>, Vec<ChunkKey>)> = FxHashMap::default();
        for (i, &key) in incoming.iter().enumerate() {
            let root = find(&mut parent, i);
            groups.entry(root).or_default().0.push(key);
        }
        for (j, &key) in outgoing.iter().enumerate() {
            let root = find(&mut parent, n + j);
            groups.entry(root).or_default().1.push(key);
        }

        let mut roots: Vec<usize> = groups.keys().copied().collect();
        roots.sort_unstable();

        let mut swaps = 0;
        for root in roots {
            let Some((new_keys, old_keys)) = groups.remove(&root) else {
                continue;
            };
            if !new_keys.iter().all(|key| self.ready.contains_key(key)) {
                continue;
            }
            for key in old_keys {
                self.attached.remove(&key);
                self.scene.detach_chunk(key);
            }
            for key in new_keys {
                if let Some(result) = self.ready.remove(&key) {
                    self.attach(result);
                }
            }
            swaps += 1;
        }
        swaps
    }

    fn attach(&mut self, result: BuildResult) {
        let mesh = result.mesh;
        let layers = self.grid.layers();
        let material = TerrainMaterial {
            layer_indices: mesh.layers.clone(),
            layers: mesh
                .layers
                .iter()
                .filter_map(|&index| layers.get(index as usize).cloned())
                .collect(),
            shaders: self.options.shaders,
        };
        self.attached.insert(
            result.key,
            AttachedChunk {
                signature: result.signature,
                triangles: mesh.triangle_count(),
            },
        );
        self.scene.attach_chunk(mesh, material);
    }

    // --- Queries ---

    /// Terrain height under `position` (world space), along the terrain's
    /// up axis. Positions outside the terrain are clamped onto it.
    pub fn height_at(&self, position: Vec3) -> f32 {
        let p = self.options.alignment.to_terrain(position);
        self.grid.height_at(p.x, p.z)
    }

    /// Unit surface normal under `position` (world space).
    pub fn normal_at(&self, position: Vec3) -> Vec3 {
        let p = self.options.alignment.to_terrain(position);
        self.options.alignment.to_world(self.grid.normal_at(p.x, p.z))
    }

    /// The point on the surface under `position` (world space), with the
    /// planar coordinates clamped onto the terrain.
    pub fn surface_point(&self, position: Vec3) -> Vec3 {
        let p = self.options.alignment.to_terrain(position);
        let (x, z) = self.grid.clamp_to_domain(p.x, p.z);
        let on_surface = Vec3::new(x, self.grid.height_at(x, z), z);
        self.options.alignment.to_world(on_surface)
    }

    /// LOD the chunk tree currently wants under `position`.
    pub fn desired_lod_at(&self, position: Vec3) -> u8 {
        let p = self.options.alignment.to_terrain(position);
        self.layout.lod_of(self.tree.leaf_at(p.x, p.z).depth)
    }

    /// LOD of the geometry attached under `position`, if any.
    pub fn attached_lod_at(&self, position: Vec3) -> Option<u8> {
        let p = self.options.alignment.to_terrain(position);
        (0..=self.layout.max_depth()).find_map(|depth| {
            let key = self.layout.key_at(depth, p.x, p.z);
            self.attached.get(&key).map(|chunk| chunk.signature.lod)
        })
    }

    /// Whether the scene shows exactly what the tree wants, with nothing
    /// left to build.
    pub fn is_settled(&self) -> bool {
        self.attached.len() == self.desired.len()
            && self
                .desired
                .iter()
                .all(|(&key, &signature)| self.is_current(key, signature))
            && self.ready.is_empty()
            && self.builder.in_flight() == 0
    }

    /// Switch the scene's draw mode. Terrain data is unaffected.
    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        self.draw_mode = mode;
        self.scene.set_draw_mode(mode);
    }

    // --- Accessors ---

    /// Draw mode last requested through [`set_draw_mode`](Self::set_draw_mode).
    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    /// Counters from the latest update.
    pub fn stats(&self) -> &TerrainStats {
        &self.stats
    }

    /// Leaves of the chunk tree after the latest update.
    pub fn leaves(&self) -> &[LeafChunk] {
        &self.leaves
    }

    /// The ingested heightfield.
    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }

    /// Quadtree geometry.
    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    /// LOD selection policy.
    pub fn policy(&self) -> &LodPolicy {
        &self.policy
    }

    /// Options the world was built with.
    pub fn options(&self) -> &TerrainOptions {
        &self.options
    }

    /// World plane of the terrain.
    pub fn alignment(&self) -> Alignment {
        self.options.alignment
    }

    /// Side length of the terrain square.
    pub fn world_size(&self) -> f32 {
        self.grid.world_size()
    }

    /// The scene the terrain draws into.
    pub fn scene(&self) -> &S {
        &self.scene
    }
}

impl<S: SceneSink> Drop for TerrainWorld<S> {
    fn drop(&mut self) {
        let mut keys: Vec<ChunkKey> = self.attached.keys().copied().collect();
        keys.sort_unstable();
        for key in keys {
            self.scene.detach_chunk(key);
        }
        self.attached.clear();
        self.scene.unregister_terrain();
        tracing::info!(frames = self.stats.frame, "Terrain world dropped");
    }
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[rb] = ra;
    }
}
