//! Chunk build scheduling: a synchronous builder and a worker-thread
//! pipeline behind one trait, so the terrain drives either the same way.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use dashmap::DashMap;
use strata_heightfield::SampleGrid;
use strata_lod::ChunkKey;

use crate::generate::{BuildSignature, ChunkBuildRequest, MeshSettings, generate_chunk};
use crate::ChunkMesh;

/// A finished build, delivered on the update thread.
#[derive(Debug)]
pub struct BuildResult {
    /// Chunk the mesh was built for.
    pub key: ChunkKey,
    /// Geometry variant that was built.
    pub signature: BuildSignature,
    /// The generated mesh.
    pub mesh: ChunkMesh,
}

/// Something that turns build requests into meshes.
///
/// At most one build per key is outstanding: a key stays pending from
/// [`submit`](Self::submit) until its result is returned by
/// [`drain`](Self::drain), and submitting a pending key is refused.
pub trait ChunkBuilder {
    /// Queue a build. Returns `false` if the key is already pending or the
    /// builder cannot take more work right now.
    fn submit(&mut self, request: ChunkBuildRequest) -> bool;

    /// Collect every finished build. Never blocks.
    fn drain(&mut self) -> Vec<BuildResult>;

    /// Whether a build for `key` has been submitted but not yet drained.
    fn is_pending(&self, key: ChunkKey) -> bool;

    /// Number of builds submitted but not yet drained.
    fn in_flight(&self) -> usize;
}

/// Builds each request immediately on the calling thread.
pub struct InlineBuilder {
    grid: Arc<SampleGrid>,
    settings: MeshSettings,
    ready: Vec<BuildResult>,
}

impl InlineBuilder {
    /// Create a builder over a shared grid.
    pub fn new(grid: Arc<SampleGrid>, settings: MeshSettings) -> Self {
        Self {
            grid,
            settings,
            ready: Vec::new(),
        }
    }
}

impl ChunkBuilder for InlineBuilder {
    fn submit(&mut self, request: ChunkBuildRequest) -> bool {
        if self.is_pending(request.key) {
            return false;
        }
        let mesh = generate_chunk(&self.grid, &self.settings, &request);
        self.ready.push(BuildResult {
            key: request.key,
            signature: request.signature,
            mesh,
        });
        true
    }

    fn drain(&mut self) -> Vec<BuildResult> {
        std::mem::take(&mut self.ready)
    }

    fn is_pending(&self, key: ChunkKey) -> bool {
        self.ready.iter().any(|r| r.key == key)
    }

    fn in_flight(&self) -> usize {
        self.ready.len()
    }
}

/// Asynchronous build pipeline backed by a thread pool.
///
/// Requests go to workers over a bounded channel; each worker owns an `Arc`
/// of the grid, so no locks are taken while meshing. Results come back over
/// a second bounded channel drained once per frame. Dropping the pipeline
/// closes both channels and joins every worker.
pub struct BuildPipeline {
    /// Channel sender for submitting tasks to workers.
    task_sender: Option<Sender<ChunkBuildRequest>>,
    /// Channel receiver for collecting completed results on the update thread.
    result_receiver: Option<Receiver<BuildResult>>,
    /// Handles to the worker threads (for shutdown).
    worker_handles: Vec<JoinHandle<()>>,
    /// Keys submitted but not yet drained.
    pending: Arc<DashMap<ChunkKey, BuildSignature>>,
    /// Builds queued or executing on workers.
    in_flight: Arc<AtomicUsize>,
}

impl BuildPipeline {
    /// Spawn `worker_count` threads. `capacity` bounds both the queued tasks
    /// and the undrained results.
    pub fn new(
        grid: Arc<SampleGrid>,
        settings: MeshSettings,
        worker_count: usize,
        capacity: usize,
    ) -> Self {
        let capacity = capacity.max(1);
        let (task_tx, task_rx) = bounded::<ChunkBuildRequest>(capacity);
        let (result_tx, result_rx) = bounded::<BuildResult>(capacity);
        let in_flight = Arc::new(AtomicUsize::new(0));

        let worker_count = worker_count.max(1);
        let mut handles = Vec::with_capacity(worker_count);
        for i in 0..worker_count {
            let rx = task_rx.clone();
            let tx = result_tx.clone();
            let grid = Arc::clone(&grid);
            let flight = Arc::clone(&in_flight);

            let handle = std::thread::Builder::new()
                .name(format!("strata-mesh-{i}"))
                .spawn(move || {
                    while let Ok(request) = rx.recv() {
                        let mesh = generate_chunk(&grid, &settings, &request);
                        flight.fetch_sub(1, Ordering::Relaxed);
                        let result = BuildResult {
                            key: request.key,
                            signature: request.signature,
                            mesh,
                        };
                        if tx.send(result).is_err() {
                            break;
                        }
                    }
                })
                .expect("Failed to spawn chunk mesh worker thread");
            handles.push(handle);
        }

        tracing::info!(workers = worker_count, capacity, "Started chunk build pipeline");

        Self {
            task_sender: Some(task_tx),
            result_receiver: Some(result_rx),
            worker_handles: handles,
            pending: Arc::new(DashMap::new()),
            in_flight,
        }
    }

    /// Close the task channel and join all workers.
    pub fn shutdown(&mut self) {
        self.task_sender.take();
        // Dropping the receiver unblocks workers waiting on a full result channel.
        self.result_receiver.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
        self.pending.clear();
    }
}

/// Worker threads to use when the count is left unset: all cores but two,
/// leaving room for the update and render threads.
pub fn default_worker_count() -> usize {
    let cpus = num_cpus::get().max(2);
    (cpus - 2).max(1)
}

impl ChunkBuilder for BuildPipeline {
    fn submit(&mut self, request: ChunkBuildRequest) -> bool {
        let Some(sender) = &self.task_sender else {
            return false;
        };
        if self.pending.contains_key(&request.key) {
            return false;
        }
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        match sender.try_send(request) {
            Ok(()) => {
                self.pending.insert(request.key, request.signature);
                true
            }
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                self.in_flight.fetch_sub(1, Ordering::Relaxed);
                false
            }
        }
    }

    fn drain(&mut self) -> Vec<BuildResult> {
        let Some(receiver) = &self.result_receiver else {
            return Vec::new();
        };
        let mut results = Vec::new();
        while let Ok(result) = receiver.try_recv() {
            self.pending.remove(&result.key);
            results.push(result);
        }
        results
    }

    fn is_pending(&self, key: ChunkKey) -> bool {
        self.pending.contains_key(&key)
    }

    fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for BuildPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use strata_heightfield::{Alignment, FlatSource};
    use strata_lod::{ChunkLayout, EdgeMask};

    fn setup() -> (Arc<SampleGrid>, MeshSettings) {
        let grid = Arc::new(SampleGrid::from_source(&FlatSource::default(), 1.0).unwrap());
        let settings = MeshSettings {
            layout: ChunkLayout::new(grid.root_cells(), 16, 64, 1.0),
            alignment: Alignment::XZ,
            skirt_depth: 1.0,
            stitch_edges: true,
            max_layers: 4,
        };
        (grid, settings)
    }

    fn request(settings: &MeshSettings, key: ChunkKey) -> ChunkBuildRequest {
        ChunkBuildRequest {
            key,
            signature: BuildSignature {
                lod: settings.layout.lod_of(key.depth),
                coarser_edges: EdgeMask::NONE,
            },
        }
    }

    fn drain_until(builder: &mut impl ChunkBuilder, count: usize) -> Vec<BuildResult> {
        let start = Instant::now();
        let mut results = Vec::new();
        while results.len() < count {
            results.extend(builder.drain());
            assert!(start.elapsed() < Duration::from_secs(10), "timed out waiting for builds");
            std::thread::sleep(Duration::from_millis(1));
        }
        results
    }

    #[test]
    fn test_inline_builds_immediately() {
        let (grid, settings) = setup();
        let mut builder = InlineBuilder::new(grid, settings);
        let key = ChunkKey::new(1, 1, 0);
        assert!(builder.submit(request(&settings, key)));
        assert!(builder.is_pending(key));
        assert!(!builder.submit(request(&settings, key)), "duplicate submit must be refused");
        assert_eq!(builder.in_flight(), 1);

        let results = builder.drain();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].key, key);
        assert!(!results[0].mesh.is_empty());
        assert!(!builder.is_pending(key));
        assert_eq!(builder.in_flight(), 0);
    }

    #[test]
    fn test_pipeline_produces_results() {
        let (grid, settings) = setup();
        let mut pipeline = BuildPipeline::new(grid, settings, 2, 8);
        let keys = [ChunkKey::new(1, 0, 0), ChunkKey::new(1, 1, 0), ChunkKey::new(1, 0, 1)];
        for key in keys {
            assert!(pipeline.submit(request(&settings, key)));
        }
        assert_eq!(pipeline.in_flight(), 3);

        let results = drain_until(&mut pipeline, 3);
        let mut got: Vec<_> = results.iter().map(|r| r.key).collect();
        got.sort();
        let mut want = keys.to_vec();
        want.sort();
        assert_eq!(got, want);
        assert_eq!(pipeline.in_flight(), 0);
    }

    #[test]
    fn test_pipeline_refuses_pending_key() {
        let (grid, settings) = setup();
        let mut pipeline = BuildPipeline::new(grid, settings, 1, 8);
        let key = ChunkKey::new(2, 1, 1);
        assert!(pipeline.submit(request(&settings, key)));
        assert!(!pipeline.submit(request(&settings, key)));
        drain_until(&mut pipeline, 1);
        assert!(pipeline.submit(request(&settings, key)), "drained key can be rebuilt");
    }

    #[test]
    fn test_pipeline_matches_inline_output() {
        let (grid, settings) = setup();
        let key = ChunkKey::new(2, 3, 2);
        let mut inline = InlineBuilder::new(Arc::clone(&grid), settings);
        let mut pipeline = BuildPipeline::new(grid, settings, 2, 4);
        inline.submit(request(&settings, key));
        pipeline.submit(request(&settings, key));
        let a = inline.drain().remove(0);
        let b = drain_until(&mut pipeline, 1).remove(0);
        assert_eq!(a.mesh.vertices, b.mesh.vertices);
        assert_eq!(a.mesh.indices, b.mesh.indices);
    }

    #[test]
    fn test_shutdown_with_undrained_results() {
        let (grid, settings) = setup();
        let mut pipeline = BuildPipeline::new(grid, settings, 2, 1);
        let mut submitted = 0;
        for x in 0..4 {
            if pipeline.submit(request(&settings, ChunkKey::new(2, x, 0))) {
                submitted += 1;
            }
        }
        assert!(submitted >= 1);
        pipeline.shutdown();
        assert!(!pipeline.submit(request(&settings, ChunkKey::new(2, 0, 3))));
        assert!(pipeline.drain().is_empty());
    }
}
