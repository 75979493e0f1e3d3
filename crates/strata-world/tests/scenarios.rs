//! End-to-end terrain scenarios: ingestion, queries, LOD convergence and
//! geometry streaming through a recording scene.

use std::time::Duration;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strata_heightfield::{FlatSource, SinusoidSource};
use strata_lod::{ChunkBounds, ChunkKey, ChunkLayout, LeafChunk};
use strata_world::{RecordingScene, SceneSink, TerrainOptions, TerrainWorld};

fn flat(size: usize, spacing: f32) -> FlatSource {
    FlatSource {
        heightmap_size: size,
        cell_spacing: spacing,
        height: 0.0,
    }
}

/// Run updates until the scene shows exactly what the tree wants.
/// Returns the number of frames it took.
fn settle<S: SceneSink>(world: &mut TerrainWorld<S>, observer: Vec3, max_frames: usize) -> usize {
    for frame in 1..=max_frames {
        world.update(observer);
        if world.is_settled() {
            return frame;
        }
        if world.options().worker_count() > 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
    }
    panic!("terrain did not settle within {max_frames} frames");
}

fn covered_cells(world: &TerrainWorld<RecordingScene>) -> u64 {
    let layout = world.layout();
    world
        .scene()
        .chunk_keys()
        .map(|key| (layout.chunk_cells(key.depth) as u64).pow(2))
        .sum()
}

fn root_area(layout: &ChunkLayout) -> u64 {
    (layout.root_cells() as u64).pow(2)
}

/// Whether two leaf regions share a border segment of positive length.
fn touches(layout: &ChunkLayout, a: ChunkKey, b: ChunkKey) -> bool {
    let span = |key: ChunkKey| {
        let (x, z) = layout.origin_cells(key);
        let size = layout.chunk_cells(key.depth);
        (x, x + size, z, z + size)
    };
    let (ax0, ax1, az0, az1) = span(a);
    let (bx0, bx1, bz0, bz1) = span(b);
    let x_overlap = ax0.max(bx0) < ax1.min(bx1);
    let z_overlap = az0.max(bz0) < az1.min(bz1);
    ((ax1 == bx0 || bx1 == ax0) && z_overlap) || ((az1 == bz0 || bz1 == az0) && x_overlap)
}

fn leaf_under(world: &TerrainWorld<RecordingScene>, x: f32, z: f32) -> LeafChunk {
    let layout = world.layout();
    let finest = layout.key_at(layout.max_depth(), x, z);
    *world
        .leaves()
        .iter()
        .find(|leaf| leaf.key.contains(finest))
        .expect("leaves tile the terrain")
}

#[test]
fn test_flat_terrain_queries() {
    let mut world =
        TerrainWorld::new(RecordingScene::new(), &flat(512, 10.0), TerrainOptions::default())
            .unwrap();
    assert_eq!(world.world_size(), 5120.0);
    assert_eq!(world.height_at(Vec3::new(2560.0, 0.0, 2560.0)), 0.0);

    for p in [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1234.5, 99.0, 4321.0),
        Vec3::new(5119.0, 0.0, 5119.0),
        Vec3::new(-500.0, 0.0, 9000.0),
    ] {
        assert_eq!(world.normal_at(p), Vec3::Y, "normal at {p}");
        assert_eq!(world.height_at(p), 0.0, "height at {p}");
    }

    settle(&mut world, Vec3::new(2560.0, 100.0, 2560.0), 100);
    assert!(world.scene().find_overlap().is_none());
    assert_eq!(covered_cells(&world), root_area(world.layout()));
}

#[test]
fn test_sinusoid_grid_aligned_heights() {
    let world = TerrainWorld::new(
        RecordingScene::new(),
        &SinusoidSource::default(),
        TerrainOptions::default(),
    )
    .unwrap();
    for (row, col) in [(0, 0), (10, 20), (100, 37), (255, 256), (400, 511), (511, 511)] {
        let p = Vec3::new(col as f32 * 10.0, 0.0, row as f32 * 10.0);
        let expected = SinusoidSource::height(row, col);
        let actual = world.height_at(p);
        assert!(
            (actual - expected).abs() < 1e-3,
            "({row}, {col}): expected {expected}, got {actual}"
        );
    }
}

#[test]
fn test_heights_match_bilinear_interpolation() {
    let world = TerrainWorld::new(
        RecordingScene::new(),
        &SinusoidSource::default(),
        TerrainOptions::default(),
    )
    .unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..500 {
        let x: f32 = rng.random_range(0.0..5100.0);
        let z: f32 = rng.random_range(0.0..5100.0);
        let (gx, gz) = (x / 10.0, z / 10.0);
        let (col, row) = (gx.floor() as usize, gz.floor() as usize);
        let (u, v) = (gx - col as f32, gz - row as f32);
        let h00 = SinusoidSource::height(row, col);
        let h10 = SinusoidSource::height(row, col + 1);
        let h01 = SinusoidSource::height(row + 1, col);
        let h11 = SinusoidSource::height(row + 1, col + 1);
        let expected =
            h00 * (1.0 - u) * (1.0 - v) + h10 * u * (1.0 - v) + h01 * (1.0 - u) * v + h11 * u * v;
        let actual = world.height_at(Vec3::new(x, 0.0, z));
        assert!(
            (actual - expected).abs() < 1e-2,
            "({x}, {z}): expected {expected}, got {actual}"
        );
    }
}

#[test]
fn test_out_of_domain_queries_clamp() {
    let world = TerrainWorld::new(
        RecordingScene::new(),
        &SinusoidSource::default(),
        TerrainOptions::default(),
    )
    .unwrap();
    let size = world.world_size();
    for (outside, inside) in [
        (Vec3::new(-100.0, 0.0, 300.0), Vec3::new(0.0, 0.0, 300.0)),
        (Vec3::new(size + 50.0, 0.0, 1000.0), Vec3::new(size, 0.0, 1000.0)),
        (Vec3::new(700.0, 0.0, -1.0e6), Vec3::new(700.0, 0.0, 0.0)),
        (Vec3::new(1.0e9, 0.0, 1.0e9), Vec3::new(size, 0.0, size)),
    ] {
        assert_eq!(world.height_at(outside), world.height_at(inside));
        assert_eq!(world.normal_at(outside), world.normal_at(inside));
        let once = world.surface_point(outside);
        assert_eq!(world.surface_point(once), once, "clamping must be idempotent");
    }
}

#[test]
fn test_objects_reach_distance_lod() {
    let mut world = TerrainWorld::new(
        RecordingScene::new(),
        &SinusoidSource::default(),
        TerrainOptions::default(),
    )
    .unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let size = world.world_size();
    let objects: Vec<Vec3> = (0..25)
        .map(|_| {
            let x = rng.random_range(0.0..size);
            let z = rng.random_range(0.0..size);
            world.surface_point(Vec3::new(x, 0.0, z))
        })
        .collect();
    for object in &objects {
        assert!((object.y - world.height_at(*object)).abs() < 1e-3);
        assert!((world.normal_at(*object).length() - 1.0).abs() < 1e-4);
    }

    let observer = Vec3::ZERO;
    world.update(observer);
    settle(&mut world, observer, 100);

    for object in &objects {
        let leaf = leaf_under(&world, object.x, object.z);
        assert_eq!(world.attached_lod_at(*object), Some(leaf.lod));
        assert_eq!(world.desired_lod_at(*object), leaf.lod);

        // Never coarser than the policy asks for at this distance.
        let bounds = ChunkBounds::of(world.grid(), world.layout(), leaf.key);
        let distance = bounds.distance_to(observer);
        if leaf.lod > 0 {
            assert!(
                world.policy().select_from(distance, leaf.lod) >= leaf.lod,
                "leaf {} at distance {distance} is too coarse",
                leaf.key
            );
        }
    }
    assert_eq!(world.desired_lod_at(observer), 0);
}

#[test]
fn test_adjacent_leaves_within_one_level() {
    let options = TerrainOptions {
        chunk_resolution: 16,
        ..Default::default()
    };
    let mut world =
        TerrainWorld::new(RecordingScene::new(), &SinusoidSource::default(), options).unwrap();
    settle(&mut world, Vec3::new(700.0, 300.0, 1900.0), 200);

    let layout = *world.layout();
    let leaves = world.leaves();
    for (i, a) in leaves.iter().enumerate() {
        for b in &leaves[i + 1..] {
            if touches(&layout, a.key, b.key) {
                assert!(
                    a.key.depth.abs_diff(b.key.depth) <= 1,
                    "{} and {} differ by more than one level",
                    a.key,
                    b.key
                );
            }
        }
    }

    // Attached geometry matches the tree exactly.
    let scene = world.scene();
    for leaf in leaves {
        let (mesh, _) = scene.chunk(leaf.key).expect("every leaf is attached");
        assert_eq!(mesh.lod, leaf.lod);
    }
    assert_eq!(scene.batch_count(), leaves.len());
}

#[test]
fn test_build_budget_respected_and_deferred_builds_complete() {
    let budget = 3;
    let options = TerrainOptions {
        build_budget: budget,
        ..Default::default()
    };
    let mut world =
        TerrainWorld::new(RecordingScene::new(), &SinusoidSource::default(), options).unwrap();
    let observer = Vec3::new(2560.0, 800.0, 2560.0);

    let first = *world.update(observer);
    assert!(first.builds_started <= budget);
    assert!(first.deferred > 0, "more leaves than one frame's budget");
    let leaves = first.leaves;

    let mut frames = 1;
    while !world.is_settled() {
        let stats = *world.update(observer);
        assert!(stats.builds_started <= budget, "frame {frames} exceeded the budget");
        frames += 1;
        assert!(
            frames <= leaves.div_ceil(budget) + 2,
            "deferred builds not satisfied after {frames} frames"
        );
    }
    assert_eq!(world.stats().attached, leaves);
}

#[test]
fn test_no_popping_inside_hysteresis_band() {
    // 64 cells, 32-quad chunks: one root (LOD 1) or four children (LOD 0).
    // One threshold at 100 with a 10% band: [90, 110].
    let options = TerrainOptions {
        chunk_resolution: 32,
        max_chunk_cells: 64,
        thresholds: Some(vec![100.0]),
        hysteresis: 0.1,
        ..Default::default()
    };
    let mut world = TerrainWorld::new(RecordingScene::new(), &flat(65, 1.0), options).unwrap();
    let above = |h: f32| Vec3::new(32.0, h, 32.0);
    let centre = above(0.0);

    settle(&mut world, above(150.0), 10);
    assert_eq!(world.attached_lod_at(centre), Some(1));

    settle(&mut world, above(95.0), 10);
    assert_eq!(world.attached_lod_at(centre), Some(1), "inside the band: keep LOD 1");

    settle(&mut world, above(80.0), 10);
    assert_eq!(world.attached_lod_at(centre), Some(0));

    for _ in 0..5 {
        for h in [95.0, 105.0] {
            let stats = *world.update(above(h));
            assert!(!stats.tree.changed(), "tree changed at height {h}");
            assert_eq!(world.attached_lod_at(centre), Some(0));
        }
    }

    settle(&mut world, above(120.0), 10);
    assert_eq!(world.attached_lod_at(centre), Some(1));

    for _ in 0..5 {
        for h in [105.0, 95.0] {
            let stats = *world.update(above(h));
            assert!(!stats.tree.changed(), "tree changed at height {h}");
            assert_eq!(world.attached_lod_at(centre), Some(1));
        }
    }
}

#[test]
fn test_moving_observer_never_opens_holes() {
    let options = TerrainOptions {
        chunk_resolution: 16,
        max_chunk_cells: 64,
        build_budget: 4,
        ..Default::default()
    };
    let mut world = TerrainWorld::new(RecordingScene::new(), &flat(257, 1.0), options).unwrap();
    let root = root_area(world.layout());

    let mut covered_once = false;
    for frame in 0..120 {
        let t = frame as f32 / 119.0;
        let observer = Vec3::new(t * 256.0, 4.0, 64.0 + t * 128.0);
        world.update(observer);

        assert!(
            world.scene().find_overlap().is_none(),
            "overlapping chunks at frame {frame}"
        );
        let covered = covered_cells(&world);
        if covered_once {
            assert_eq!(covered, root, "hole in the terrain at frame {frame}");
        } else {
            covered_once = covered == root;
        }
    }
    assert!(covered_once);

    settle(&mut world, Vec3::new(256.0, 4.0, 192.0), 200);
    assert_eq!(covered_cells(&world), root);
}

#[test]
fn test_worker_pipeline_converges() {
    let options = TerrainOptions {
        chunk_resolution: 16,
        worker_threads: Some(2),
        result_capacity: 8,
        ..Default::default()
    };
    let mut world =
        TerrainWorld::new(RecordingScene::new(), &SinusoidSource::default(), options).unwrap();

    settle(&mut world, Vec3::new(300.0, 500.0, 300.0), 5000);
    let first_leaves = world.stats().leaves;
    assert_eq!(world.scene().batch_count(), first_leaves);

    for step in 0..20 {
        let observer = Vec3::new(300.0 + step as f32 * 200.0, 500.0, 300.0 + step as f32 * 150.0);
        world.update(observer);
        assert!(world.scene().find_overlap().is_none());
    }
    settle(&mut world, Vec3::new(4300.0, 500.0, 3300.0), 5000);
    assert!(world.scene().find_overlap().is_none());
    assert_eq!(covered_cells(&world), root_area(world.layout()));
    assert_eq!(world.stats().in_flight, 0);
}

#[test]
fn test_builds_outdated_by_a_jump_are_discarded() {
    let options = TerrainOptions {
        worker_threads: Some(2),
        build_budget: 16,
        ..Default::default()
    };
    let mut world =
        TerrainWorld::new(RecordingScene::new(), &SinusoidSource::default(), options).unwrap();

    world.update(Vec3::new(100.0, 50.0, 100.0));
    assert!(world.stats().builds_started > 0);
    // Let the fine chunks around the start finish before jumping away.
    std::thread::sleep(Duration::from_millis(200));

    let far = Vec3::new(5000.0, 50.0, 5000.0);
    let stats = *world.update(far);
    assert!(
        stats.stale_discards > 0,
        "builds for the old neighbourhood should be dropped"
    );

    settle(&mut world, far, 5000);
    let scene = world.scene();
    for leaf in world.leaves() {
        let (mesh, _) = scene.chunk(leaf.key).expect("every leaf is attached");
        assert_eq!(mesh.lod, leaf.lod, "{} attached at the wrong level", leaf.key);
    }
    assert_eq!(scene.batch_count(), world.leaves().len());
    assert!(scene.find_overlap().is_none());
    assert_eq!(covered_cells(&world), root_area(world.layout()));
}

#[test]
fn test_drop_releases_scene() {
    let mut scene = RecordingScene::new();
    {
        let options = TerrainOptions {
            worker_threads: Some(2),
            ..Default::default()
        };
        let mut world =
            TerrainWorld::new(&mut scene, &SinusoidSource::default(), options).unwrap();
        // Leave builds in flight on purpose.
        world.update(Vec3::new(1000.0, 300.0, 1000.0));
        world.update(Vec3::new(1000.0, 300.0, 1000.0));
    }
    assert!(scene.was_unregistered());
    assert_eq!(scene.batch_count(), 0);
    assert_eq!(scene.attach_count(), scene.detach_count());
}
