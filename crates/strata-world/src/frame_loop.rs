//! Per-frame driver: freeze and wireframe toggles plus the periodic
//! FPS/batches/triangles report.

use glam::Vec3;
use strata_config::DebugConfig;

use crate::{DrawMode, SceneSink, TerrainStats, TerrainWorld};

/// One periodic report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    /// Frames per second over the report window.
    pub fps: f32,
    /// Draw batches (attached chunks).
    pub batches: usize,
    /// Triangles across attached chunks.
    pub triangles: usize,
    /// Full terrain counters at report time.
    pub stats: TerrainStats,
}

/// Drives a [`TerrainWorld`] once per rendered frame.
///
/// While frozen the terrain keeps its current chunks no matter where the
/// observer goes, which makes LOD transitions easy to inspect from outside.
#[derive(Debug)]
pub struct FrameLoop {
    frozen: bool,
    report_interval: f32,
    report_timer: f32,
    window_frames: u32,
    window_time: f32,
    frames: u64,
}

impl FrameLoop {
    /// A loop reporting every `report_interval` seconds; 0 disables reports.
    pub fn new(report_interval: f32) -> Self {
        let report_interval = report_interval.max(0.0);
        Self {
            frozen: false,
            report_interval,
            report_timer: report_interval,
            window_frames: 0,
            window_time: 0.0,
            frames: 0,
        }
    }

    /// A loop using the `debug` config section.
    pub fn from_config(config: &DebugConfig) -> Self {
        Self::new(config.stats_interval)
    }

    /// Whether terrain updates are suspended.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Suspend or resume terrain updates. Returns the new state.
    pub fn toggle_freeze(&mut self) -> bool {
        self.frozen = !self.frozen;
        tracing::info!(frozen = self.frozen, "Terrain freeze toggled");
        self.frozen
    }

    /// Flip the world's draw mode between solid and wireframe.
    pub fn toggle_wireframe<S: SceneSink>(&mut self, world: &mut TerrainWorld<S>) -> DrawMode {
        let mode = world.draw_mode().toggled();
        world.set_draw_mode(mode);
        tracing::info!(?mode, "Draw mode toggled");
        mode
    }

    /// Frames ticked so far, frozen or not.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame: update the world unless frozen, then emit a report
    /// if the interval has elapsed.
    pub fn tick<S: SceneSink>(
        &mut self,
        world: &mut TerrainWorld<S>,
        observer: Vec3,
        dt: f32,
    ) -> Option<FrameReport> {
        if !self.frozen {
            world.update(observer);
        }
        self.frames += 1;

        if self.report_interval <= 0.0 {
            return None;
        }
        self.window_frames += 1;
        self.window_time += dt.max(0.0);
        self.report_timer -= dt;
        if self.report_timer > 0.0 {
            return None;
        }
        // Catch up without bursting reports after a long frame.
        while self.report_timer <= 0.0 {
            self.report_timer += self.report_interval;
        }

        let stats = *world.stats();
        let fps = if self.window_time > 0.0 {
            self.window_frames as f32 / self.window_time
        } else {
            0.0
        };
        self.window_frames = 0;
        self.window_time = 0.0;

        let report = FrameReport {
            fps,
            batches: stats.batches(),
            triangles: stats.triangles,
            stats,
        };
        tracing::info!(
            fps = report.fps,
            batches = report.batches,
            triangles = report.triangles,
            in_flight = stats.in_flight,
            stale = stats.stale_discards,
            "Frame stats"
        );
        Some(report)
    }
}
