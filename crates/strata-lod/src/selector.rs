//! Distance-based LOD selection with configurable thresholds and hysteresis.

use glam::Vec3;

use crate::{ChunkBounds, LodError};

/// Default fraction of a threshold a distance must overshoot before the
/// level changes.
pub const DEFAULT_HYSTERESIS: f32 = 0.1;

/// Distance boundaries between LOD levels.
///
/// `thresholds[i]` is the maximum distance for LOD level `i`. Distances past
/// the last threshold select the coarsest level of the policy using the table.
#[derive(Clone, Debug, PartialEq)]
pub struct LodThresholds {
    thresholds: Vec<f32>,
}

impl LodThresholds {
    /// Thresholds derived from chunk size: level `i` ends at
    /// `leaf_world_size * 2^i * distance_factor`, for `levels` levels.
    pub fn derived(leaf_world_size: f32, distance_factor: f32, levels: u8) -> Self {
        let thresholds = (0..levels)
            .map(|i| leaf_world_size * (1u32 << i) as f32 * distance_factor)
            .collect();
        Self { thresholds }
    }

    /// An explicit table. Must be non-empty, positive and strictly increasing.
    pub fn custom(thresholds: Vec<f32>) -> Result<Self, LodError> {
        if thresholds.is_empty() {
            return Err(LodError::EmptyThresholds);
        }
        for (i, &t) in thresholds.iter().enumerate() {
            if !(t.is_finite() && t > 0.0) {
                return Err(LodError::NonPositiveThreshold { index: i, value: t });
            }
            if i > 0 && t <= thresholds[i - 1] {
                return Err(LodError::ThresholdsNotIncreasing { index: i });
            }
        }
        Ok(Self { thresholds })
    }

    /// Number of bounded levels in the table.
    pub fn levels(&self) -> u8 {
        self.thresholds.len() as u8
    }

    /// The threshold distances.
    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    /// Level for `distance` with every threshold multiplied by `scale`, or
    /// `None` past the end of the table.
    fn select_scaled(&self, distance: f32, scale: f32) -> Option<u8> {
        self.thresholds
            .iter()
            .position(|&threshold| distance < threshold * scale)
            .map(|i| i as u8)
    }
}

/// Maps observer distance to a desired LOD level.
///
/// A chunk already at level `L` only moves when the distance overshoots the
/// crossed threshold by more than `hysteresis * threshold`, in either
/// direction, so an observer hovering at a boundary never flips the level
/// back and forth.
#[derive(Clone, Debug)]
pub struct LodPolicy {
    thresholds: LodThresholds,
    hysteresis: f32,
    max_lod: u8,
}

impl LodPolicy {
    /// `max_lod` caps results at the coarsest level the tree can represent.
    pub fn new(thresholds: LodThresholds, hysteresis: f32, max_lod: u8) -> Result<Self, LodError> {
        if !(0.0..0.5).contains(&hysteresis) {
            return Err(LodError::InvalidHysteresis(hysteresis));
        }
        Ok(Self {
            thresholds,
            hysteresis,
            max_lod,
        })
    }

    /// Access the underlying thresholds.
    pub fn thresholds(&self) -> &LodThresholds {
        &self.thresholds
    }

    /// Hysteresis margin as a fraction of each threshold.
    pub fn hysteresis(&self) -> f32 {
        self.hysteresis
    }

    /// Level for `distance` ignoring hysteresis. Returns 0 for the closest
    /// chunks (full detail) and higher values with distance.
    pub fn select(&self, distance: f32) -> u8 {
        debug_assert!(distance >= 0.0, "distance must be non-negative");
        self.scaled(distance, 1.0)
    }

    fn scaled(&self, distance: f32, scale: f32) -> u8 {
        self.thresholds
            .select_scaled(distance, scale)
            .map_or(self.max_lod, |level| level.min(self.max_lod))
    }

    /// Level for a chunk currently at `current`, with hysteresis applied.
    pub fn select_from(&self, distance: f32, current: u8) -> u8 {
        let coarser = self.scaled(distance, 1.0 + self.hysteresis);
        if coarser > current {
            return coarser;
        }
        let finer = self.scaled(distance, 1.0 - self.hysteresis);
        if finer < current {
            return finer;
        }
        current
    }

    /// Desired level of a chunk given the observer position (terrain space),
    /// using the distance to the nearest point of the chunk's bounds.
    pub fn desired_level(&self, observer: Vec3, bounds: &ChunkBounds, current: Option<u8>) -> u8 {
        let distance = bounds.distance_to(observer);
        match current {
            Some(level) => self.select_from(distance, level),
            None => self.select(distance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(thresholds: &[f32], hysteresis: f32) -> LodPolicy {
        let t = LodThresholds::custom(thresholds.to_vec()).unwrap();
        let max = t.levels();
        LodPolicy::new(t, hysteresis, max).unwrap()
    }

    /// A chunk at distance 0 (observer inside it) should return LOD 0.
    #[test]
    fn test_zero_distance_returns_lod_0() {
        assert_eq!(policy(&[100.0, 200.0], 0.1).select(0.0), 0);
    }

    /// Past every threshold the level is the maximum.
    #[test]
    fn test_far_distance_returns_max_lod() {
        let p = policy(&[100.0, 200.0, 400.0], 0.1);
        assert_eq!(p.select(100_000.0), 3);
        assert_eq!(p.select(f32::MAX), 3);
    }

    /// LOD levels at exact threshold boundaries.
    #[test]
    fn test_threshold_boundary_behavior() {
        let p = policy(&[256.0, 512.0], 0.1);
        assert_eq!(p.select(255.9), 0);
        assert_eq!(p.select(256.0), 1);
        assert_eq!(p.select(511.9), 1);
        assert_eq!(p.select(512.0), 2);
    }

    /// LOD level should be monotonically non-decreasing with distance.
    #[test]
    fn test_monotonically_increasing_with_distance() {
        let p = policy(&[256.0, 512.0, 1024.0, 2048.0], 0.1);
        let mut prev = 0;
        for d in [0.0, 50.0, 256.0, 400.0, 512.0, 800.0, 1024.0, 2000.0, 5000.0] {
            let lod = p.select(d);
            assert!(lod >= prev, "LOD must not decrease with distance: d={d}, lod={lod}, prev={prev}");
            prev = lod;
        }
    }

    /// Derived thresholds double per level.
    #[test]
    fn test_derived_thresholds() {
        let t = LodThresholds::derived(320.0, 2.0, 4);
        assert_eq!(t.thresholds(), &[640.0, 1280.0, 2560.0, 5120.0]);
        assert_eq!(t.levels(), 4);
    }

    #[test]
    fn test_custom_thresholds_rejected_when_invalid() {
        assert!(matches!(
            LodThresholds::custom(vec![100.0, 50.0]),
            Err(LodError::ThresholdsNotIncreasing { index: 1 })
        ));
        assert!(matches!(
            LodThresholds::custom(vec![0.0, 50.0]),
            Err(LodError::NonPositiveThreshold { index: 0, .. })
        ));
        assert!(matches!(
            LodThresholds::custom(Vec::new()),
            Err(LodError::EmptyThresholds)
        ));
    }

    #[test]
    fn test_invalid_hysteresis_rejected() {
        let t = LodThresholds::derived(10.0, 2.0, 2);
        assert!(matches!(
            LodPolicy::new(t.clone(), 0.5, 2),
            Err(LodError::InvalidHysteresis(_))
        ));
        assert!(LodPolicy::new(t, -0.1, 2).is_err());
    }

    /// Inside the margin band around a threshold the current level sticks,
    /// whichever side of the threshold the observer is on.
    #[test]
    fn test_hysteresis_holds_level_near_threshold() {
        let p = policy(&[100.0, 200.0], 0.1);
        // Band for the 0/1 boundary is [90, 110).
        for d in [90.0, 95.0, 100.0, 105.0, 109.9] {
            assert_eq!(p.select_from(d, 0), 0, "level 0 should hold at {d}");
            assert_eq!(p.select_from(d, 1), 1, "level 1 should hold at {d}");
        }
        assert_eq!(p.select_from(110.0, 0), 1);
        assert_eq!(p.select_from(89.9, 1), 0);
    }

    /// Oscillating around a boundary by less than the margin never changes
    /// the level.
    #[test]
    fn test_no_flip_flop_when_oscillating() {
        let p = policy(&[100.0, 200.0, 400.0], 0.1);
        let mut level = p.select(150.0);
        assert_eq!(level, 1);
        for i in 0..100 {
            let d = if i % 2 == 0 { 195.0 } else { 205.0 };
            let next = p.select_from(d, level);
            assert_eq!(next, level, "level changed at step {i} (d={d})");
            level = next;
        }
    }

    /// Large jumps move several levels at once.
    #[test]
    fn test_large_jump_skips_levels() {
        let p = policy(&[100.0, 200.0, 400.0], 0.1);
        assert_eq!(p.select_from(1000.0, 0), 3);
        assert_eq!(p.select_from(10.0, 3), 0);
    }

    #[test]
    fn test_max_lod_caps_selection() {
        let t = LodThresholds::custom(vec![10.0, 20.0, 40.0]).unwrap();
        let p = LodPolicy::new(t, 0.1, 1).unwrap();
        assert_eq!(p.select(1000.0), 1);
        assert_eq!(p.select_from(1000.0, 0), 1);
    }

    /// A table shorter than the tree still sends far chunks to the coarsest
    /// level the tree supports.
    #[test]
    fn test_short_table_reaches_policy_max_lod() {
        let t = LodThresholds::custom(vec![50.0]).unwrap();
        let p = LodPolicy::new(t, 0.1, 4).unwrap();
        assert_eq!(p.select(49.0), 0);
        assert_eq!(p.select(50.0), 4);
        assert_eq!(p.select(1.0e6), 4);
        // Hysteresis still applies around the single boundary.
        assert_eq!(p.select_from(52.0, 0), 0);
        assert_eq!(p.select_from(56.0, 0), 4);
        assert_eq!(p.select_from(48.0, 4), 4);
        assert_eq!(p.select_from(44.0, 4), 0);
    }

    #[test]
    fn test_desired_level_uses_box_distance() {
        let p = policy(&[100.0, 200.0], 0.0);
        let bounds = ChunkBounds {
            min: Vec3::new(0.0, 0.0, 0.0),
            max: Vec3::new(500.0, 10.0, 500.0),
        };
        // Inside the footprint, 150 above the top of the box.
        assert_eq!(p.desired_level(Vec3::new(250.0, 160.0, 250.0), &bounds, None), 1);
        // 50 units off the x edge.
        assert_eq!(p.desired_level(Vec3::new(550.0, 5.0, 250.0), &bounds, Some(1)), 0);
    }
}
