//! Mapping between world axes and terrain space.
//!
//! Terrain space is always `(x, height, z)`: the heightmap spans x/z and
//! elevation runs along y. An [`Alignment`] chooses which world plane the
//! terrain is laid out in.

use glam::Vec3;

/// World plane the terrain lies in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Terrain spans world X/Z, heights along +Y.
    #[default]
    XZ,
    /// Terrain spans world X/Y, heights along +Z.
    XY,
    /// Terrain spans world Y/Z, heights along +X.
    YZ,
}

impl Alignment {
    /// Convert a world position or direction into terrain space.
    #[inline]
    pub fn to_terrain(self, world: Vec3) -> Vec3 {
        match self {
            Alignment::XZ => world,
            Alignment::XY => Vec3::new(world.x, world.z, world.y),
            Alignment::YZ => Vec3::new(world.y, world.x, world.z),
        }
    }

    /// Convert a terrain-space position or direction into world space.
    #[inline]
    pub fn to_world(self, terrain: Vec3) -> Vec3 {
        // Each mapping is a single axis swap, so it is its own inverse.
        self.to_terrain(terrain)
    }

    /// Whether mapping to world space mirrors geometry, which reverses
    /// triangle winding.
    #[inline]
    pub fn flips_winding(self) -> bool {
        !matches!(self, Alignment::XZ)
    }

    /// World-space up vector.
    #[inline]
    pub fn up(self) -> Vec3 {
        self.to_world(Vec3::Y)
    }
}
