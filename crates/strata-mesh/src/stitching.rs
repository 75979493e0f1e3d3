//! LOD transition seam elimination: edge snapping and skirt geometry.
//!
//! Adjacent chunks differ by at most one LOD, so along a shared border the
//! finer chunk has one extra vertex between each pair of the coarser chunk's
//! vertices. Two complementary fixes hide the resulting T-junction cracks:
//!
//! 1. **Edge snapping**: odd border vertices facing a coarser neighbour are
//!    moved onto the straight segment between their even neighbours, which is
//!    exactly the coarser chunk's edge.
//! 2. **Skirts**: every border gets a strip hanging `skirt_depth` below the
//!    surface that covers any remaining hairline gap.
//!
//! Both work on terrain-space vertex arrays laid out as a `(res+1)^2` grid,
//! index `j * (res + 1) + i` with `i` along x and `j` along z.

use glam::Vec3;
use strata_heightfield::BlendSample;
use strata_lod::Edge;

/// Surface vertex index of grid point `(i, j)`.
#[inline]
pub fn grid_index(res: usize, i: usize, j: usize) -> usize {
    j * (res + 1) + i
}

/// Grid points along `edge`, ordered so the surface lies to the left when
/// walking them from above. Skirts built from consecutive points face out
/// of the chunk.
pub fn edge_points(res: usize, edge: Edge) -> Vec<(usize, usize)> {
    match edge {
        Edge::NegZ => (0..=res).map(|i| (i, 0)).collect(),
        Edge::PosX => (0..=res).map(|j| (res, j)).collect(),
        Edge::PosZ => (0..=res).rev().map(|i| (i, res)).collect(),
        Edge::NegX => (0..=res).rev().map(|j| (0, j)).collect(),
    }
}

/// Move odd vertices along `edge` onto the midpoint of their even neighbours.
pub fn snap_edge_to_coarser(points: &mut [Vec3], normals: &mut [Vec3], res: usize, edge: Edge) {
    let along = edge_points(res, edge);
    for k in (1..res).step_by(2) {
        let a = grid_index(res, along[k - 1].0, along[k - 1].1);
        let m = grid_index(res, along[k].0, along[k].1);
        let b = grid_index(res, along[k + 1].0, along[k + 1].1);
        points[m].y = (points[a].y + points[b].y) * 0.5;
        normals[m] = (normals[a] + normals[b])
            .try_normalize()
            .unwrap_or(Vec3::Y);
    }
}

/// Append a skirt below every border. Skirt vertices copy their border
/// vertex, lowered by `depth` along terrain up.
pub fn append_skirts(
    points: &mut Vec<Vec3>,
    normals: &mut Vec<Vec3>,
    blend: &mut Vec<BlendSample>,
    indices: &mut Vec<u16>,
    res: usize,
    depth: f32,
) {
    for edge in Edge::ALL {
        let along = edge_points(res, edge);
        let base = points.len();
        for &(i, j) in &along {
            let top = grid_index(res, i, j);
            points.push(points[top] - Vec3::Y * depth);
            normals.push(normals[top]);
            blend.push(blend[top]);
        }
        for k in 0..res {
            let e0 = grid_index(res, along[k].0, along[k].1) as u16;
            let e1 = grid_index(res, along[k + 1].0, along[k + 1].1) as u16;
            let s0 = (base + k) as u16;
            let s1 = (base + k + 1) as u16;
            indices.extend_from_slice(&[e0, e1, s0, e1, s1, s0]);
        }
    }
}
