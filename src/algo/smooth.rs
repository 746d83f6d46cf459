//! Laplacian mesh smoothing.
//!
//! One pass of uniform Laplacian smoothing moves every vertex toward the
//! centroid of its adjacent vertices:
//!
//! ```text
//! p_new = p + w * (centroid(neighbours) - p)
//!       = p * (1 - w) + centroid(neighbours) * w
//! ```
//!
//! The second form is the one evaluated.
//!
//! All new positions are computed from the positions as they were before the
//! pass (a Jacobi update) and written to a fresh buffer, so the result does
//! not depend on the order vertices are visited and parallel execution gives
//! bit-identical output.
//!
//! # Example
//!
//! ```
//! use stlsmooth::algo::smooth::{laplacian_smooth, SmoothOptions};
//! use stlsmooth::mesh::{weld, Mesh};
//! use nalgebra::Point3;
//!
//! let p1 = vec![Point3::new(0.0, 0.0, 0.0)];
//! let p2 = vec![Point3::new(3.0, 0.0, 0.0)];
//! let p3 = vec![Point3::new(0.0, 3.0, 0.0)];
//! let mesh: Mesh = weld(&p1, &p2, &p3).unwrap();
//!
//! let moved = laplacian_smooth(mesh.vertices(), mesh.adjacency(), &SmoothOptions::default());
//! assert_eq!(moved[0], Point3::new(0.75, 0.75, 0.0));
//! ```

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::mesh::{Adjacency, MeshIndex, VertexId};

/// Options for Laplacian smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothOptions {
    /// Fraction of the way each vertex moves toward its neighbour centroid.
    ///
    /// `0.0` leaves the mesh unchanged and `1.0` moves every vertex onto the
    /// centroid. Values outside `[0, 1]` are applied as given.
    pub weight: f64,

    /// Whether to compute vertex updates on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            weight: 0.5,
            parallel: false,
        }
    }
}

impl SmoothOptions {
    /// Create options with the specified weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Performs one pass of Laplacian smoothing.
///
/// Each vertex with neighbours moves to `p * (1 - w) + c * w`, where `c` is
/// the mean of its neighbours' positions and `w` is `options.weight`. This is
/// `p + w * (c - p)` rearranged so that `w = 1` lands exactly on `c`; for
/// other weights the two forms can differ in the last bit.
///
/// Returns a new position list of the same length as `vertices`. A vertex
/// with no neighbours keeps its position. A vertex adjacent to itself through
/// a degenerate triangle counts its own position among its neighbours.
///
/// # Panics
///
/// Panics if `adjacency` names a neighbour outside `vertices`. Meshes built
/// by [`crate::mesh::weld`] never do.
pub fn laplacian_smooth<I: MeshIndex>(
    vertices: &[Point3<f64>],
    adjacency: &Adjacency<I>,
    options: &SmoothOptions,
) -> Vec<Point3<f64>> {
    if options.weight == 0.0 {
        return vertices.to_vec();
    }

    let step = |i: usize| compute_laplacian_step(vertices, adjacency, VertexId::new(i), options.weight);
    let new_positions: Vec<Point3<f64>> = if options.parallel {
        (0..vertices.len()).into_par_iter().map(step).collect()
    } else {
        (0..vertices.len()).map(step).collect()
    };

    let isolated = (0..vertices.len())
        .filter(|&i| adjacency.degree(VertexId::<I>::new(i)) == 0)
        .count();
    if isolated > 0 {
        debug!("{} vertices have no neighbours and were left in place", isolated);
    }

    new_positions
}

/// Compute one Laplacian smoothing step for a vertex using uniform weights.
fn compute_laplacian_step<I: MeshIndex>(
    vertices: &[Point3<f64>],
    adjacency: &Adjacency<I>,
    v: VertexId<I>,
    weight: f64,
) -> Point3<f64> {
    let pos = vertices[v.index()];
    let neighbors = adjacency.neighbors(v);

    if neighbors.is_empty() {
        return pos;
    }

    let mut centroid = Vector3::zeros();
    for n in neighbors {
        centroid += vertices[n.index()].coords;
    }
    centroid /= neighbors.len() as f64;

    // Blended form so that weight 1 lands exactly on the centroid.
    Point3::from(pos.coords * (1.0 - weight) + centroid * weight)
}
