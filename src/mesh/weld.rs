//! Vertex welding.
//!
//! STL stores every triangle with its own copy of each corner. Welding
//! merges copies that lie within a distance tolerance into one shared vertex
//! and records which shared vertices each triangle uses.
//!
//! # Algorithm
//!
//! Triangles are visited in input order, corners in P1, P2, P3 order. Each
//! corner is compared against the vertex list built so far, front to back,
//! and takes the index of the *first* vertex within tolerance. If none
//! matches, the corner is appended as a new vertex. This is O(V²) in the
//! number of unique vertices, and the result depends on input order: when a
//! corner is within tolerance of two vertices, the earlier one wins even if
//! the later one is closer.
//!
//! The tolerance is inclusive: two points exactly `tolerance` apart are the
//! same vertex.

use nalgebra::Point3;
use tracing::{debug, warn};

use super::index::{MeshIndex, VertexId};
use super::trimesh::Mesh;
use crate::error::{MeshError, Result};

/// Default distance below which two vertices are considered identical.
pub const WELD_TOLERANCE: f64 = 1e-7;

/// Options for vertex welding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeldOptions {
    /// Euclidean distance at or below which two corners are merged.
    pub tolerance: f64,
}

impl Default for WeldOptions {
    fn default() -> Self {
        Self {
            tolerance: WELD_TOLERANCE,
        }
    }
}

impl WeldOptions {
    /// Create options with the specified tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Weld per-triangle corner positions into a shared-vertex mesh.
///
/// `p1[i]`, `p2[i]` and `p3[i]` are the corners of triangle `i`. Uses
/// [`WELD_TOLERANCE`].
///
/// # Errors
///
/// Returns [`MeshError::TriangleCountMismatch`] if the three slices differ in
/// length, and [`MeshError::IndexOverflow`] if the unique vertices do not fit
/// the index type.
///
/// # Example
///
/// ```
/// use stlsmooth::mesh::{weld, Mesh};
/// use nalgebra::Point3;
///
/// let p1 = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0)];
/// let p2 = vec![Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)];
/// let p3 = vec![Point3::new(1.0, 1.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
///
/// let mesh: Mesh = weld(&p1, &p2, &p3).unwrap();
/// assert_eq!(mesh.num_vertices(), 4);
/// ```
pub fn weld<I: MeshIndex>(
    p1: &[Point3<f64>],
    p2: &[Point3<f64>],
    p3: &[Point3<f64>],
) -> Result<Mesh<I>> {
    weld_with_options(p1, p2, p3, &WeldOptions::default())
}

/// Weld per-triangle corner positions using the given options.
///
/// See [`weld`].
pub fn weld_with_options<I: MeshIndex>(
    p1: &[Point3<f64>],
    p2: &[Point3<f64>],
    p3: &[Point3<f64>],
    options: &WeldOptions,
) -> Result<Mesh<I>> {
    if p1.len() != p2.len() || p1.len() != p3.len() {
        return Err(MeshError::TriangleCountMismatch {
            expected: p1.len(),
            p1: p1.len(),
            p2: p2.len(),
            p3: p3.len(),
        });
    }

    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut triangles: Vec<[usize; 3]> = Vec::with_capacity(p1.len());

    for ((a, b), c) in p1.iter().zip(p2).zip(p3) {
        let i0 = find_or_add_vertex(&mut vertices, a, options.tolerance);
        let i1 = find_or_add_vertex(&mut vertices, b, options.tolerance);
        let i2 = find_or_add_vertex(&mut vertices, c, options.tolerance);
        triangles.push([i0, i1, i2]);
    }

    if !I::can_address(vertices.len()) {
        return Err(MeshError::IndexOverflow {
            count: vertices.len(),
        });
    }

    let degenerate = triangles
        .iter()
        .filter(|t| t[0] == t[1] || t[1] == t[2] || t[0] == t[2])
        .count();
    if degenerate > 0 {
        warn!(
            "{} of {} triangles collapse onto a repeated vertex",
            degenerate,
            triangles.len()
        );
    }
    debug!(
        "Welded {} corners into {} vertices",
        3 * triangles.len(),
        vertices.len()
    );

    let triangles = triangles
        .into_iter()
        .map(|t| [VertexId::new(t[0]), VertexId::new(t[1]), VertexId::new(t[2])])
        .collect();
    Ok(Mesh::from_welded(vertices, triangles))
}

/// Index of the first vertex within `tolerance` of `p`, appending `p` if none is.
fn find_or_add_vertex(vertices: &mut Vec<Point3<f64>>, p: &Point3<f64>, tolerance: f64) -> usize {
    for (i, v) in vertices.iter().enumerate() {
        if (v - p).norm() <= tolerance {
            return i;
        }
    }
    let idx = vertices.len();
    vertices.push(*p);
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;

    fn v(i: usize) -> VertexId {
        VertexId::new(i)
    }

    fn raw(t: &[[[f64; 3]; 3]]) -> (Vec<Point3<f64>>, Vec<Point3<f64>>, Vec<Point3<f64>>) {
        let p = |c: [f64; 3]| Point3::new(c[0], c[1], c[2]);
        (
            t.iter().map(|t| p(t[0])).collect(),
            t.iter().map(|t| p(t[1])).collect(),
            t.iter().map(|t| p(t[2])).collect(),
        )
    }

    #[test]
    fn test_two_triangle_square() {
        let (p1, p2, p3) = raw(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        ]);
        let mesh: Mesh = weld(&p1, &p2, &p3).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.triangles(), &[[v(0), v(1), v(2)], [v(0), v(2), v(3)]]);

        let adj = mesh.adjacency();
        for (a, b) in [(0, 1), (1, 2), (0, 2), (0, 3), (2, 3)] {
            assert!(adj.are_adjacent(v(a), v(b)));
            assert!(adj.are_adjacent(v(b), v(a)));
        }
        assert!(!adj.are_adjacent(v(1), v(3)));
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_unique_input_is_unchanged() {
        let (p1, p2, p3) = raw(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[5.0, 0.0, 0.0], [6.0, 0.0, 0.0], [5.0, 1.0, 0.0]],
        ]);
        let mesh: Mesh = weld(&p1, &p2, &p3).unwrap();

        let expected: Vec<Point3<f64>> = (0..2)
            .flat_map(|i| [p1[i], p2[i], p3[i]])
            .collect();
        assert_eq!(mesh.vertices(), expected.as_slice());
        assert_eq!(
            mesh.triangles(),
            &[[v(0), v(1), v(2)], [v(3), v(4), v(5)]]
        );
    }

    #[test]
    fn test_preserves_winding_order() {
        let (p1, p2, p3) = raw(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
        ]);
        let mesh: Mesh = weld(&p1, &p2, &p3).unwrap();
        assert_eq!(mesh.triangle(FaceId::new(0)), [v(0), v(1), v(2)]);
        assert_eq!(mesh.triangle(FaceId::new(1)), [v(2), v(1), v(3)]);
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let (p1, p2, p3) = raw(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[1e-7, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        ]);
        let mesh: Mesh = weld(&p1, &p2, &p3).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.triangle(FaceId::new(1)), [v(0), v(1), v(2)]);
    }

    #[test]
    fn test_beyond_tolerance_stays_separate() {
        let (p1, p2, p3) = raw(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[2e-7, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        ]);
        let mesh: Mesh = weld(&p1, &p2, &p3).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
    }

    #[test]
    fn test_first_match_wins_over_nearest() {
        // Vertex 0 at x=0, vertex 1 at x=1.5. A corner at x=1.0 is within
        // tolerance 1.0 of both and is closer to vertex 1.
        let (p1, p2, p3) = raw(&[
            [[0.0, 0.0, 0.0], [1.5, 0.0, 0.0], [0.0, 10.0, 0.0]],
            [[1.0, 0.0, 0.0], [0.0, 10.0, 0.0], [1.5, 0.0, 0.0]],
        ]);
        let options = WeldOptions::default().with_tolerance(1.0);
        let mesh: Mesh = weld_with_options(&p1, &p2, &p3, &options).unwrap();
        assert_eq!(mesh.triangle(FaceId::new(1))[0], v(0));
    }

    #[test]
    fn test_degenerate_triangle_tolerated() {
        let (p1, p2, p3) = raw(&[[[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]]);
        let mesh: Mesh = weld(&p1, &p2, &p3).unwrap();
        assert_eq!(mesh.num_vertices(), 2);
        assert_eq!(mesh.triangle(FaceId::new(0)), [v(0), v(0), v(1)]);
        assert!(mesh.adjacency().are_adjacent(v(0), v(0)));
        assert_eq!(mesh.degenerate_triangles().count(), 1);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let p = vec![Point3::origin(); 2];
        let short = vec![Point3::origin(); 1];
        let err = weld::<u32>(&p, &p, &short).unwrap_err();
        assert!(matches!(
            err,
            MeshError::TriangleCountMismatch { expected: 2, p1: 2, p2: 2, p3: 1 }
        ));
    }

    #[test]
    fn test_empty_input() {
        let mesh: Mesh = weld(&[], &[], &[]).unwrap();
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_triangles(), 0);
        assert!(mesh.is_valid());
    }
}
