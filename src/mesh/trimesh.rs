//! Welded triangle mesh.

use nalgebra::{Point3, Vector3};

use super::adjacency::Adjacency;
use super::index::{FaceId, MeshIndex, VertexId};
use crate::algo::smooth::{laplacian_smooth, SmoothOptions};
use crate::error::{MeshError, Result};

/// A triangle mesh with shared vertices and vertex adjacency.
///
/// The vertex list owns all positions; triangles refer to vertices by
/// [`VertexId`] in their original winding order. The adjacency relation is
/// derived from the triangles when the mesh is built and never changes
/// afterwards, even when positions move.
#[derive(Debug, Clone)]
pub struct Mesh<I: MeshIndex = u32> {
    vertices: Vec<Point3<f64>>,
    triangles: Vec<[VertexId<I>; 3]>,
    adjacency: Adjacency<I>,
}

impl<I: MeshIndex> Mesh<I> {
    /// Build a mesh from a shared vertex list and triangle indices.
    ///
    /// Degenerate triangles (repeated indices) are accepted.
    ///
    /// # Example
    /// ```
    /// use stlsmooth::mesh::Mesh;
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.5, 1.0, 0.0),
    /// ];
    /// let mesh: Mesh = Mesh::from_triangles(vertices, &[[0, 1, 2]]).unwrap();
    /// assert_eq!(mesh.num_vertices(), 3);
    /// assert_eq!(mesh.adjacency().num_edges(), 3);
    /// ```
    pub fn from_triangles(vertices: Vec<Point3<f64>>, triangles: &[[usize; 3]]) -> Result<Self> {
        if !I::can_address(vertices.len()) {
            return Err(MeshError::IndexOverflow {
                count: vertices.len(),
            });
        }
        for (face, tri) in triangles.iter().enumerate() {
            if let Some(&vertex) = tri.iter().find(|&&vi| vi >= vertices.len()) {
                return Err(MeshError::InvalidVertexIndex { face, vertex });
            }
        }

        let triangles: Vec<[VertexId<I>; 3]> = triangles
            .iter()
            .map(|t| [VertexId::new(t[0]), VertexId::new(t[1]), VertexId::new(t[2])])
            .collect();
        Ok(Self::from_welded(vertices, triangles))
    }

    /// Assemble a mesh from already validated parts.
    pub(crate) fn from_welded(vertices: Vec<Point3<f64>>, triangles: Vec<[VertexId<I>; 3]>) -> Self {
        let adjacency = Adjacency::from_triangles(vertices.len(), &triangles);
        Self {
            vertices,
            triangles,
            adjacency,
        }
    }

    /// Number of unique vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// All vertex positions, indexed by [`VertexId`].
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Triangle connectivity in input order.
    pub fn triangles(&self) -> &[[VertexId<I>; 3]] {
        &self.triangles
    }

    /// The vertex adjacency relation.
    pub fn adjacency(&self) -> &Adjacency<I> {
        &self.adjacency
    }

    /// Position of a vertex.
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertices[v.index()]
    }

    /// Vertex indices of a triangle.
    pub fn triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        self.triangles[f.index()]
    }

    /// Corner positions of a triangle, in winding order.
    pub fn triangle_positions(&self, f: FaceId<I>) -> [Point3<f64>; 3] {
        let [a, b, c] = self.triangle(f);
        [*self.position(a), *self.position(b), *self.position(c)]
    }

    /// Un-normalized normal of a triangle; its length is twice the area.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let [p1, p2, p3] = self.triangle_positions(f);
        triangle_normal(&p1, &p2, &p3)
    }

    /// Iterate over all vertex ids.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all triangle ids.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> {
        (0..self.triangles.len()).map(FaceId::new)
    }

    /// Triangles that reference the same vertex more than once.
    pub fn degenerate_triangles(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .filter(|(_, [a, b, c])| a == b || b == c || a == c)
            .map(|(f, _)| FaceId::new(f))
    }

    /// Axis-aligned bounding box, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        }))
    }

    /// A copy of this mesh after one Laplacian smoothing pass.
    ///
    /// Connectivity and adjacency are carried over unchanged.
    pub fn smoothed(&self, options: &SmoothOptions) -> Self {
        Self {
            vertices: laplacian_smooth(&self.vertices, &self.adjacency, options),
            triangles: self.triangles.clone(),
            adjacency: self.adjacency.clone(),
        }
    }

    /// Total area of all triangles.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_normal(f).norm()).sum::<f64>() / 2.0
    }

    /// Check the structural invariants of the mesh.
    ///
    /// Every triangle index is in range, the adjacency covers exactly the
    /// vertex list and is symmetric, and there are at most three vertices per
    /// triangle.
    pub fn is_valid(&self) -> bool {
        let n = self.vertices.len();
        let indices_ok = self.triangles.iter().flatten().all(|v| v.index() < n);
        let symmetric = self
            .adjacency
            .edges()
            .all(|(u, v)| self.adjacency.are_adjacent(v, u));
        indices_ok
            && symmetric
            && self.adjacency.num_vertices() == n
            && n <= 3 * self.triangles.len()
    }
}

/// Normal of the triangle `(p1, p2, p3)` as `(p2 - p1) x (p3 - p1)`, not normalized.
pub fn triangle_normal(p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>) -> Vector3<f64> {
    (p2 - p1).cross(&(p3 - p1))
}
