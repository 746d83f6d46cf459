//! Vertex adjacency.
//!
//! The relation is undirected and boolean: an edge shared by several
//! triangles is recorded once, and every pair is stored in both directions.
//! Each vertex keeps a sorted neighbour list, which answers the same queries
//! as a dense 0/1 matrix without the quadratic storage.

use super::index::{MeshIndex, VertexId};

/// Symmetric vertex-to-vertex adjacency built from triangle edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjacency<I: MeshIndex = u32> {
    neighbors: Vec<Vec<VertexId<I>>>,
}

impl<I: MeshIndex> Adjacency<I> {
    /// Create an empty relation over `num_vertices` vertices.
    pub fn with_vertex_count(num_vertices: usize) -> Self {
        Self {
            neighbors: vec![Vec::new(); num_vertices],
        }
    }

    /// Build the relation from triangle connectivity.
    ///
    /// Every triangle `[u, v, w]` contributes the pairs `(u, v)`, `(v, w)`
    /// and `(u, w)`. A triangle that repeats a vertex contributes a self-loop
    /// on that vertex; these are kept rather than filtered.
    ///
    /// # Panics
    ///
    /// Panics if a triangle references a vertex `>= num_vertices`.
    pub fn from_triangles(num_vertices: usize, triangles: &[[VertexId<I>; 3]]) -> Self {
        let mut adjacency = Self::with_vertex_count(num_vertices);
        for &[u, v, w] in triangles {
            adjacency.insert(u, v);
            adjacency.insert(v, w);
            adjacency.insert(u, w);
        }
        adjacency
    }

    /// Mark `u` and `v` as adjacent in both directions.
    pub fn insert(&mut self, u: VertexId<I>, v: VertexId<I>) {
        insert_sorted(&mut self.neighbors[u.index()], v);
        if u != v {
            insert_sorted(&mut self.neighbors[v.index()], u);
        }
    }

    /// Check whether `u` and `v` share a triangle edge.
    ///
    /// Vertices outside the relation are adjacent to nothing.
    pub fn are_adjacent(&self, u: VertexId<I>, v: VertexId<I>) -> bool {
        self.neighbors
            .get(u.index())
            .is_some_and(|list| list.binary_search(&v).is_ok())
    }

    /// Neighbours of `v` in ascending index order.
    pub fn neighbors(&self, v: VertexId<I>) -> &[VertexId<I>] {
        self.neighbors
            .get(v.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct neighbours of `v`.
    pub fn degree(&self, v: VertexId<I>) -> usize {
        self.neighbors(v).len()
    }

    /// Number of vertices the relation is defined over.
    pub fn num_vertices(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of distinct undirected edges, self-loops included.
    pub fn num_edges(&self) -> usize {
        self.edges().count()
    }

    /// Iterate over each undirected edge once, as `(u, v)` with `u <= v`.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId<I>, VertexId<I>)> + '_ {
        self.neighbors.iter().enumerate().flat_map(|(u, list)| {
            let u = VertexId::new(u);
            list.iter().filter(move |&&v| u <= v).map(move |&v| (u, v))
        })
    }

    /// Vertices with no neighbours at all.
    pub fn isolated_vertices(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .filter(|(_, list)| list.is_empty())
            .map(|(v, _)| VertexId::new(v))
    }

    /// Vertices that are adjacent to themselves through a degenerate triangle.
    pub fn self_loops(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.neighbors.len())
            .map(VertexId::new)
            .filter(|&v| self.are_adjacent(v, v))
    }
}

fn insert_sorted<I: MeshIndex>(list: &mut Vec<VertexId<I>>, v: VertexId<I>) {
    if let Err(pos) = list.binary_search(&v) {
        list.insert(pos, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(a: usize, b: usize, c: usize) -> [VertexId; 3] {
        [VertexId::new(a), VertexId::new(b), VertexId::new(c)]
    }

    fn v(i: usize) -> VertexId {
        VertexId::new(i)
    }

    #[test]
    fn test_square_adjacency() {
        let adj = Adjacency::from_triangles(4, &[tri(0, 1, 2), tri(0, 2, 3)]);

        for (a, b) in [(0, 1), (1, 2), (0, 2), (0, 3), (2, 3)] {
            assert!(adj.are_adjacent(v(a), v(b)), "missing ({}, {})", a, b);
            assert!(adj.are_adjacent(v(b), v(a)), "missing ({}, {})", b, a);
        }
        assert!(!adj.are_adjacent(v(1), v(3)));
        assert!(!adj.are_adjacent(v(3), v(1)));
        assert_eq!(adj.num_edges(), 5);
    }

    #[test]
    fn test_shared_edge_recorded_once() {
        let adj = Adjacency::from_triangles(4, &[tri(0, 1, 2), tri(2, 1, 3)]);
        assert_eq!(adj.neighbors(v(1)), &[v(0), v(2), v(3)]);
        assert_eq!(adj.degree(v(2)), 3);
    }

    #[test]
    fn test_no_self_adjacency_for_proper_triangles() {
        let adj = Adjacency::from_triangles(3, &[tri(0, 1, 2)]);
        assert_eq!(adj.self_loops().count(), 0);
        for i in 0..3 {
            assert!(!adj.are_adjacent(v(i), v(i)));
            assert_eq!(adj.degree(v(i)), 2);
        }
    }

    #[test]
    fn test_degenerate_triangle_creates_self_loop() {
        let adj = Adjacency::from_triangles(2, &[tri(0, 0, 1)]);
        assert!(adj.are_adjacent(v(0), v(0)));
        assert!(adj.are_adjacent(v(0), v(1)));
        assert_eq!(adj.self_loops().collect::<Vec<_>>(), vec![v(0)]);
        assert_eq!(adj.neighbors(v(0)), &[v(0), v(1)]);
        assert_eq!(adj.num_edges(), 2);
    }

    #[test]
    fn test_isolated_and_out_of_range_vertices() {
        let adj = Adjacency::from_triangles(5, &[tri(0, 1, 2)]);
        assert_eq!(adj.isolated_vertices().collect::<Vec<_>>(), vec![v(3), v(4)]);
        assert!(adj.neighbors(v(10)).is_empty());
        assert!(!adj.are_adjacent(v(10), v(0)));
    }
}
