//! # stlsmooth
//!
//! Vertex welding and Laplacian smoothing for ASCII STL meshes.
//!
//! STL stores every triangle with its own copy of each corner, so a raw
//! STL surface has no notion of which triangles touch. This crate reads the
//! text format, merges corner copies that lie within a tolerance into shared
//! vertices, builds the vertex adjacency relation, runs one pass of uniform
//! Laplacian smoothing, and writes the result back out as ASCII STL.
//!
//! ## Pipeline
//!
//! | Stage  | Function | Output |
//! |--------|----------|--------|
//! | Read   | [`io::stl::read`] | [`io::stl::RawTriangles`] |
//! | Weld   | [`mesh::weld`] | [`mesh::Mesh`] with [`mesh::Adjacency`] |
//! | Smooth | [`algo::smooth::laplacian_smooth`] | new vertex positions |
//! | Write  | [`io::stl::write`] | ASCII STL |
//!
//! [`pipeline::smooth_file`] runs all four stages on a pair of paths.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stlsmooth::pipeline::{smooth_file, PipelineOptions};
//!
//! let options = PipelineOptions::default().with_weight(0.5);
//! let report = smooth_file("scan.stl", "scan_smooth.stl", &options).unwrap();
//! println!("{} triangles, {} vertices", report.triangles, report.vertices);
//! ```
//!
//! ## Working in Memory
//!
//! ```
//! use stlsmooth::prelude::*;
//! use nalgebra::Point3;
//!
//! // Two triangles sharing the diagonal of a unit square.
//! let p1 = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0)];
//! let p2 = vec![Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)];
//! let p3 = vec![Point3::new(1.0, 1.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
//!
//! let mesh: Mesh = weld(&p1, &p2, &p3).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert!(mesh.adjacency().are_adjacent(VertexId::new(0), VertexId::new(2)));
//! assert!(!mesh.adjacency().are_adjacent(VertexId::new(1), VertexId::new(3)));
//!
//! let smooth = mesh.smoothed(&SmoothOptions::default());
//! assert_eq!(smooth.triangles(), mesh.triangles());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod pipeline;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use stlsmooth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::smooth::{laplacian_smooth, SmoothOptions};
    pub use crate::error::{MeshError, Result};
    pub use crate::io::stl::{RawTriangles, WriteOptions};
    pub use crate::mesh::{
        weld, weld_with_options, Adjacency, FaceId, Mesh, MeshIndex, VertexId, WeldOptions,
        WELD_TOLERANCE,
    };
    pub use crate::pipeline::{smooth_file, PipelineOptions, PipelineReport, Stage};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_isolated_triangle_pipeline() {
        let p1 = vec![Point3::new(0.0, 0.0, 0.0)];
        let p2 = vec![Point3::new(1.0, 0.0, 0.0)];
        let p3 = vec![Point3::new(0.0, 1.0, 0.0)];

        let mesh: Mesh = weld(&p1, &p2, &p3).unwrap();
        assert!(mesh.is_valid());
        for v in mesh.vertex_ids() {
            assert_eq!(mesh.adjacency().degree(v), 2);
        }

        let smooth = mesh.smoothed(&SmoothOptions::default());
        assert_eq!(smooth.vertices()[0], Point3::new(0.25, 0.25, 0.0));
        assert_eq!(smooth.vertices()[1], Point3::new(0.5, 0.25, 0.0));
        assert_eq!(smooth.vertices()[2], Point3::new(0.25, 0.5, 0.0));
    }
}
