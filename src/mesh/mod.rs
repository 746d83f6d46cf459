//! Core mesh data structures.
//!
//! This module turns the per-triangle corner lists read from STL into a
//! shared-vertex triangle mesh with vertex adjacency.
//!
//! # Overview
//!
//! The primary type is [`Mesh`]: a vertex list, triangle connectivity as
//! [`VertexId`] triples in source winding order, and a symmetric
//! [`Adjacency`] relation derived from triangle edges. Meshes are produced by
//! [`weld`], which merges corner copies within [`WELD_TOLERANCE`].
//!
//! # Index Types
//!
//! Elements are identified by type-safe index wrappers, [`VertexId`] and
//! [`FaceId`], generic over the underlying integer type ([`MeshIndex`]).
//!
//! # Construction
//!
//! ```
//! use stlsmooth::mesh::{weld, Mesh, VertexId};
//! use nalgebra::Point3;
//!
//! let p1 = vec![Point3::new(0.0, 0.0, 0.0)];
//! let p2 = vec![Point3::new(1.0, 0.0, 0.0)];
//! let p3 = vec![Point3::new(0.5, 1.0, 0.0)];
//!
//! let mesh: Mesh = weld(&p1, &p2, &p3).unwrap();
//! assert_eq!(mesh.adjacency().degree(VertexId::new(0)), 2);
//! ```

mod adjacency;
mod index;
mod trimesh;
mod weld;

pub use adjacency::Adjacency;
pub use index::{FaceId, MeshIndex, VertexId};
pub use trimesh::{triangle_normal, Mesh};
pub use weld::{weld, weld_with_options, WeldOptions, WELD_TOLERANCE};
