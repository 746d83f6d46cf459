//! Mesh file I/O.
//!
//! Only ASCII STL is supported. [`stl::read`] and [`stl::write`] work on any
//! reader or writer; [`load`] and [`save`] are file-based shortcuts that also
//! weld on the way in.
//!
//! # Usage
//!
//! ```no_run
//! use stlsmooth::io::{load, save};
//! use stlsmooth::io::stl::WriteOptions;
//! use stlsmooth::mesh::{Mesh, WeldOptions};
//!
//! let mesh: Mesh = load("part.stl", &WeldOptions::default()).unwrap();
//! save(&mesh, "part_copy.stl", &WriteOptions::default()).unwrap();
//! ```

pub mod stl;

use std::path::Path;

use crate::error::Result;
use crate::mesh::{Mesh, MeshIndex, WeldOptions};
use crate::pipeline::Stage;

/// Load an STL file and weld it into a shared-vertex mesh.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P, options: &WeldOptions) -> Result<Mesh<I>> {
    let path = path.as_ref();
    let raw = stl::load(path)?;
    raw.weld(options).map_err(|e| e.in_file(path, Stage::Weld))
}

/// Save a mesh as ASCII STL.
pub fn save<P: AsRef<Path>, I: MeshIndex>(
    mesh: &Mesh<I>,
    path: P,
    options: &stl::WriteOptions,
) -> Result<()> {
    stl::save(mesh, path, options)
}
