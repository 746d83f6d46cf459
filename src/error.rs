//! Error types for stlsmooth.
//!
//! This module defines all error types used throughout the library.
//!
//! Two conditions that look like errors are deliberately absent: a facet
//! normal that fails to parse is skipped by the reader (normals are always
//! recomputed on output), and a vertex without neighbours is left in place by
//! the smoother.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::pipeline::Stage;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while reading, welding, smoothing or writing a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A vertex line could not be read as three numbers.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number in the input stream.
        line: usize,
        /// What was expected and what was found.
        message: String,
    },

    /// The per-triangle vertex arrays disagree in length.
    #[error(
        "triangle count mismatch: expected {expected} triangles, \
         found {p1}/{p2}/{p3} first/second/third vertices"
    )]
    TriangleCountMismatch {
        /// Number of triangles that were started.
        expected: usize,
        /// Number of first vertices.
        p1: usize,
        /// Number of second vertices.
        p2: usize,
        /// Number of third vertices.
        p3: usize,
    },

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// The welded mesh has more vertices than the chosen index type can address.
    #[error("mesh has {count} vertices, more than the index type can address")]
    IndexOverflow {
        /// The number of unique vertices.
        count: usize,
    },

    /// I/O error on an in-memory stream with no associated path.
    #[error("I/O error: {0}")]
    Stream(#[from] std::io::Error),

    /// I/O error on a named file.
    #[error("{stage} failed for {}: {source}", path.display())]
    Io {
        /// The file path.
        path: PathBuf,
        /// The pipeline stage that touched the file.
        stage: Stage,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A non-I/O failure while processing a named file.
    #[error("{stage} failed for {}: {source}", path.display())]
    InFile {
        /// The file path.
        path: PathBuf,
        /// The pipeline stage that failed.
        stage: Stage,
        /// The underlying error.
        #[source]
        source: Box<MeshError>,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create an I/O error for a named file.
    pub fn io<P: AsRef<Path>>(path: P, stage: Stage, source: std::io::Error) -> Self {
        MeshError::Io {
            path: path.as_ref().to_path_buf(),
            stage,
            source,
        }
    }

    /// Attach a file path and stage to an error raised on that file's stream.
    ///
    /// Errors that already carry a path are returned unchanged.
    pub fn in_file<P: AsRef<Path>>(self, path: P, stage: Stage) -> Self {
        match self {
            MeshError::Stream(source) => MeshError::io(path, stage, source),
            err @ (MeshError::Io { .. } | MeshError::InFile { .. }) => err,
            other => MeshError::InFile {
                path: path.as_ref().to_path_buf(),
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, with any file context stripped.
    pub fn root(&self) -> &MeshError {
        match self {
            MeshError::InFile { source, .. } => source.root(),
            other => other,
        }
    }

    /// The stage this error is attributed to, if it carries file context.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            MeshError::Io { stage, .. } | MeshError::InFile { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_file_wraps_stream_errors_as_io() {
        let err = MeshError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
        let err = err.in_file("mesh.stl", Stage::Read);

        match &err {
            MeshError::Io { path, stage, .. } => {
                assert_eq!(path, Path::new("mesh.stl"));
                assert_eq!(*stage, Stage::Read);
            }
            other => panic!("expected Io, got {:?}", other),
        }
        assert_eq!(err.to_string(), "read failed for mesh.stl: disk gone");
    }

    #[test]
    fn test_in_file_keeps_parse_error_reachable() {
        let err = MeshError::Parse {
            line: 4,
            message: "bad vertex".to_string(),
        }
        .in_file("part.stl", Stage::Read);

        assert_eq!(err.stage(), Some(Stage::Read));
        assert!(matches!(err.root(), MeshError::Parse { line: 4, .. }));
        assert_eq!(err.to_string(), "read failed for part.stl: line 4: bad vertex");
    }

    #[test]
    fn test_in_file_does_not_double_wrap() {
        let err = MeshError::io("a.stl", Stage::Write, std::io::Error::other("denied"));
        let err = err.in_file("b.stl", Stage::Read);
        assert_eq!(err.stage(), Some(Stage::Write));
        assert!(err.to_string().contains("a.stl"));
    }
}
