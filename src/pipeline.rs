//! The read, weld, smooth, write pipeline.
//!
//! Each stage consumes the previous stage's output in full before the next
//! starts, and any failure aborts the run. [`smooth_file`] never leaves a
//! partial output file behind: the result is written to a temporary file next
//! to the destination and renamed over it only once writing has succeeded.
//! A replaced file keeps its permissions.
//!
//! # Example
//!
//! ```no_run
//! use stlsmooth::pipeline::{smooth_file, PipelineOptions};
//!
//! let report = smooth_file("beam.stl", "beam_smooth.stl", &PipelineOptions::default()).unwrap();
//! println!("{} vertices in {:.2?}", report.vertices, report.timings.total());
//! ```

use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use tracing::info;

use crate::algo::smooth::SmoothOptions;
use crate::algo::Progress;
use crate::error::{MeshError, Result};
use crate::io::stl::{self, RawTriangles, WriteOptions};
use crate::mesh::{Mesh, WeldOptions};

/// A step of the pipeline, used to label errors, timings and progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Parsing STL text into per-triangle corners.
    Read,
    /// Merging duplicate corners and building adjacency.
    Weld,
    /// Laplacian smoothing.
    Smooth,
    /// Serializing STL text.
    Write,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [Stage::Read, Stage::Weld, Stage::Smooth, Stage::Write];

    /// Position of the stage in [`Stage::ALL`].
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Lowercase stage name.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Read => "read",
            Stage::Weld => "weld",
            Stage::Smooth => "smooth",
            Stage::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options for a full pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineOptions {
    /// Welding options.
    pub weld: WeldOptions,
    /// Smoothing options.
    pub smooth: SmoothOptions,
    /// Output options.
    pub write: WriteOptions,
}

impl PipelineOptions {
    /// Create options with the specified smoothing weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.smooth.weight = weight;
        self
    }
}

/// Wall-clock time spent in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTimings {
    /// Time spent reading.
    pub read: Duration,
    /// Time spent welding.
    pub weld: Duration,
    /// Time spent smoothing.
    pub smooth: Duration,
    /// Time spent writing.
    pub write: Duration,
}

impl StageTimings {
    /// Time spent in one stage.
    pub fn get(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Read => self.read,
            Stage::Weld => self.weld,
            Stage::Smooth => self.smooth,
            Stage::Write => self.write,
        }
    }

    fn set(&mut self, stage: Stage, elapsed: Duration) {
        match stage {
            Stage::Read => self.read = elapsed,
            Stage::Weld => self.weld = elapsed,
            Stage::Smooth => self.smooth = elapsed,
            Stage::Write => self.write = elapsed,
        }
    }

    /// Sum over all stages.
    pub fn total(&self) -> Duration {
        Stage::ALL.iter().map(|&s| self.get(s)).sum()
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Number of triangles read and written.
    pub triangles: usize,
    /// Number of unique vertices after welding.
    pub vertices: usize,
    /// Number of distinct undirected edges.
    pub edges: usize,
    /// Vertices with no neighbours, left unmoved by smoothing.
    pub isolated_vertices: usize,
    /// Triangles that reference a vertex more than once after welding.
    pub degenerate_triangles: usize,
    /// Per-stage wall-clock time.
    pub timings: StageTimings,
}

/// Smooth an STL file and write the result to `output`.
pub fn smooth_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &PipelineOptions,
) -> Result<PipelineReport> {
    smooth_file_with_progress(input, output, options, &Progress::none())
}

/// [`smooth_file`] with a callback invoked as each stage starts.
pub fn smooth_file_with_progress<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &PipelineOptions,
    progress: &Progress,
) -> Result<PipelineReport> {
    let input = input.as_ref();
    let output = output.as_ref();
    info!("Smoothing {} -> {}", input.display(), output.display());

    // Read and write errors already name their file; only welding fails bare.
    run(
        || stl::load(input),
        |mesh| write_replacing(mesh, output, &options.write),
        options,
        progress,
    )
    .map_err(|e| e.in_file(input, Stage::Weld))
}

/// Smooth STL text from `reader` and write the result to `writer`.
pub fn smooth_stream<R: BufRead, W: Write>(
    reader: R,
    writer: W,
    options: &PipelineOptions,
) -> Result<PipelineReport> {
    run(
        || stl::read(reader),
        |mesh| stl::write(writer, mesh.vertices(), mesh.triangles(), &options.write),
        options,
        &Progress::none(),
    )
}

fn run(
    read: impl FnOnce() -> Result<RawTriangles>,
    write: impl FnOnce(&Mesh) -> Result<()>,
    options: &PipelineOptions,
    progress: &Progress,
) -> Result<PipelineReport> {
    let mut timings = StageTimings::default();

    let raw = timed(&mut timings, progress, Stage::Read, read)?;
    info!("Read {} triangles in {:.3?}", raw.len(), timings.read);

    let mesh: Mesh = timed(&mut timings, progress, Stage::Weld, || raw.weld(&options.weld))?;
    drop(raw);
    info!(
        "Welded {} unique vertices in {:.3?}",
        mesh.num_vertices(),
        timings.weld
    );

    let smoothed = timed(&mut timings, progress, Stage::Smooth, || {
        Ok(mesh.smoothed(&options.smooth))
    })?;
    info!(
        "Smoothed with weight {} in {:.3?}",
        options.smooth.weight, timings.smooth
    );

    timed(&mut timings, progress, Stage::Write, || write(&smoothed))?;
    info!("Wrote {} triangles in {:.3?}", smoothed.num_triangles(), timings.write);
    progress.finished();

    let adjacency = smoothed.adjacency();
    Ok(PipelineReport {
        triangles: smoothed.num_triangles(),
        vertices: smoothed.num_vertices(),
        edges: adjacency.num_edges(),
        isolated_vertices: adjacency.isolated_vertices().count(),
        degenerate_triangles: smoothed.degenerate_triangles().count(),
        timings,
    })
}

fn timed<T>(
    timings: &mut StageTimings,
    progress: &Progress,
    stage: Stage,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    progress.stage(stage);
    let start = Instant::now();
    let out = f();
    timings.set(stage, start.elapsed());
    out
}

/// Write `mesh` to a temporary file beside `output`, then move it into place.
fn write_replacing(mesh: &Mesh, output: &Path, options: &WriteOptions) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = temp_file_beside(output, dir).map_err(|e| MeshError::io(output, Stage::Write, e))?;
    stl::write(
        BufWriter::new(tmp.as_file_mut()),
        mesh.vertices(),
        mesh.triangles(),
        options,
    )
    .map_err(|e| e.in_file(output, Stage::Write))?;
    tmp.persist(output)
        .map_err(|e| MeshError::io(output, Stage::Write, e.error))?;
    Ok(())
}

/// Create the temporary output file with the permissions `output` will end up
/// with: those of the file being replaced, or the usual `0o666` less umask for
/// a new file.
fn temp_file_beside(output: &Path, dir: &Path) -> io::Result<NamedTempFile> {
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let tmp = builder.tempfile_in(dir)?;

    if let Ok(existing) = fs::metadata(output) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    Ok(tmp)
}
