//! stlsmooth CLI - weld and smooth ASCII STL meshes.
//!
//! Usage: stlsmooth <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `stlsmooth --help` for available commands.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use stlsmooth::algo::smooth::SmoothOptions;
use stlsmooth::algo::Progress;
use stlsmooth::error::MeshError;
use stlsmooth::io;
use stlsmooth::io::stl::WriteOptions;
use stlsmooth::mesh::{Mesh, WeldOptions, WELD_TOLERANCE};
use stlsmooth::pipeline::{self, PipelineOptions, Stage};

#[derive(Parser)]
#[command(name = "stlsmooth")]
#[command(author, version, about = "Weld and Laplacian-smooth ASCII STL meshes", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display welded mesh information
    Info {
        /// Input STL file
        input: PathBuf,

        /// Distance at or below which vertices are merged
        #[arg(short, long, default_value_t = WELD_TOLERANCE)]
        tolerance: f64,
    },

    /// Smooth a mesh with one Laplacian pass
    Smooth {
        /// Input STL file
        input: PathBuf,

        /// Output STL file
        output: PathBuf,

        /// Fraction of the way each vertex moves toward its neighbours
        #[arg(short, long, default_value = "0.5", allow_negative_numbers = true)]
        weight: f64,

        /// Distance at or below which vertices are merged
        #[arg(short, long, default_value_t = WELD_TOLERANCE)]
        tolerance: f64,

        /// Write unit-length facet normals
        #[arg(long)]
        normalize_normals: bool,

        /// Compute vertex updates on all cores
        #[arg(long)]
        parallel: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(MeshError::invalid_param("log-level", other, "unknown level").into()),
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input, tolerance } => {
            cmd_info(&input, tolerance)?;
        }

        Commands::Smooth {
            input,
            output,
            weight,
            tolerance,
            normalize_normals,
            parallel,
        } => {
            let options = PipelineOptions {
                weld: WeldOptions::default().with_tolerance(tolerance),
                smooth: SmoothOptions::default()
                    .with_weight(weight)
                    .with_parallel(parallel),
                write: WriteOptions { normalize_normals },
            };
            cmd_smooth(&input, &output, &options)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that draws a stage bar on stderr.
fn create_progress() -> Progress {
    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let bar: String = (0..total).map(|i| if i < current { '=' } else { ' ' }).collect();
        eprint!("\r[{}] {}/{} {:<8}", bar, current, total, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_info(input: &PathBuf, tolerance: f64) -> Result<(), Box<dyn std::error::Error>> {
    check_tolerance(tolerance)?;
    let mesh: Mesh = io::load(input, &WeldOptions::default().with_tolerance(tolerance))?;
    let adjacency = mesh.adjacency();

    println!("File: {}", input.display());
    println!("Triangles: {}", mesh.num_triangles());
    println!("Vertices: {} (from {} corners)", mesh.num_vertices(), 3 * mesh.num_triangles());
    println!("Edges: {}", adjacency.num_edges());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    println!("Surface area: {:.6}", mesh.surface_area());

    let degrees: Vec<usize> = mesh.vertex_ids().map(|v| adjacency.degree(v)).collect();
    if let (Some(min), Some(max)) = (degrees.iter().min(), degrees.iter().max()) {
        let avg = degrees.iter().sum::<usize>() as f64 / degrees.len() as f64;
        println!("Vertex degree: min={}, max={}, avg={:.2}", min, max, avg);
    }

    let degenerate = mesh.degenerate_triangles().count();
    if degenerate > 0 {
        println!("Degenerate triangles: {}", degenerate);
    }
    let self_loops = adjacency.self_loops().count();
    if self_loops > 0 {
        println!("Self-adjacent vertices: {}", self_loops);
    }
    let isolated = adjacency.isolated_vertices().count();
    if isolated > 0 {
        println!("Isolated vertices: {}", isolated);
    }

    Ok(())
}

fn cmd_smooth(
    input: &PathBuf,
    output: &PathBuf,
    options: &PipelineOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    check_tolerance(options.weld.tolerance)?;
    if !options.smooth.weight.is_finite() {
        return Err(MeshError::invalid_param("weight", options.smooth.weight, "must be finite").into());
    }

    let mode = if options.smooth.parallel { "parallel" } else { "sequential" };
    println!(
        "Smoothing {} (weight={}, tolerance={}, {})...",
        input.display(),
        options.smooth.weight,
        options.weld.tolerance,
        mode
    );

    let progress = create_progress();
    let report = pipeline::smooth_file_with_progress(input, output, options, &progress)?;

    println!(
        "Welded {} triangles into {} vertices",
        report.triangles, report.vertices
    );
    for stage in Stage::ALL {
        println!("Time to {}: {:.3}s", stage, report.timings.get(stage).as_secs_f64());
    }
    println!("Saved: {} ({:.2?})", output.display(), report.timings.total());

    Ok(())
}

fn check_tolerance(tolerance: f64) -> Result<(), MeshError> {
    if tolerance.is_finite() && tolerance >= 0.0 {
        Ok(())
    } else {
        Err(MeshError::invalid_param("tolerance", tolerance, "must be finite and non-negative"))
    }
}
