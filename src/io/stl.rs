//! ASCII STL (stereolithography) format support.
//!
//! # Layout
//!
//! ```text
//! solid name
//! facet normal ni nj nk
//! outer loop
//! vertex v1x v1y v1z
//! vertex v2x v2y v2z
//! vertex v3x v3y v3z
//! endloop
//! endfacet
//! ...
//! endsolid name
//! ```
//!
//! The reader expects exactly this shape: one header line, then seven lines
//! per facet. Indentation and blank lines are ignored, and reading stops at
//! an `endsolid` line where a facet would begin. The header is not decoded,
//! so its solid name may be in any encoding. Binary STL is not supported.
//!
//! Facet normals in the input are parsed but never trusted. A normal line
//! that does not hold three numbers is skipped, while a bad vertex line is an
//! error. The writer always recomputes normals from the vertex positions.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::error::{MeshError, Result};
use crate::mesh::{triangle_normal, weld_with_options, Mesh, MeshIndex, VertexId, WeldOptions};
use crate::pipeline::Stage;

/// Solid name written in the header and trailer of every output file.
pub const SOLID_NAME: &str = "topology";

/// Number of lines occupied by one facet.
const FACET_LINES: usize = 7;

/// Per-triangle data as stored in an STL file, before welding.
///
/// `p1[i]`, `p2[i]` and `p3[i]` are the corners of triangle `i`. `normals`
/// holds the facet normals that parsed successfully, in file order; it is
/// shorter than the corner lists when some normal lines were malformed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTriangles {
    /// Facet normals as written in the file.
    pub normals: Vec<Vector3<f64>>,
    /// First corner of each triangle.
    pub p1: Vec<Point3<f64>>,
    /// Second corner of each triangle.
    pub p2: Vec<Point3<f64>>,
    /// Third corner of each triangle.
    pub p3: Vec<Point3<f64>>,
}

impl RawTriangles {
    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.p1.len()
    }

    /// Whether there are no triangles.
    pub fn is_empty(&self) -> bool {
        self.p1.is_empty()
    }

    /// Weld the corners into a shared-vertex mesh.
    pub fn weld<I: MeshIndex>(&self, options: &WeldOptions) -> Result<Mesh<I>> {
        weld_with_options(&self.p1, &self.p2, &self.p3, options)
    }
}

/// Options for writing STL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Scale facet normals to unit length. Off by default: normals are
    /// written as the raw cross product of two triangle edges.
    pub normalize_normals: bool,
}

impl WriteOptions {
    /// Create options that write unit-length normals.
    pub fn normalized(mut self) -> Self {
        self.normalize_normals = true;
        self
    }
}

/// Read ASCII STL triangles from a buffered reader.
///
/// # Errors
///
/// Returns [`MeshError::Parse`] for a vertex line that is not `vertex x y z`,
/// [`MeshError::TriangleCountMismatch`] when the input ends partway through a
/// facet, and [`MeshError::Stream`] if the reader fails.
///
/// # Example
///
/// ```
/// use stlsmooth::io::stl;
///
/// let text = "solid demo
/// facet normal 0 0 1
/// outer loop
/// vertex 0 0 0
/// vertex 1 0 0
/// vertex 0 1 0
/// endloop
/// endfacet
/// endsolid demo
/// ";
/// let raw = stl::read(text.as_bytes()).unwrap();
/// assert_eq!(raw.len(), 1);
/// ```
pub fn read<R: BufRead>(mut reader: R) -> Result<RawTriangles> {
    let mut raw = RawTriangles::default();
    let mut facets = 0usize;
    let mut body_line = 0usize;
    let mut line_no = 0usize;
    let mut buf = Vec::new();

    // Lines are handled as bytes: only vertex lines must be valid UTF-8.
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        // Header, discarded without decoding
        if line_no == 1 {
            continue;
        }

        let trimmed = buf.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        match body_line % FACET_LINES {
            0 => {
                if first_word_is(trimmed, b"endsolid") {
                    break;
                }
                facets += 1;
                match parse_normal(trimmed) {
                    Some(normal) => raw.normals.push(normal),
                    None => debug!(
                        "line {}: skipping malformed facet normal {:?}",
                        line_no,
                        String::from_utf8_lossy(trimmed)
                    ),
                }
            }
            2 => raw.p1.push(parse_vertex(trimmed, line_no)?),
            3 => raw.p2.push(parse_vertex(trimmed, line_no)?),
            4 => raw.p3.push(parse_vertex(trimmed, line_no)?),
            _ => {}
        }
        body_line += 1;
    }

    if raw.p1.len() != facets || raw.p2.len() != facets || raw.p3.len() != facets {
        return Err(MeshError::TriangleCountMismatch {
            expected: facets,
            p1: raw.p1.len(),
            p2: raw.p2.len(),
            p3: raw.p3.len(),
        });
    }

    debug!(
        "Read {} facets ({} normals skipped)",
        facets,
        facets - raw.normals.len()
    );
    Ok(raw)
}

/// Load ASCII STL triangles from a file.
///
/// Errors carry the path and the [`Stage::Read`] stage.
///
/// # Example
///
/// ```no_run
/// use stlsmooth::io::stl;
///
/// let raw = stl::load("beam.stl").unwrap();
/// println!("{} triangles", raw.len());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<RawTriangles> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MeshError::io(path, Stage::Read, e))?;
    read(BufReader::new(file)).map_err(|e| e.in_file(path, Stage::Read))
}

/// Write triangles as ASCII STL.
///
/// Each facet's normal is `(p2 - p1) x (p3 - p1)` computed from the given
/// positions, normalized only if `options` asks for it. Coordinates are
/// written in Rust's shortest round-trip decimal form, so reading the output
/// back recovers the exact values.
///
/// # Errors
///
/// Returns [`MeshError::InvalidVertexIndex`] if a triangle references a
/// vertex outside `vertices`, and [`MeshError::Stream`] if the writer fails.
pub fn write<W: Write, I: MeshIndex>(
    mut writer: W,
    vertices: &[Point3<f64>],
    triangles: &[[VertexId<I>; 3]],
    options: &WriteOptions,
) -> Result<()> {
    writeln!(writer, "solid {}", SOLID_NAME)?;

    for (face, tri) in triangles.iter().enumerate() {
        let mut corners = [Point3::origin(); 3];
        for (corner, v) in corners.iter_mut().zip(tri) {
            *corner = *vertices
                .get(v.index())
                .ok_or(MeshError::InvalidVertexIndex {
                    face,
                    vertex: v.index(),
                })?;
        }
        let [p1, p2, p3] = corners;

        let mut normal = triangle_normal(&p1, &p2, &p3);
        if options.normalize_normals {
            normal = normal.try_normalize(0.0).unwrap_or(normal);
        }

        writeln!(writer, "facet normal {} {} {}", normal.x, normal.y, normal.z)?;
        writeln!(writer, "outer loop")?;
        for p in &corners {
            writeln!(writer, "vertex {} {} {}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "endloop")?;
        writeln!(writer, "endfacet")?;
    }

    writeln!(writer, "endsolid {}", SOLID_NAME)?;
    writer.flush()?;
    Ok(())
}

/// Save a mesh to an ASCII STL file.
///
/// Errors carry the path and the [`Stage::Write`] stage.
///
/// # Example
///
/// ```no_run
/// use stlsmooth::io::stl::{self, WriteOptions};
/// use stlsmooth::mesh::Mesh;
///
/// let raw = stl::load("beam.stl").unwrap();
/// let mesh: Mesh = raw.weld(&Default::default()).unwrap();
/// stl::save(&mesh, "beam_copy.stl", &WriteOptions::default()).unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(
    mesh: &Mesh<I>,
    path: P,
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| MeshError::io(path, Stage::Write, e))?;
    write(BufWriter::new(file), mesh.vertices(), mesh.triangles(), options)
        .map_err(|e| e.in_file(path, Stage::Write))
}

fn first_word_is(line: &[u8], keyword: &[u8]) -> bool {
    line.split(|b| b.is_ascii_whitespace())
        .next()
        .is_some_and(|word| word.eq_ignore_ascii_case(keyword))
}

/// Parse exactly three floats from an iterator of fields.
fn parse_xyz<'a>(mut fields: impl Iterator<Item = &'a str>) -> Option<[f64; 3]> {
    let x = fields.next()?.parse().ok()?;
    let y = fields.next()?.parse().ok()?;
    let z = fields.next()?.parse().ok()?;
    match fields.next() {
        Some(_) => None,
        None => Some([x, y, z]),
    }
}

fn parse_normal(line: &[u8]) -> Option<Vector3<f64>> {
    let mut fields = std::str::from_utf8(line).ok()?.split_whitespace();
    let facet = fields.next()?;
    let normal = fields.next()?;
    if !facet.eq_ignore_ascii_case("facet") || !normal.eq_ignore_ascii_case("normal") {
        return None;
    }
    parse_xyz(fields).map(Vector3::from)
}

fn parse_vertex(line: &[u8], line_no: usize) -> Result<Point3<f64>> {
    let coords = std::str::from_utf8(line).ok().and_then(|text| {
        let mut fields = text.split_whitespace();
        match fields.next() {
            Some(word) if word.eq_ignore_ascii_case("vertex") => parse_xyz(fields),
            _ => None,
        }
    });
    coords.map(Point3::from).ok_or_else(|| MeshError::Parse {
        line: line_no,
        message: format!(
            "expected `vertex x y z`, found {:?}",
            String::from_utf8_lossy(line)
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;

    const SQUARE: &str = "\
solid square
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 0 0
vertex 1 1 0
endloop
endfacet
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 1 0
vertex 0 1 0
endloop
endfacet
endsolid square
";

    fn create_test_triangle() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ];
        Mesh::from_triangles(vertices, &[[0, 1, 2]]).unwrap()
    }

    #[test]
    fn test_read_square() {
        let raw = read(SQUARE.as_bytes()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.normals, vec![Vector3::z(), Vector3::z()]);
        assert_eq!(raw.p1[1], Point3::origin());
        assert_eq!(raw.p2[1], Point3::new(1.0, 1.0, 0.0));
        assert_eq!(raw.p3[1], Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_triangle_count_is_body_lines_over_seven() {
        let body_lines = SQUARE.lines().skip(1).filter(|l| !l.starts_with("endsolid")).count();
        let raw = read(SQUARE.as_bytes()).unwrap();
        assert_eq!(raw.len(), body_lines / 7);
    }

    #[test]
    fn test_read_indented_scientific() {
        let text = "solid s\n  facet normal 0.0e0 0.0e0 1.0e0\n    outer loop\n      \
                    vertex 1.5e-3 -2E2 0\n      vertex 1 0 0\n      vertex 0 1 0\n    endloop\n  endfacet\n";
        let raw = read(text.as_bytes()).unwrap();
        assert_eq!(raw.p1[0], Point3::new(1.5e-3, -200.0, 0.0));
    }

    #[test]
    fn test_malformed_normal_is_skipped() {
        let text = SQUARE.replacen("facet normal 0 0 1", "facet normal nan? 0 x", 1);
        let raw = read(text.as_bytes()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.normals.len(), 1);
    }

    #[test]
    fn test_malformed_vertex_fails_with_line() {
        let text = SQUARE.replacen("vertex 1 1 0", "vertex 1 one 0", 1);
        let err = read(text.as_bytes()).unwrap_err();
        match err {
            MeshError::Parse { line, message } => {
                assert_eq!(line, 6);
                assert!(message.contains("1 one 0"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_vertex_with_extra_field_fails() {
        let text = SQUARE.replacen("vertex 1 0 0", "vertex 1 0 0 7", 1);
        assert!(matches!(
            read(text.as_bytes()),
            Err(MeshError::Parse { line: 5, .. })
        ));
    }

    /// One facet whose header and first normal line are given as raw bytes.
    fn single_facet_bytes(header: &[u8], normal: &[u8], first_vertex: &[u8]) -> Vec<u8> {
        let lines: [&[u8]; 8] = [
            header,
            normal,
            b"outer loop",
            first_vertex,
            b"vertex 1 0 0",
            b"vertex 0 1 0",
            b"endloop",
            b"endfacet",
        ];
        let mut bytes = Vec::new();
        for line in lines {
            bytes.extend_from_slice(line);
            bytes.push(b'\n');
        }
        bytes
    }

    #[test]
    fn test_latin1_header_is_ignored() {
        let mut bytes = single_facet_bytes(b"solid Teil\xe9", b"facet normal 0 0 1", b"vertex 0 0 0");
        bytes.extend_from_slice(b"endsolid Teil\xe9\n");

        let raw = read(bytes.as_slice()).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw.normals, vec![Vector3::z()]);
        assert_eq!(raw.p3[0], Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_non_utf8_normal_is_skipped() {
        let bytes = single_facet_bytes(b"solid part", b"facet normal 0 \xff 1", b"vertex 0 0 0");
        let raw = read(bytes.as_slice()).unwrap();
        assert_eq!(raw.len(), 1);
        assert!(raw.normals.is_empty());
        assert_eq!(raw.p1[0], Point3::origin());
    }

    #[test]
    fn test_non_utf8_vertex_is_parse_error() {
        let bytes = single_facet_bytes(b"solid part", b"facet normal 0 0 1", b"vertex 0 \xff 0");
        match read(bytes.as_slice()).unwrap_err() {
            MeshError::Parse { line, .. } => assert_eq!(line, 4),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = SQUARE.replace('\n', "\r\n");
        let raw = read(text.as_bytes()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.p2[0], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_truncated_facet_fails() {
        let text: String = SQUARE.lines().take(12).map(|l| format!("{}\n", l)).collect();
        let err = read(text.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            MeshError::TriangleCountMismatch { expected: 2, p1: 2, p2: 2, p3: 1 }
        ));
    }

    #[test]
    fn test_header_only_is_empty() {
        let raw = read("solid empty\nendsolid empty\n".as_bytes()).unwrap();
        assert!(raw.is_empty());
        let raw = read("".as_bytes()).unwrap();
        assert!(raw.is_empty());
    }

    #[test]
    fn test_write_exact_text() {
        let mesh = create_test_triangle();
        let mut out = Vec::new();
        write(&mut out, mesh.vertices(), mesh.triangles(), &WriteOptions::default()).unwrap();

        let expected = "\
solid topology
facet normal 0 0 6
outer loop
vertex 0 0 0
vertex 2 0 0
vertex 0 3 0
endloop
endfacet
endsolid topology
";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_write_normalized_normals() {
        let mesh = create_test_triangle();
        let mut out = Vec::new();
        let options = WriteOptions::default().normalized();
        write(&mut out, mesh.vertices(), mesh.triangles(), &options).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("facet normal 0 0 1\n"));
    }

    #[test]
    fn test_write_rejects_bad_index() {
        let vertices = vec![Point3::origin(); 2];
        let triangles: Vec<[VertexId; 3]> = vec![[VertexId::new(0), VertexId::new(1), VertexId::new(5)]];
        let err = write(Vec::new(), &vertices, &triangles, &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, MeshError::InvalidVertexIndex { face: 0, vertex: 5 }));
    }

    #[test]
    fn test_roundtrip_exact_values() {
        let vertices = vec![
            Point3::new(0.1, 0.2, 0.3),
            Point3::new(1.0 / 3.0, -2.0e-9, 12345.678901234),
            Point3::new(-7.25, 1e20, 5e-324),
        ];
        let mesh: Mesh = Mesh::from_triangles(vertices.clone(), &[[0, 1, 2]]).unwrap();
        let mut out = Vec::new();
        write(&mut out, mesh.vertices(), mesh.triangles(), &WriteOptions::default()).unwrap();

        let raw = read(out.as_slice()).unwrap();
        assert_eq!(raw.p1, vec![vertices[0]]);
        assert_eq!(raw.p2, vec![vertices[1]]);
        assert_eq!(raw.p3, vec![vertices[2]]);
        assert_eq!(raw.normals, vec![mesh.face_normal(FaceId::new(0))]);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let err = load("nonexistent_file_12345.stl").unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Read));
        assert!(err.to_string().contains("nonexistent_file_12345.stl"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triangle.stl");
        save(&create_test_triangle(), &path, &WriteOptions::default()).unwrap();

        let raw = load(&path).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw.p2[0], Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.stl");
        let err = save(&create_test_triangle(), &path, &WriteOptions::default()).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Write));
        assert!(matches!(err, MeshError::Io { .. }));
    }
}
