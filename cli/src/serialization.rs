//! Readers and writers for the plain-text polygon and triangle formats.
//!
//! A `.poly` file holds one `x y` pair per line, outlines separated by a
//! single `*` line; the trailing separator is optional and empty outlines
//! are skipped. `.tind` files hold one `i j k` index triple per line,
//! `.tpts` files one `[x1 y1] [x2 y2] [x3 y3]` triangle per line.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use seidel::math::{point, Point};
use seidel::{Outline, PointId};

#[derive(Debug)]
pub enum PolyFileError {
    Io(io::Error),
    /// A line that is neither a separator nor two parseable coordinates.
    MalformedLine { line: usize },
}

impl fmt::Display for PolyFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolyFileError::Io(e) => write!(f, "{}", e),
            PolyFileError::MalformedLine { line } => {
                write!(f, "Malformed polygon data at line {}", line)
            }
        }
    }
}

impl std::error::Error for PolyFileError {}

impl From<io::Error> for PolyFileError {
    fn from(value: io::Error) -> Self {
        PolyFileError::Io(value)
    }
}

pub fn load_poly_file(path: &Path) -> Result<Vec<Outline>, PolyFileError> {
    let reader = BufReader::new(File::open(path)?);

    let mut outlines = Vec::new();
    let mut points: Outline = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed == "*" {
            if !points.is_empty() {
                outlines.push(std::mem::replace(&mut points, Vec::new()));
            }
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }

        let malformed = PolyFileError::MalformedLine { line: index + 1 };
        let mut parts = trimmed.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(x), Some(y), None) => {
                let x: f32 = x.parse().map_err(|_| malformed)?;
                let y: f32 = y.parse().map_err(|_| PolyFileError::MalformedLine {
                    line: index + 1,
                })?;
                points.push(point(x, y));
            }
            _ => return Err(malformed),
        }
    }

    if !points.is_empty() {
        outlines.push(points);
    }

    Ok(outlines)
}

pub fn save_poly_file(path: &Path, outlines: &[Outline]) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);

    for (i, outline) in outlines.iter().enumerate() {
        if i > 0 {
            writeln!(file, "*")?;
        }
        for pt in outline {
            writeln!(file, "{} {}", pt.x, pt.y)?;
        }
    }

    file.flush()
}

pub fn save_triangle_indices(path: &Path, triangles: &[PointId]) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);

    for tri in triangles.chunks(3) {
        writeln!(file, "{} {} {}", tri[0].0, tri[1].0, tri[2].0)?;
    }

    file.flush()
}

pub fn save_triangle_points(
    path: &Path,
    triangles: &[PointId],
    positions: &[Point],
) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);

    for tri in triangles.chunks(3) {
        let a = positions[tri[0].to_usize()];
        let b = positions[tri[1].to_usize()];
        let c = positions[tri[2].to_usize()];
        writeln!(
            file,
            "[{} {}] [{} {}] [{} {}]",
            a.x, a.y, b.x, b.y, c.x, c.y
        )?;
    }

    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("seidel_cli_test_{}_{}", std::process::id(), name));
        path
    }

    #[test]
    fn load_two_outlines() {
        let path = temp_path("load.poly");
        fs::write(&path, "0 0\n4 0\n4 4\n0 4\n*\n1 1\n1 3\n3 3\n3 1\n").unwrap();

        let outlines = load_poly_file(&path).unwrap();
        assert_eq!(outlines.len(), 2);
        assert_eq!(outlines[0].len(), 4);
        assert_eq!(outlines[1].len(), 4);
        assert_eq!(outlines[0][1], point(4.0, 0.0));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn trailing_separator_and_blank_lines() {
        let path = temp_path("trailing.poly");
        fs::write(&path, "0 0\n1 0\n0 1\n*\n\n*\n").unwrap();

        let outlines = load_poly_file(&path).unwrap();
        assert_eq!(outlines.len(), 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn malformed_number_is_an_error() {
        let path = temp_path("bad.poly");
        fs::write(&path, "0 0\n1 zero\n0 1\n").unwrap();

        match load_poly_file(&path) {
            Err(PolyFileError::MalformedLine { line }) => assert_eq!(line, 2),
            other => panic!("expected a malformed line error, got {:?}", other),
        }

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        match load_poly_file(Path::new("/nonexistent/nowhere.poly")) {
            Err(PolyFileError::Io(_)) => {}
            other => panic!("expected an io error, got {:?}", other),
        }
    }

    #[test]
    fn poly_round_trip() {
        let path = temp_path("roundtrip.poly");
        let outlines = vec![
            vec![point(0.0, 0.0), point(2.5, 0.0), point(0.0, 1.5)],
            vec![point(5.0, 5.0), point(6.0, 5.0), point(5.0, 6.0)],
        ];

        save_poly_file(&path, &outlines).unwrap();
        let loaded = load_poly_file(&path).unwrap();
        assert_eq!(loaded, outlines);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn triangle_files() {
        let ind_path = temp_path("out.tind");
        let pts_path = temp_path("out.tpts");

        let triangles = vec![PointId(0), PointId(1), PointId(2)];
        let positions = vec![point(0.0, 0.0), point(1.0, 0.0), point(0.0, 1.0)];

        save_triangle_indices(&ind_path, &triangles).unwrap();
        assert_eq!(fs::read_to_string(&ind_path).unwrap(), "0 1 2\n");

        save_triangle_points(&pts_path, &triangles, &positions).unwrap();
        assert_eq!(
            fs::read_to_string(&pts_path).unwrap(),
            "[0 0] [1 0] [0 1]\n"
        );

        fs::remove_file(&ind_path).unwrap();
        fs::remove_file(&pts_path).unwrap();
    }
}
