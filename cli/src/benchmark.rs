//! Timed triangulation runs over a polygon file.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use crate::serialization::{load_poly_file, PolyFileError};
use seidel::{
    TrapezoidationInfo, TriangulateOutput, TriangulationError, TriangulationInfo, Triangulator,
};

#[derive(Clone, Debug, Default)]
pub struct Statistics {
    pub num_outlines: usize,
    pub num_points: usize,
    pub total_time_ms: f64,
    pub average_time_ms: f64,
}

#[derive(Debug)]
pub enum BenchmarkError {
    Load(PolyFileError),
    NotSimplePolygon,
    Triangulation(TriangulationError),
}

impl fmt::Display for BenchmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkError::Load(e) => write!(f, "Failed to load polygon file: {}", e),
            BenchmarkError::NotSimplePolygon => write!(f, "Not a simple polygon"),
            BenchmarkError::Triangulation(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BenchmarkError {}

pub struct Benchmark {
    triangulator: Triangulator,
}

impl Benchmark {
    /// Loads and validates the polygon; a non-simple input fails here so
    /// the timed runs measure only successful triangulations.
    pub fn load_polygon(path: &Path) -> Result<Self, BenchmarkError> {
        let outlines = load_poly_file(path).map_err(BenchmarkError::Load)?;
        let triangulator = Triangulator::new(&outlines);

        if !triangulator.is_simple_polygon() {
            return Err(BenchmarkError::NotSimplePolygon);
        }

        log::info!(
            "loaded {} outlines with {} points",
            triangulator.outline_windings().len(),
            triangulator.positions().len()
        );

        Ok(Benchmark { triangulator })
    }

    pub fn triangulator(&self) -> &Triangulator {
        &self.triangulator
    }

    /// Runs build + triangulate `iterations` times and reports wall-clock
    /// statistics, along with the output of the last iteration.
    pub fn run(
        &mut self,
        iterations: u32,
    ) -> Result<(Statistics, TriangulateOutput), BenchmarkError> {
        let mut statistics = Statistics {
            num_outlines: self.triangulator.outline_windings().len(),
            num_points: self.triangulator.positions().len(),
            total_time_ms: 0.0,
            average_time_ms: 0.0,
        };

        let mut trap_info = TrapezoidationInfo::default();
        let mut tri_info = TriangulationInfo::default();
        let mut output = TriangulateOutput::new();

        if iterations == 0 {
            return Ok((statistics, output));
        }

        let start = Instant::now();

        for _ in 0..iterations {
            let iteration_start = Instant::now();

            self.triangulator
                .build_trapezoid_tree(&mut trap_info)
                .map_err(BenchmarkError::Triangulation)?;
            self.triangulator
                .triangulate(&mut tri_info, &mut output)
                .map_err(BenchmarkError::Triangulation)?;

            statistics.average_time_ms +=
                iteration_start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;
        }

        statistics.total_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        Ok((statistics, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn benchmark_run() {
        let mut path = std::env::temp_dir();
        path.push(format!("seidel_bench_test_{}.poly", std::process::id()));
        fs::write(&path, "0 0\n3 0\n3 3\n0 3\n").unwrap();

        let mut bench = Benchmark::load_polygon(&path).unwrap();
        let (stats, output) = bench.run(3).unwrap();

        assert_eq!(stats.num_outlines, 1);
        assert_eq!(stats.num_points, 4);
        assert!(stats.total_time_ms >= 0.0);
        assert_eq!(output.triangle_count(), 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn benchmark_rejects_bow_tie() {
        let mut path = std::env::temp_dir();
        path.push(format!("seidel_bench_bowtie_{}.poly", std::process::id()));
        fs::write(&path, "0 0\n2 2\n2 0\n0 2\n").unwrap();

        match Benchmark::load_polygon(&path) {
            Err(BenchmarkError::NotSimplePolygon) => {}
            other => panic!("expected a rejection, got {:?}", other.is_ok()),
        }

        fs::remove_file(&path).unwrap();
    }
}
