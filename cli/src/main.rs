mod benchmark;
mod serialization;

use std::error::Error;
use std::path::Path;
use std::process;

use clap::{Arg, Command};

use benchmark::Benchmark;

fn main() {
    env_logger::init();

    let matches = Command::new("Seidel triangulation command-line interface")
        .version("0.1")
        .about("Polygon triangulator benchmark")
        .arg(
            Arg::new("BENCHMARK")
                .short('b')
                .long("benchmark")
                .help("Runs the triangulation benchmark on a polygon file")
                .value_name("POLYFILE")
                .takes_value(true),
        )
        .arg(
            Arg::new("ITERATIONS")
                .help("Number of benchmark iterations")
                .takes_value(true),
        )
        .arg(
            Arg::new("INDICES_OUTPUT")
                .short('o')
                .long("indices")
                .help("Writes the triangle indices of the last iteration to a file")
                .value_name("FILE")
                .takes_value(true),
        )
        .arg(
            Arg::new("POINTS_OUTPUT")
                .short('p')
                .long("points")
                .help("Writes the triangle points of the last iteration to a file")
                .value_name("FILE")
                .takes_value(true),
        )
        .get_matches();

    if let Some(poly_file) = matches.value_of("BENCHMARK") {
        let iterations = match matches.value_of("ITERATIONS").map(str::parse::<u32>) {
            Some(Ok(iterations)) => iterations,
            _ => {
                println!("Wrong \"number of iterations\" parameter.");
                process::exit(-1);
            }
        };

        let result = run_benchmark(
            Path::new(poly_file),
            iterations,
            matches.value_of("INDICES_OUTPUT"),
            matches.value_of("POINTS_OUTPUT"),
        );

        if let Err(err) = result {
            println!("Error: {}", err);
            process::exit(-1);
        }
    } else {
        println!("The interactive editor is not part of this build.");
        println!("To run a benchmark: seidel -b <polygon file> <number of iterations>");
    }
}

fn run_benchmark(
    poly_file: &Path,
    iterations: u32,
    indices_output: Option<&str>,
    points_output: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let mut bench = Benchmark::load_polygon(poly_file)?;
    let (stats, output) = bench.run(iterations)?;

    println!("Finished in {} ms", stats.total_time_ms);
    println!("Number of outlines: {}", stats.num_outlines);
    println!("Total number of points: {}", stats.num_points);
    println!("Average algorithm time: {} ms", stats.average_time_ms);

    if let Some(file) = indices_output {
        serialization::save_triangle_indices(Path::new(file), &output.triangles)?;
    }

    if let Some(file) = points_output {
        serialization::save_triangle_points(
            Path::new(file),
            &output.triangles,
            bench.triangulator().positions(),
        )?;
    }

    Ok(())
}
