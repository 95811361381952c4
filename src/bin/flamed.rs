// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate flamed;
extern crate num_cpus;
extern crate rand;
extern crate tracing;
extern crate tracing_subscriber;

use clap::{App, Arg, ArgMatches};
use flamed::{generate_parallel, FlameError, FlameMaps, IfsPoint};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const INPUT: &str = "input";
const SAVE: &str = "save";
const OUTPUT: &str = "output";
const POINTS: &str = "points";
const THREADS: &str = "threads";
const SEED: &str = "seed";

const MAX_POINTS: usize = 50_000_000;

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("flamed")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Fractal flame point generator")
        .arg(
            Arg::with_name(INPUT)
                .required(false)
                .long(INPUT)
                .short("i")
                .takes_value(true)
                .help("FlamEd V1 file to load (built-in flame when omitted)"),
        )
        .arg(
            Arg::with_name(SAVE)
                .required(false)
                .long(SAVE)
                .short("w")
                .takes_value(true)
                .help("Write the flame to this file in FlamEd V1 format"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .required(false)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Write the point cloud here, one \"x y r g b\" line per point"),
        )
        .arg(
            Arg::with_name(POINTS)
                .required(false)
                .long(POINTS)
                .short("n")
                .takes_value(true)
                .default_value("100000")
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        MAX_POINTS,
                        "Could not parse point count",
                        &format!("Point count must be between 0 and {}", MAX_POINTS),
                    )
                })
                .help("Number of points to generate"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in the generator"),
        )
        .arg(
            Arg::with_name(SEED)
                .required(false)
                .long(SEED)
                .short("s")
                .takes_value(true)
                .validator(|s| {
                    u64::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse seed".to_string())
                })
                .help("Seed for reproducible point clouds"),
        )
        .get_matches()
}

fn write_points(outfile: &str, points: &[IfsPoint]) -> Result<(), FlameError> {
    let mut out = BufWriter::new(File::create(outfile)?);
    for p in points {
        writeln!(
            out,
            "{} {} {} {} {}",
            p.position.x, p.position.y, p.color.r, p.color.g, p.color.b
        )?;
    }
    out.flush()?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), FlameError> {
    let flame = match matches.value_of(INPUT) {
        Some(path) => FlameMaps::open(path)?,
        None => FlameMaps::default(),
    };
    info!(maps = flame.len(), "flame ready");

    if let Some(path) = matches.value_of(SAVE) {
        flame.save_to(path)?;
        info!(path, "flame saved");
    }

    // Validators have already vetted these.
    let points = matches
        .value_of(POINTS)
        .and_then(|s| usize::from_str(s).ok())
        .unwrap_or(0);
    let threads = matches
        .value_of(THREADS)
        .and_then(|s| usize::from_str(s).ok())
        .unwrap_or(1);
    let seed = matches
        .value_of(SEED)
        .and_then(|s| u64::from_str(s).ok())
        .unwrap_or_else(rand::random);

    let cloud = generate_parallel(&flame, points, threads, seed)?;
    info!(points = cloud.len(), threads, seed, "point cloud generated");

    if let Some(path) = matches.value_of(OUTPUT) {
        write_points(path, &cloud)?;
    }
    println!("{} maps, {} points", flame.len(), cloud.len());
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flamed=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("flamed: {}", e);
        std::process::exit(1);
    }
}
