#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use kmeans_compress::{compressed_path, CompressPipeline, PixelBuffer, DEFAULT_MAX_ITERATIONS};
use log::{error, info};

/// Compress an image by reducing its colors with k-means clustering.
#[derive(Parser)]
pub struct Options {
    /// The number of colors in the compressed image.
    #[arg(short, default_value_t = CompressPipeline::DEFAULT_K)]
    k: u32,

    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: u32,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// The number of threads to use, or 0 to use all available threads.
    #[arg(short, long, default_value_t = 0)]
    threads: u8,

    #[arg(long)]
    verbose: bool,

    input: PathBuf,

    /// Defaults to `<input stem>_compressed.<input extension>`.
    output: Option<PathBuf>,
}

fn run(options: Options) -> kmeans_compress::Result<()> {
    let Options {
        k,
        max_iterations,
        seed,
        threads,
        verbose,
        input,
        output,
    } = options;

    macro_rules! time {
        ($name: literal, $val: expr) => {
            if verbose {
                let time = std::time::Instant::now();
                let value = $val;
                info!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    let image = time!("read image", PixelBuffer::open(&input)?);

    let mut pipeline = CompressPipeline::new(&image);
    pipeline.k(k).max_iterations(max_iterations).seed(seed);

    let compressed = time!(
        "compression",
        match threads {
            0 => pipeline.compress_par(),
            1 => pipeline.compress(),
            t => match rayon::ThreadPoolBuilder::new().num_threads(t.into()).build() {
                Ok(pool) => pool.install(|| pipeline.compress_par()),
                Err(e) => {
                    error!("failed to build thread pool, running on the global pool: {e}");
                    pipeline.compress_par()
                }
            },
        }
    )?;

    let output = output.unwrap_or_else(|| compressed_path(&input));
    time!("write image", compressed.image.save(&output)?);

    println!("Compression completed!");
    println!("{}", compressed.report);
    println!("Output saved to: {}", output.display());

    Ok(())
}

fn main() -> ExitCode {
    let options = Options::parse();

    let level = if options.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
