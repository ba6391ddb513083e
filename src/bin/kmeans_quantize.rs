use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use kmeans_quantize::config::{DEFAULT_CLUSTERS, DEFAULT_MAX_ROUNDS};
use kmeans_quantize::{QuantizeConfig, quantize_file};
use tracing_subscriber::{EnvFilter, fmt};

/// Reduce an image to at most K colors with k-means clustering.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input image path
    input: PathBuf,

    /// Output image path (format follows the extension, e.g. .png)
    output: PathBuf,

    /// Number of colors to keep
    #[arg(default_value_t = DEFAULT_CLUSTERS as i64, allow_negative_numbers = true)]
    k: i64,

    /// Seed for centroid initialization (time-based when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Worker threads (defaults to one per core)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Upper bound on k-means rounds
    #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
    max_rounds: usize,

    /// Print a JSON summary (palette, rounds, seed) to stdout
    #[arg(long)]
    json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if args.k < 1 {
        bail!("k must be at least 1");
    }
    let k = usize::try_from(args.k).context("k is too large for this platform")?;

    let mut config = QuantizeConfig::new(k).with_max_rounds(args.max_rounds);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(threads) = args.threads {
        config = config.with_threads(threads);
    }

    if !args.json {
        println!(
            "Converting {} => {}",
            args.input.display(),
            args.output.display()
        );
    }

    let quantization = quantize_file(&args.input, &args.output, &config).with_context(|| {
        format!(
            "failed to quantize {} into {}",
            args.input.display(),
            args.output.display()
        )
    })?;

    if args.json {
        let summary = serde_json::json!({
            "input": args.input.display().to_string(),
            "output": args.output.display().to_string(),
            "k": k,
            "seed": quantization.seed,
            "rounds": quantization.report.round_count(),
            "converged": quantization.report.converged,
            "palette": quantization.palette_hex(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Saved → {} ({} colors, {} rounds)",
            args.output.display(),
            quantization.distinct_colors(),
            quantization.report.round_count()
        );
    }

    Ok(())
}
