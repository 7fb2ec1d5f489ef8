use clap::Parser;
use mandeltile_cache::{CacheConfig, SplitMode, TileCache};
use mandeltile_core::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "build-cache")]
#[command(about = "Render a Mandelbrot tile tree to disk")]
struct Args {
    /// Levels to build below the root tile
    #[arg(short, long, default_value_t = 2)]
    depth: usize,

    /// JSON cache configuration; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the tile files
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Partitions per axis at every level
    #[arg(short, long)]
    fanout: Option<u32>,

    /// Root tile samples along the real axis
    #[arg(long)]
    samples_x: Option<u32>,

    /// Root tile samples along the imaginary axis
    #[arg(long)]
    samples_y: Option<u32>,

    #[arg(long)]
    max_iterations: Option<u32>,

    /// Resample each level so children keep the parent's resolution
    #[arg(long)]
    refine: bool,

    /// Delete existing tiles before building
    #[arg(long)]
    force: bool,
}

impl Args {
    fn cache_config(&self) -> Result<CacheConfig> {
        let mut config = match &self.config {
            Some(path) => CacheConfig::from_json_file(path)?,
            None => CacheConfig::default(),
        };
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(fanout) = self.fanout {
            config.fanout = fanout;
        }
        if let Some(x) = self.samples_x {
            config.samples.x = x;
        }
        if let Some(y) = self.samples_y {
            config.samples.y = y;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        if self.refine {
            config.split = SplitMode::Refine;
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.cache_config()?;
    let window = config.root_window;
    let fanout = config.fanout;
    let cache = TileCache::open(config)?;

    if args.force {
        cache.store().clear()?;
    }

    let started = Instant::now();
    let report = cache.build_to_depth(&window, args.depth, fanout)?;
    log::info!(
        "{} tiles in {} ({} generated, {} reused) after {:.2?}",
        report.total(),
        cache.store().dir().display(),
        report.generated,
        report.reused,
        started.elapsed()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(&Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
