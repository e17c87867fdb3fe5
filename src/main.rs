use anyhow::Result;
use biomorph_core::{init_logging, SimConfig};
use biomorph_lib::app::App;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of global steps to run
    #[arg(short, long, default_value_t = 1000)]
    steps: u64,

    /// RNG seed, overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Resume from a save file (`.rkyv` or gzip JSON)
    #[arg(long)]
    load: Option<PathBuf>,

    /// Save the planet here when the run ends
    #[arg(long)]
    save: Option<PathBuf>,

    /// Directory for the lifecycle event log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Tick regions in parallel
    #[arg(long)]
    parallel: bool,

    /// Census interval in steps, overrides the config file
    #[arg(long)]
    report_every: Option<u64>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = SimConfig::load(&args.config)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(every) = args.report_every {
        config.log_interval = every;
    }

    let app = match &args.load {
        Some(path) => App::load(config, path)?,
        None => App::new(config)?,
    };
    let mut app = app.with_parallel(args.parallel);
    if let Some(dir) = &args.log_dir {
        app = app.with_history(dir)?;
    }

    tracing::info!(
        run_id = %app.planet.run_id(),
        steps = args.steps,
        parallel = args.parallel,
        population = app.planet.population(),
        "Starting run"
    );
    app.run(args.steps)?;

    for report in app.census_report() {
        println!("{report}");
    }
    let metrics = app.planet.metrics();
    println!(
        "tick {}  births {}  deaths {}  migrations {}  {:.1} steps/s",
        app.planet.global_tick(),
        metrics.births(),
        metrics.deaths(),
        metrics.migrations(),
        metrics.steps_per_second()
    );

    if let Some(path) = &args.save {
        app.save(path)?;
    }
    Ok(())
}
