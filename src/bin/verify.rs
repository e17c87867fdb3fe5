use anyhow::Result;
use biomorph_core::{init_logging, SimConfig};
use biomorph_lib::app::App;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Loads a save file and checks it for invariant violations.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Save file to check (`.rkyv` or gzip JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Config file the save was produced with
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

fn main() -> Result<ExitCode> {
    init_logging();
    let args = Args::parse();

    println!("Verifying {}...", args.input.display());
    let config = SimConfig::load(&args.config)?;
    let mut app = App::load(config, &args.input)?;

    println!(
        "run {}  tick {}  population {}  migrations {}",
        app.planet.run_id(),
        app.planet.global_tick(),
        app.planet.population(),
        app.planet.total_migrations()
    );
    // Census develops every genotype, so it only runs on a consistent planet.
    let problems = app.planet.check_invariants();
    if !problems.is_empty() {
        println!("\nFAILED: {} violation(s)", problems.len());
        for problem in &problems {
            println!("  - {problem}");
        }
        return Ok(ExitCode::FAILURE);
    }

    for report in app.census_report() {
        println!("{report}");
    }
    println!("\nOK: no invariant violations.");
    Ok(ExitCode::SUCCESS)
}
