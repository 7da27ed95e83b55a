use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use workload_viz::Result;
use workload_viz::view::{self, PhaseSelector};
use workload_viz::{WorkloadBuilder, diagnostics, ingest};

#[derive(Parser)]
#[command(name = "workload-viz")]
#[command(about = "Rank/phase workload model checker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest every shard and check cross-rank consistency.
    Validate {
        /// Directory holding <stem>.<rank>.json shard files.
        #[arg(long)]
        data: PathBuf,
    },
    /// Write a per-phase load summary as JSON.
    Summary {
        #[arg(long)]
        data: PathBuf,

        /// Phase index, or "all".
        #[arg(long, default_value_t = PhaseSelector::All)]
        phase: PhaseSelector,

        /// Output file; stdout when omitted.
        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("{}", diagnostics::chain_message(&err));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.cmd {
        Commands::Validate { data } => {
            let mut builder = WorkloadBuilder::new();
            let shards = ingest::ingest_dir(&data, &mut builder)?;
            let workload = builder.finish();

            // Data-level inconsistencies surface as errors here, not panics.
            let phases = workload.num_phases()?;
            workload.check_references()?;

            println!(
                "OK: {} shards, {} ranks, {} phases, {} objects",
                shards,
                workload.num_ranks(),
                phases,
                workload.all_objects().len()
            );
        }
        Commands::Summary { data, phase, out } => {
            let mut builder = WorkloadBuilder::new();
            ingest::ingest_dir(&data, &mut builder)?;
            let workload = builder.finish();

            let summary = view::build_summary(&workload, phase)?;
            let json = serde_json::to_string_pretty(&summary)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}
