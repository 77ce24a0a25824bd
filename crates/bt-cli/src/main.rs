//! Behavior tree CLI.
//!
//! - `bt validate <file>` - parse and validate a JSON tree file
//! - `bt run <file>` - tick a tree against the file's blackboard

mod definition;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use bt_runtime::{NodePool, State};
use bt_tools::trace::SharedTraceLog;

use crate::definition::TreeFile;

#[derive(Parser)]
#[command(name = "bt")]
#[command(about = "Load, validate and tick behavior trees", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a tree file parses and forms a valid tree
    Validate {
        /// Tree file (JSON)
        file: PathBuf,
    },

    /// Instantiate a tree and tick it
    Run {
        /// Tree file (JSON)
        file: PathBuf,

        /// Maximum number of ticks
        #[arg(long, default_value_t = 10)]
        ticks: u64,

        /// Override the file's global seed
        #[arg(long)]
        seed: Option<u64>,

        /// Owner id the tree is instantiated for
        #[arg(long, default_value_t = 1)]
        owner: u64,

        /// Stop at the first tick that ends in success or failure
        #[arg(long)]
        until_done: bool,

        /// Print trace events as JSON lines after the run
        #[arg(long)]
        trace: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Validate { file } => validate(&file),
        Commands::Run {
            file,
            ticks,
            seed,
            owner,
            until_done,
            trace,
        } => run(
            &file,
            RunOptions {
                ticks,
                seed,
                owner,
                until_done,
                trace,
            },
        ),
    }
}

fn validate(path: &Path) -> Result<()> {
    let file = TreeFile::load(path)?;
    let def = file
        .build()
        .with_context(|| format!("Invalid tree in {}", path.display()))?;
    println!("{}: ok ({} nodes)", path.display(), def.len());
    Ok(())
}

struct RunOptions {
    ticks: u64,
    seed: Option<u64>,
    owner: u64,
    until_done: bool,
    trace: bool,
}

fn run(path: &Path, options: RunOptions) -> Result<()> {
    let file = TreeFile::load(path)?;
    let def = file
        .build()
        .with_context(|| format!("Invalid tree in {}", path.display()))?;

    let mut config = file.config;
    if let Some(seed) = options.seed {
        config.seed = seed;
    }

    let mut pool = NodePool::with_config(config.pool);
    let mut tree = def.instantiate_with(options.owner, config.clone_options().pool(&mut pool))?;
    let log = SharedTraceLog::new();
    if options.trace {
        tree.set_trace_sink(log.clone());
    }

    tracing::info!(
        tree = %tree.id(),
        owner = options.owner,
        seed = config.seed,
        nodes = tree.len(),
        "Running tree"
    );

    let bb = file.blackboard();
    let mut state = State::NotEntered;
    for tick in 1..=options.ticks {
        state = tree.tick(&bb);
        println!("tick {tick:>4}: {state}");
        if options.until_done && state.is_terminal() {
            break;
        }
    }

    tree.stop();
    let kept = tree.recycle(&mut pool);
    let stats = pool.total();

    println!();
    println!("Final state: {state}");
    println!(
        "Pool: {kept} kept, {} created, {} reused, {} discarded",
        stats.created, stats.reused, stats.discarded
    );

    if options.trace {
        for event in log.snapshot().events {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    Ok(())
}
