use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use outpost::cli::commands;
use outpost::config::generation::GridParams;
use outpost::config::simulation::SimulationConfig;

const DEFAULT_CONFIG: &str = "outpost.toml";

#[derive(Parser)]
#[command(name = "outpost")]
#[command(about = "A headless colony builder: grow a base on a wrapping grid and research your way up")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new colony and save its first snapshot
    New {
        /// Path to a grid generation config file
        #[arg(short, long)]
        grid: Option<String>,

        /// Override the grid seed (0 picks a random one)
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Fast-forward the latest colony, optionally following a command script
    Run {
        /// Seconds of game time to simulate
        #[arg(short = 't', long, default_value_t = 60.0)]
        seconds: f64,

        /// JSON script of timed commands
        #[arg(short, long)]
        script: Option<String>,

        /// Start from this snapshot instead of the latest
        #[arg(long)]
        snapshot: Option<String>,
    },

    /// Inspect the latest colony
    Inspect {
        /// Show the technology tree
        #[arg(long)]
        tech: bool,

        /// Show the module catalogue
        #[arg(long, conflicts_with = "tech")]
        modules: bool,
    },

    /// Export the latest colony record as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Manage colony snapshots
    Snapshots {
        #[command(subcommand)]
        action: SnapshotAction,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// List available snapshots
    List {
        /// Snapshot directory (defaults to the configured one)
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// Restore a snapshot file as the current colony
    Restore {
        /// Path to the snapshot file
        file: String,
    },
}

/// A missing default config file means defaults; an explicit path must exist.
fn load_config(path: &str) -> Result<SimulationConfig, String> {
    let path = Path::new(path);
    if path == Path::new(DEFAULT_CONFIG) && !path.exists() {
        return Ok(SimulationConfig::default());
    }
    SimulationConfig::from_file(path)
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config.log_level, cli.log_json);

    let result = match cli.command {
        Commands::New { grid, seed } => {
            let params = match grid {
                Some(path) => GridParams::from_file(Path::new(&path)),
                None => Ok(GridParams::default()),
            };
            params.and_then(|mut params| {
                if let Some(seed) = seed {
                    params.seed = seed;
                }
                commands::new_colony(&config, &params)
            })
        }

        Commands::Run {
            seconds,
            script,
            snapshot,
        } => commands::run(&config, snapshot.as_deref(), seconds, script.as_deref()),

        Commands::Inspect { tech, modules } => commands::inspect(&config, tech, modules),

        Commands::Export { output } => commands::export(&config, output.as_deref()),

        Commands::Snapshots { action } => match action {
            SnapshotAction::List { dir } => {
                let dir = dir.unwrap_or_else(|| config.snapshot_directory.clone());
                commands::list_snapshots(Path::new(&dir))
            }
            SnapshotAction::Restore { file } => {
                commands::restore_snapshot(&config, Path::new(&file))
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
