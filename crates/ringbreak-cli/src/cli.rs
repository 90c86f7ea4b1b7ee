use clap::{Args, Parser};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Ringbreak - configure and launch ring-breaking relative binding free-energy simulations.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    #[command(flatten)]
    pub simulation: SimulationArgs,

    #[command(flatten)]
    pub execution: ExecutionArgs,

    /// Increase verbosity level (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output; failures are still reported on exit
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Parameters of the free-energy simulation itself.
#[derive(Args, Debug, Clone)]
pub struct SimulationArgs {
    /// Equilibration time in picoseconds
    #[arg(long = "equib_time", value_name = "PS")]
    pub equib_time: u64,

    /// Production time in picoseconds
    #[arg(long = "prod_time", value_name = "PS")]
    pub prod_time: u64,

    /// Restraints strength (De value, kcal/mol)
    #[arg(long = "restraints_strength", value_name = "DE")]
    pub restraints_strength: String,

    /// System to run
    #[arg(long = "system_name", value_name = "NAME")]
    pub system_name: String,

    /// Replicate to run. If not provided, replicates 1, 2 and 3 are run
    #[arg(long, value_name = "INT")]
    pub replicate: Option<u32>,

    /// Run a Hamiltonian replica exchange simulation
    #[arg(long = "use_hrex")]
    pub use_hrex: bool,

    /// Run a REST2 simulation (requires --use_hrex)
    #[arg(long = "use_rest2")]
    pub use_rest2: bool,

    /// Bond strength for the restraints (k, kcal mol-1 A-2)
    #[arg(long = "bond_strength", value_name = "FLOAT")]
    pub bond_strength: f64,

    /// Restart the simulation from a previous checkpoint
    #[arg(long)]
    pub restart: bool,

    /// Time in picoseconds to extend the simulation by (requires --restart)
    #[arg(long = "extend_time", value_name = "PS")]
    pub extend_time: Option<u64>,

    /// Use ghost atom modifications in the simulation
    #[arg(long = "ghost_mods")]
    pub ghost_mods: bool,

    /// REST2 scaling factor (defaults to 1)
    #[arg(long = "rest2_scale", value_name = "INT")]
    pub rest2_scale: Option<u32>,

    /// Focus sampling on the upper lambda window [0.7, 1.0]
    #[arg(long = "focused_sampling")]
    pub focused_sampling: bool,
}

/// Where inputs come from, where outputs go, and how the engine is invoked.
#[derive(Args, Debug, Clone, Default)]
pub struct ExecutionArgs {
    /// Path to an optional settings file in TOML format
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific settings value, overriding the settings file.
    /// Can be used multiple times. Example: -S engine.timeout="60 s"
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    /// Directory containing the prepared `<system_name>.bss` files
    #[arg(long, value_name = "PATH")]
    pub input_dir: Option<PathBuf>,

    /// Directory under which the dynamics_* output folders are created
    #[arg(long, value_name = "PATH")]
    pub output_root: Option<PathBuf>,

    /// Simulation engine program to invoke
    #[arg(long, value_name = "PROGRAM")]
    pub runner: Option<String>,

    /// Keep running the remaining replicates after one fails
    #[arg(long)]
    pub keep_going: bool,

    /// Prepare directories and configurations without starting the engine
    #[arg(long)]
    pub dry_run: bool,
}
