//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jvg")]
#[command(about = "Build justice violation graphs for unrealizable GR(1) specifications")]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Build the justice violation graph of a solved game memo
    Build(BuildArgs),

    /// Print the variables and the rank/row/column shape of a memo
    Inspect {
        /// Path to the memo JSON file
        file: PathBuf,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to the memo JSON file
    pub(crate) file: PathBuf,

    /// Read build options from a JSON file; flags below override it
    #[arg(long)]
    pub(crate) options: Option<PathBuf>,

    /// Record the assumption satisfaction order of every cycle node
    #[arg(long, overrides_with = "no_assumption_graphs")]
    pub(crate) assumption_graphs: bool,

    /// Skip assumption satisfaction subgraphs
    #[arg(long, overrides_with = "assumption_graphs")]
    pub(crate) no_assumption_graphs: bool,

    /// Collapse single-path chains of attractor nodes
    #[arg(long)]
    pub(crate) merge_attractors: bool,

    /// Skip invariant extraction
    #[arg(long)]
    pub(crate) no_invariants: bool,

    /// Maximum number of sample states listed per node
    #[arg(long, default_value_t = 4)]
    pub(crate) samples: usize,

    /// Output format: text | json
    #[arg(long, default_value = "text")]
    pub(crate) format: String,

    /// Also write the JSON report to this path
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}
