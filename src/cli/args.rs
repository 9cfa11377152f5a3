//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::NodeId;

/// Split neuron skeletons into sampling intervals of a target length
#[derive(Parser, Debug)]
#[command(name = "arbor-sampler")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding a local .arbor-sampler.toml
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Partition a domain of a skeleton into intervals
    Partition {
        /// Skeleton JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        skeleton: PathBuf,

        /// Domain start node
        #[arg(short, long, allow_negative_numbers = true)]
        start: NodeId,

        /// Domain end node (repeatable)
        #[arg(short, long = "end", required = true, allow_negative_numbers = true)]
        ends: Vec<NodeId>,

        /// Target interval length in nm (overrides config)
        #[arg(short, long)]
        length: Option<f64>,

        /// Tolerated boundary error in nm (overrides config)
        #[arg(long)]
        error: Option<f64>,

        /// Create new boundary nodes where the error is too big
        #[arg(long)]
        create_boundaries: bool,

        /// Skip section interpolation
        #[arg(long)]
        no_interpolation: bool,

        /// Print the interval payload as JSON
        #[arg(long)]
        json: bool,

        /// Write the interval payload to a file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Preview intervals covering the whole skeleton
    Preview {
        /// Skeleton JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        skeleton: PathBuf,

        /// Target interval length in nm (overrides config)
        #[arg(short, long)]
        length: Option<f64>,
    },

    /// List the nodes of an interval
    Members {
        /// Skeleton JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        skeleton: PathBuf,

        /// Interval start node
        #[arg(short, long, allow_negative_numbers = true)]
        start: NodeId,

        /// Interval end node
        #[arg(short, long, allow_negative_numbers = true)]
        end: NodeId,

        /// Boundary node of another interval (repeatable)
        #[arg(short, long = "boundary", allow_negative_numbers = true)]
        boundaries: Vec<NodeId>,
    },

    /// Move nodes on interpolatable sections
    Interpolate {
        /// Skeleton JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        skeleton: PathBuf,

        /// Print the interpolated skeleton as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the arbor as a tree
    Tree {
        /// Skeleton JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        skeleton: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print config template
    Template,

    /// Show config paths
    Path,
}
