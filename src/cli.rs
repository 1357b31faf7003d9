//! Command line interface.
//!
//! ```bash
//! mld-automation --library assets.json run request.json --trainer ./train.sh
//! mld-automation --library assets.json dump --asset-path /Game/MLD_Body
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Configures and trains ML deformer assets from JSON requests.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "mld-automation")]
#[command(version)]
pub struct Cli {
    /// JSON manifest of the assets and deformers to work against
    #[arg(short, long, env = "MLD_LIBRARY", value_name = "MANIFEST")]
    pub library: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Apply a setup request
    Setup(RequestArgs),

    /// Train a deformer as currently configured
    Train(TrainArgs),

    /// Apply a setup request, then train
    Run(TrainArgs),

    /// Switch a deformer to another model type
    EnsureModelType {
        #[arg(long)]
        asset_path: String,

        /// Model type, e.g. `nmm` or `nnm`
        #[arg(long)]
        model_type: String,

        /// Do not force the switch
        #[arg(long)]
        no_force: bool,
    },

    /// Print a deformer in setup request form
    Dump {
        #[arg(long)]
        asset_path: String,
    },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct RequestArgs {
    /// Path to the JSON request
    #[arg(value_name = "REQUEST")]
    pub request: PathBuf,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Training program, fed the dumped model on stdin
    #[arg(long, env = "MLD_TRAINER", value_name = "PROGRAM")]
    pub trainer: Option<PathBuf>,

    /// Extra argument passed to the training program
    #[arg(long = "trainer-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub trainer_args: Vec<String>,

    /// Where the training program writes the trained network's input info
    #[arg(long, default_value = "trained_network.json")]
    pub artifact: PathBuf,
}
