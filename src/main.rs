mod cli;
mod library;
mod trainer;

use std::{fs, path::Path, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use orchestrator::{Automation, DumpRequest, Response, SetupRequest, TrainRequest};
use serde::{Serialize, de::DeserializeOwned};

use cli::{Cli, Command, TrainArgs};
use library::Library;
use trainer::CommandTrainer;

const MODEL_TYPE_ENSURED: &str = "Model type ensured.";

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match execute(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs one command and prints its response.
///
/// # Returns
/// Whether the request succeeded.
fn execute(cli: Cli) -> Result<bool> {
    let library = Library::load(&cli.library)?;
    let mut editor = library.editor()?;
    let mut trainer = match &cli.command {
        Command::Train(args) | Command::Run(args) => trainer_for(args),
        _ => CommandTrainer::new(None, Vec::new(), Default::default()),
    };
    let mut automation = Automation::new(&mut editor, &library, &library, &mut trainer);

    match cli.command {
        Command::Setup(args) => {
            let request: SetupRequest = read_request(&args.request)?;
            let response = automation.setup(&request);
            print(&response)?;
            Ok(response.success)
        }
        Command::Train(args) => {
            let request: TrainRequest = read_request(&args.request.request)?;
            let response = automation.train(&request);
            print(&response)?;
            Ok(response.success)
        }
        Command::Run(args) => {
            let request: SetupRequest = read_request(&args.request.request)?;
            let response = automation.run(&request);
            print(&response)?;
            Ok(response.success)
        }
        Command::EnsureModelType {
            asset_path,
            model_type,
            no_force,
        } => {
            let response = match automation.ensure_model_type(&asset_path, &model_type, !no_force) {
                Ok(()) => Response::completed(MODEL_TYPE_ENSURED, Vec::new()),
                Err(e) => Response::from(e),
            };
            print(&response)?;
            Ok(response.success)
        }
        Command::Dump { asset_path } => {
            let response = automation.dump(&DumpRequest { asset_path });
            print(&response)?;
            Ok(response.success)
        }
    }
}

fn trainer_for(args: &TrainArgs) -> CommandTrainer {
    CommandTrainer::new(
        args.trainer.clone(),
        args.trainer_args.clone(),
        args.artifact.clone(),
    )
}

fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read request '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid request '{}'", path.display()))
}

fn print<T: Serialize>(response: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
