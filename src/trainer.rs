//! Runs training as an external program.
//!
//! The program receives the model, dumped in setup request form, on stdin and
//! reports its result through the exit status. A successful run leaves the
//! input schema of the trained network as JSON in the artifact file, whose
//! path it finds in `MLD_ARTIFACT`.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use orchestrator::{
    Trainer, TrainingResult,
    configs::{InputInfo, ModelConfiguration},
    dump,
};

#[derive(Debug)]
pub struct CommandTrainer {
    program: Option<PathBuf>,
    args: Vec<String>,
    artifact: PathBuf,
}

impl CommandTrainer {
    pub fn new(program: Option<PathBuf>, args: Vec<String>, artifact: PathBuf) -> Self {
        Self {
            program,
            args,
            artifact,
        }
    }

    fn spawn(&self, program: &Path, model: &ModelConfiguration) -> std::io::Result<i32> {
        let request = dump::dump_model(model).to_setup_request("");
        let payload = serde_json::to_vec(&request)?;

        let mut child = Command::new(program)
            .args(&self.args)
            .env("MLD_ARTIFACT", &self.artifact)
            .stdin(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload)?;
        }

        let status = child.wait()?;
        // Killed by a signal.
        Ok(status.code().unwrap_or(TrainingResult::Other.code()))
    }
}

impl Trainer for CommandTrainer {
    fn train(&mut self, model: &ModelConfiguration) -> i32 {
        let Some(program) = &self.program else {
            log::error!("no trainer program configured");
            return TrainingResult::Other.code();
        };

        log::info!("launching trainer {}", program.display());
        match self.spawn(program, model) {
            Ok(code) => code,
            Err(e) => {
                log::error!("trainer {} failed to run: {e}", program.display());
                TrainingResult::FailPythonError.code()
            }
        }
    }

    fn load_trained_network(&mut self, _model: &ModelConfiguration) -> Option<InputInfo> {
        let text = match fs::read_to_string(&self.artifact) {
            Ok(text) => text,
            Err(e) => {
                log::error!("cannot read {}: {e}", self.artifact.display());
                return None;
            }
        };
        serde_json::from_str(&text)
            .inspect_err(|e| log::error!("invalid network artifact {}: {e}", self.artifact.display()))
            .ok()
    }
}
