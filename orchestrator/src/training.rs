//! The training state machine: validate, train, classify, post-process.

use std::time::{Duration, Instant};

use crate::{
    assets::MeshQuery,
    configs::{InputInfo, ModelConfiguration},
    diagnostics, readiness,
};

/// How a training attempt concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingResult {
    Success,
    Aborted,
    AbortedCantUse,
    FailOnData,
    FailPythonError,
    Other,
}

impl TrainingResult {
    /// Classifies a raw trainer code. Unknown codes are `Other`.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::Aborted,
            2 => Self::AbortedCantUse,
            3 => Self::FailOnData,
            4 => Self::FailPythonError,
            _ => Self::Other,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Aborted => 1,
            Self::AbortedCantUse => 2,
            Self::FailOnData => 3,
            Self::FailPythonError => 4,
            Self::Other => 5,
        }
    }

    fn message(&self, suppress_dialogs: bool) -> &'static str {
        match self {
            Self::Success => "Training succeeded and network loaded.",
            Self::Aborted if suppress_dialogs => "Training aborted (dialogs suppressed).",
            Self::Aborted => "Training aborted.",
            Self::AbortedCantUse => "Training aborted and partial network is not usable.",
            Self::FailOnData => "Training failed due to invalid input data.",
            Self::FailPythonError => "Training failed due to Python error. Check Output Log.",
            Self::Other => "Training failed with an unknown error.",
        }
    }
}

/// The opaque training routine.
pub trait Trainer {
    /// Trains the network of `model`, blocking until done.
    ///
    /// # Returns
    /// The raw result code, see [`TrainingResult::from_code`].
    fn train(&mut self, model: &ModelConfiguration) -> i32;

    /// Loads the network produced by the last successful run.
    ///
    /// # Returns
    /// The input schema of the loaded network, or `None` if it could not be
    /// loaded.
    fn load_trained_network(&mut self, model: &ModelConfiguration) -> Option<InputInfo>;

    /// Called once after every classified run. The resampling flag it leaves
    /// on `model` is kept.
    fn on_post_training(
        &mut self,
        _model: &mut ModelConfiguration,
        _result: TrainingResult,
        _used_partial_network: bool,
    ) {
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingState {
    Idle,
    Validating,
    Ready,
    NotReady,
    Training,
    Classifying,
    PostProcessing,
    Done,
}

/// What a [`TrainingRun`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutcome {
    pub result: TrainingResult,
    pub duration: Duration,
    pub network_loaded: bool,
    pub message: String,
    /// Training succeeded and its network was loaded.
    pub success: bool,
    /// The trainer was invoked, so the outcome was classified and
    /// post-processed.
    pub trained: bool,
}

impl TrainingOutcome {
    fn rejected(message: String) -> Self {
        Self {
            result: TrainingResult::FailOnData,
            duration: Duration::ZERO,
            network_loaded: false,
            message,
            success: false,
            trained: false,
        }
    }
}

/// One pass through the training state machine for a single model.
pub struct TrainingRun<'a> {
    model: &'a mut ModelConfiguration,
    meshes: &'a dyn MeshQuery,
    suppress_dialogs: bool,
    state: TrainingState,
}

impl<'a> TrainingRun<'a> {
    /// Creates a new `TrainingRun`.
    ///
    /// # Args
    /// * `model` - The model to train. Held exclusively for the whole run.
    /// * `meshes` - Mesh data used by the readiness checks.
    /// * `suppress_dialogs` - Selects the wording of the aborted message.
    pub fn new(model: &'a mut ModelConfiguration, meshes: &'a dyn MeshQuery, suppress_dialogs: bool) -> Self {
        Self {
            model,
            meshes,
            suppress_dialogs,
            state: TrainingState::Idle,
        }
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    /// Runs the machine to `Done`.
    ///
    /// The trainer is never invoked for a model that fails the readiness
    /// checks or has an empty input schema.
    pub fn execute(&mut self, trainer: &mut dyn Trainer) -> TrainingOutcome {
        let outcome = match self.validate() {
            Ok(()) => {
                let (result, duration) = self.train(trainer);
                let mut outcome = self.classify(result, duration);
                self.post_process(trainer, &mut outcome);
                outcome
            }
            Err(message) => TrainingOutcome::rejected(message),
        };

        self.transition(TrainingState::Done);
        log::info!(
            result = outcome.result.code(),
            success = outcome.success,
            duration_sec = outcome.duration.as_secs_f64();
            "training run finished"
        );
        outcome
    }

    fn validate(&mut self) -> Result<(), String> {
        self.transition(TrainingState::Validating);
        readiness::refresh(self.model, self.meshes);

        if !self.model.editor.ready_for_training {
            self.transition(TrainingState::NotReady);
            return Err(diagnostics::collect(self.model, self.meshes));
        }
        self.transition(TrainingState::Ready);

        self.model.editor.input_info = self.model.editor_input_info(self.meshes);
        if self.model.editor.input_info.is_empty() {
            return Err("Editor input info is empty. Training aborted before launch.".into());
        }
        Ok(())
    }

    fn train(&mut self, trainer: &mut dyn Trainer) -> (TrainingResult, Duration) {
        self.transition(TrainingState::Training);
        let start = Instant::now();
        let code = trainer.train(self.model);
        let duration = start.elapsed();
        log::debug!(code = code; "trainer returned");

        self.transition(TrainingState::Classifying);
        (TrainingResult::from_code(code), duration)
    }

    fn classify(&mut self, result: TrainingResult, duration: Duration) -> TrainingOutcome {
        TrainingOutcome {
            result,
            duration,
            network_loaded: false,
            message: result.message(self.suppress_dialogs).to_string(),
            success: false,
            trained: true,
        }
    }

    fn post_process(&mut self, trainer: &mut dyn Trainer, outcome: &mut TrainingOutcome) {
        self.transition(TrainingState::PostProcessing);

        if outcome.result == TrainingResult::Success {
            self.model.editor.resampling_needed = false;
            match trainer.load_trained_network(self.model) {
                Some(input_info) => {
                    self.model.input_info = input_info;
                    outcome.network_loaded = true;
                    outcome.success = true;
                }
                None => {
                    outcome.message = "Training succeeded but LoadTrainedNetwork failed.".into();
                }
            }
        }

        trainer.on_post_training(self.model, outcome.result, false);
        log::debug!(resampling_needed = self.model.editor.resampling_needed; "post training hook done");
        self.model.editor.heat_map_enabled = self.model.viz.show_heat_map;
    }

    fn transition(&mut self, next: TrainingState) {
        log::debug!(from:? = self.state, to:? = next; "training state");
        self.state = next;
    }
}
