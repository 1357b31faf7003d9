pub mod assets;
pub mod configs;
pub mod diagnostics;
pub mod dump;
pub mod error;
pub mod json;
pub mod readiness;
pub mod requests;
mod session;
pub mod training;

use configs::Adapter;

pub use assets::{AssetKind, AssetRef, AssetResolver, MeshQuery, normalize_asset_path};
pub use error::OrchestratorError;
pub use requests::{DumpRequest, DumpResponse, Response, SetupRequest, TrainRequest};
pub use session::{AssetEditor, AssetSession, Session};
pub use training::{Trainer, TrainingOutcome, TrainingResult, TrainingRun, TrainingState};

const SETUP_COMPLETED: &str = "Setup completed.";

/// Entry point for setup, training and dump requests against deformer assets.
///
/// Every request runs to completion on the calling thread and holds its asset
/// session exclusively until it returns.
pub struct Automation<'a> {
    editor: &'a mut dyn AssetEditor,
    resolver: &'a dyn AssetResolver,
    meshes: &'a dyn MeshQuery,
    trainer: &'a mut dyn Trainer,
}

impl<'a> Automation<'a> {
    /// Creates a new `Automation`.
    ///
    /// # Arguments
    /// * `editor` - Opens the deformer assets named by requests.
    /// * `resolver` - Resolves the asset paths inside requests.
    /// * `meshes` - Read-only mesh, skeleton and geometry data.
    /// * `trainer` - The training routine.
    pub fn new(
        editor: &'a mut dyn AssetEditor,
        resolver: &'a dyn AssetResolver,
        meshes: &'a dyn MeshQuery,
        trainer: &'a mut dyn Trainer,
    ) -> Self {
        Self {
            editor,
            resolver,
            meshes,
            trainer,
        }
    }

    /// Configures the asset named by `request`.
    ///
    /// Either every list of the model is replaced or, on a hard error, the
    /// model is left untouched.
    pub fn setup(&mut self, request: &SetupRequest) -> Response {
        log::info!("setup request for {}", request.asset_path);
        match self.try_setup(request) {
            Ok(warnings) => Response::completed(SETUP_COMPLETED, warnings),
            Err(e) => {
                log::error!("setup failed: {e}");
                Response::from(e)
            }
        }
    }

    /// Trains the asset named by `request` as it is currently configured.
    pub fn train(&mut self, request: &TrainRequest) -> Response {
        log::info!("train request for {}", request.asset_path);
        match self.try_train(request) {
            Ok(outcome) => Response::default().with_outcome(outcome),
            Err(e) => {
                log::error!("train failed: {e}");
                Response::from(e)
            }
        }
    }

    /// Runs setup and, if it succeeds, trains the same asset with dialogs
    /// suppressed.
    pub fn run(&mut self, request: &SetupRequest) -> Response {
        let setup = self.setup(request);
        if !setup.success {
            return setup;
        }

        let training = self.train(&TrainRequest::from(request));
        Response {
            warnings: setup.warnings,
            ..training
        }
    }

    /// Makes sure the asset at `asset_path` holds a model of `model_type`,
    /// switching if needed, and marks it modified.
    ///
    /// # Errors
    /// Any error of opening the asset or resolving and switching the type.
    pub fn ensure_model_type(
        &mut self,
        asset_path: &str,
        model_type: &str,
        force: bool,
    ) -> Result<(), OrchestratorError> {
        let mut session = Session::open(self.editor, asset_path)?;
        session.ensure_model_type(model_type, force)?;
        session.mark_dirty();
        Ok(())
    }

    /// Describes the asset named by `request` in setup request form.
    pub fn dump(&mut self, request: &DumpRequest) -> DumpResponse {
        let result = Session::open(self.editor, &request.asset_path)
            .and_then(|mut session| session.model_mut().map(|model| dump::dump_model(model)));
        result.unwrap_or_else(DumpResponse::from)
    }

    fn try_setup(&mut self, request: &SetupRequest) -> Result<Vec<String>, OrchestratorError> {
        let adapter = Adapter::new(self.resolver, self.meshes);
        let mut session = Session::open(self.editor, &request.asset_path)?;
        session.ensure_model_type(&request.model_type, request.force_switch)?;

        let model = session.model_mut()?;
        let plan = adapter.plan(request)?;
        let warnings = adapter.apply(model, plan);
        model.invalidate_training();
        readiness::refresh(model, self.meshes);

        session.mark_dirty();
        Ok(warnings.into_vec())
    }

    fn try_train(&mut self, request: &TrainRequest) -> Result<TrainingOutcome, OrchestratorError> {
        let mut session = Session::open(self.editor, &request.asset_path)?;
        session.ensure_model_type(&request.model_type, request.force_switch)?;

        let model = session.model_mut()?;
        let outcome = TrainingRun::new(model, self.meshes, request.suppress_dialogs).execute(self.trainer);

        if outcome.trained {
            session.refresh_components();
            session.update_deformer_graph();
        }
        if outcome.success {
            session.mark_dirty();
        }
        Ok(outcome)
    }
}
