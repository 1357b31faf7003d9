use serde_json::{Map, Value};

use super::{
    Warnings,
    fields::Binder,
    inputs::{self, INPUTS_FIELD},
    model::ModelConfiguration,
    overrides::{self, OVERRIDES_FIELD},
    sections::{self, SECTIONS_FIELD},
};
use crate::{
    assets::{AssetKind, AssetRef, AssetResolver, MeshQuery},
    error::OrchestratorError,
    json::{self, JsonError},
    requests::SetupRequest,
};

/// A setup request whose payloads have all been decoded.
///
/// Building one never touches a model, so a request that fails to decode
/// leaves the asset as it was.
#[derive(Debug)]
pub struct SetupPlan<'q> {
    request: &'q SetupRequest,
    skeletal_mesh: Option<AssetRef>,
    inputs: Vec<Value>,
    sections: Vec<Value>,
    overrides: Map<String, Value>,
}

/// Turns setup requests into model changes.
pub struct Adapter<'r> {
    resolver: &'r dyn AssetResolver,
    meshes: &'r dyn MeshQuery,
    binder: Binder<'r>,
}

impl<'r> Adapter<'r> {
    pub fn new(resolver: &'r dyn AssetResolver, meshes: &'r dyn MeshQuery) -> Self {
        Self {
            resolver,
            meshes,
            binder: Binder::new(resolver),
        }
    }

    /// Applies `request` to `model`.
    ///
    /// # Returns
    /// The warnings collected while applying.
    ///
    /// # Errors
    /// Any payload or skeletal mesh error, in which case `model` is untouched.
    pub fn adapt_setup(
        &self,
        model: &mut ModelConfiguration,
        request: &SetupRequest,
    ) -> Result<Vec<String>, OrchestratorError> {
        let plan = self.plan(request)?;
        Ok(self.apply(model, plan).into_vec())
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Decodes every payload of `request` and resolves its skeletal mesh.
    pub fn plan<'q>(&self, request: &'q SetupRequest) -> Result<SetupPlan<'q>, OrchestratorError> {
        let inputs =
            json::parse_array(&request.training_input_anims_json).map_err(payload_error(INPUTS_FIELD))?;
        let sections =
            json::parse_array(&request.nnm_sections_json).map_err(payload_error(SECTIONS_FIELD))?;
        let overrides =
            json::parse_object(&request.model_overrides_json).map_err(payload_error(OVERRIDES_FIELD))?;

        Ok(SetupPlan {
            request,
            skeletal_mesh: self.resolve_skeletal_mesh(&request.skeletal_mesh)?,
            inputs,
            sections,
            overrides,
        })
    }

    fn resolve_skeletal_mesh(&self, path: &str) -> Result<Option<AssetRef>, OrchestratorError> {
        if path.trim().is_empty() {
            return Ok(None);
        }
        self.resolver
            .load(path, AssetKind::SkeletalMesh)
            .map(Some)
            .ok_or_else(|| OrchestratorError::SkeletalMeshNotFound(path.to_string()))
    }

    // -------------------------------------------------------------------------
    // Application
    // -------------------------------------------------------------------------

    /// Applies a decoded plan. Nothing here fails, problems become warnings.
    pub fn apply(&self, model: &mut ModelConfiguration, plan: SetupPlan<'_>) -> Warnings {
        let mut warnings = Warnings::new();
        let request = plan.request;

        if let Some(mesh) = plan.skeletal_mesh {
            model.set_skeletal_mesh(mesh, self.meshes);
        }

        let graph = &request.deformer_graph;
        if let Some(graph) = self.optional_asset("deformer_graph", graph, AssetKind::DeformerGraph, &mut warnings) {
            model.viz.deformer_graph = Some(graph);
        }
        let anim = &request.test_anim_sequence;
        if let Some(anim) = self.optional_asset("test_anim_sequence", anim, AssetKind::AnimSequence, &mut warnings) {
            model.viz.test_anim_sequence = Some(anim);
        }

        model.training_inputs = inputs::decode_inputs(&plan.inputs, &self.binder, &mut warnings);
        sections::apply_sections(model, &plan.sections, &self.binder, self.meshes, &mut warnings);
        overrides::apply_override_map(model, &plan.overrides, &self.binder, &mut warnings);

        warnings
    }

    fn optional_asset(
        &self,
        key: &str,
        path: &str,
        kind: AssetKind,
        warnings: &mut Warnings,
    ) -> Option<AssetRef> {
        if path.trim().is_empty() {
            return None;
        }
        let asset = self.resolver.load(path, kind);
        if asset.is_none() {
            warnings.push(format!("Missing {key}: {path}"));
        }
        asset
    }
}

fn payload_error(field: &'static str) -> impl Fn(JsonError) -> OrchestratorError {
    move |source| OrchestratorError::Payload { field, source }
}
