use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    fields::{Bindable, EnumField, FieldSlot},
    inputs::TrainingInput,
    sections::Section,
};
use crate::{
    assets::{AssetRef, MeshQuery},
    error::OrchestratorError,
    readiness::ReadinessErrors,
};

/// The trainable model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    NeuralMorph,
    NearestNeighbor,
}

impl ModelType {
    /// Resolves a user supplied model type.
    ///
    /// Matching ignores case and surrounding whitespace, and accepts both the
    /// short codes and the long names.
    ///
    /// # Returns
    /// `Ok(None)` for a blank string, which means "keep the current type".
    ///
    /// # Errors
    /// `UnsupportedModelType` for any other unrecognised string.
    pub fn resolve(raw: &str) -> Result<Option<Self>, OrchestratorError> {
        let key = raw.trim().to_lowercase();
        match key.as_str() {
            "" => Ok(None),
            "nmm" | "neuralmorph" | "neural_morph" | "neuralmorphmodel" => {
                Ok(Some(Self::NeuralMorph))
            }
            "nnm" | "nearestneighbor" | "nearest_neighbor" | "nearestneighbormodel" => {
                Ok(Some(Self::NearestNeighbor))
            }
            _ => Err(OrchestratorError::UnsupportedModelType(raw.to_string())),
        }
    }

    /// The short code of the model type.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NeuralMorph => "NMM",
            Self::NearestNeighbor => "NNM",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NeuralMorph => f.write_str("NeuralMorphModel"),
            Self::NearestNeighbor => f.write_str("NearestNeighborModel"),
        }
    }
}

/// Hyperparameters every model type shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    pub num_iterations: i32,
    pub batch_size: i32,
    pub learning_rate: f32,
    pub regularization_factor: f32,
    pub smooth_loss_beta: f32,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            num_iterations: 10_000,
            batch_size: 128,
            learning_rate: 0.001,
            regularization_factor: 1.0,
            smooth_loss_beta: 1.0,
        }
    }
}

impl Bindable for TrainingSettings {
    fn field_names(&self) -> &'static [&'static str] {
        &[
            "num_iterations",
            "batch_size",
            "learning_rate",
            "regularization_factor",
            "smooth_loss_beta",
        ]
    }

    fn field(&mut self, name: &str) -> Option<FieldSlot<'_>> {
        Some(match name {
            "num_iterations" => FieldSlot::Int(&mut self.num_iterations),
            "batch_size" => FieldSlot::Int(&mut self.batch_size),
            "learning_rate" => FieldSlot::Float(&mut self.learning_rate),
            "regularization_factor" => FieldSlot::Float(&mut self.regularization_factor),
            "smooth_loss_beta" => FieldSlot::Float(&mut self.smooth_loss_beta),
            _ => return None,
        })
    }
}

/// How a neural morph model distributes its morph targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeuralMorphMode {
    #[default]
    Local,
    Global,
}

impl EnumField for NeuralMorphMode {
    fn names(&self) -> &'static [&'static str] {
        &["Local", "Global"]
    }

    fn set_index(&mut self, index: usize) {
        *self = match index {
            0 => Self::Local,
            _ => Self::Global,
        };
    }
}

/// Network topology of a neural morph model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralMorphSettings {
    pub mode: NeuralMorphMode,
    pub local_num_morph_targets_per_bone: i32,
    pub global_num_morph_targets: i32,
    pub local_num_hidden_layers: i32,
    pub local_num_neurons_per_layer: i32,
    pub global_num_hidden_layers: i32,
    pub global_num_neurons_per_layer: i32,
    #[serde(rename = "b_enable_bone_masks")]
    pub enable_bone_masks: bool,
}

impl Default for NeuralMorphSettings {
    fn default() -> Self {
        Self {
            mode: NeuralMorphMode::Local,
            local_num_morph_targets_per_bone: 6,
            global_num_morph_targets: 128,
            local_num_hidden_layers: 1,
            local_num_neurons_per_layer: 6,
            global_num_hidden_layers: 2,
            global_num_neurons_per_layer: 128,
            enable_bone_masks: false,
        }
    }
}

impl Bindable for NeuralMorphSettings {
    fn field_names(&self) -> &'static [&'static str] {
        &[
            "mode",
            "local_num_morph_targets_per_bone",
            "global_num_morph_targets",
            "local_num_hidden_layers",
            "local_num_neurons_per_layer",
            "global_num_hidden_layers",
            "global_num_neurons_per_layer",
            "b_enable_bone_masks",
        ]
    }

    fn field(&mut self, name: &str) -> Option<FieldSlot<'_>> {
        Some(match name {
            "mode" => FieldSlot::Enum(&mut self.mode),
            "local_num_morph_targets_per_bone" => {
                FieldSlot::Int(&mut self.local_num_morph_targets_per_bone)
            }
            "global_num_morph_targets" => FieldSlot::Int(&mut self.global_num_morph_targets),
            "local_num_hidden_layers" => FieldSlot::Int(&mut self.local_num_hidden_layers),
            "local_num_neurons_per_layer" => FieldSlot::Int(&mut self.local_num_neurons_per_layer),
            "global_num_hidden_layers" => FieldSlot::Int(&mut self.global_num_hidden_layers),
            "global_num_neurons_per_layer" => {
                FieldSlot::Int(&mut self.global_num_neurons_per_layer)
            }
            "b_enable_bone_masks" => FieldSlot::Bool(&mut self.enable_bone_masks),
            _ => return None,
        })
    }
}

/// Basis and kernel parameters of a nearest neighbor model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearestNeighborSettings {
    #[serde(rename = "b_use_pca")]
    pub use_pca: bool,
    pub num_basis_per_section: i32,
    #[serde(rename = "b_use_dual_quaternion_deltas")]
    pub use_dual_quaternion_deltas: bool,
    pub decay_factor: f32,
    pub nearest_neighbor_offset_weight: f32,
    pub early_stop_epochs: i32,
    #[serde(rename = "b_use_rbf")]
    pub use_rbf: bool,
    pub rbf_sigma: f32,
    pub hidden_layer_dims: Vec<i32>,
}

impl Default for NearestNeighborSettings {
    fn default() -> Self {
        Self {
            use_pca: true,
            num_basis_per_section: 128,
            use_dual_quaternion_deltas: true,
            decay_factor: 0.85,
            nearest_neighbor_offset_weight: 1.0,
            early_stop_epochs: 100,
            use_rbf: false,
            rbf_sigma: 1.0,
            hidden_layer_dims: vec![512, 512],
        }
    }
}

impl Bindable for NearestNeighborSettings {
    fn field_names(&self) -> &'static [&'static str] {
        &[
            "b_use_pca",
            "num_basis_per_section",
            "b_use_dual_quaternion_deltas",
            "decay_factor",
            "nearest_neighbor_offset_weight",
            "early_stop_epochs",
            "b_use_rbf",
            "rbf_sigma",
            "hidden_layer_dims",
        ]
    }

    fn field(&mut self, name: &str) -> Option<FieldSlot<'_>> {
        Some(match name {
            "b_use_pca" => FieldSlot::Bool(&mut self.use_pca),
            "num_basis_per_section" => FieldSlot::Int(&mut self.num_basis_per_section),
            "b_use_dual_quaternion_deltas" => FieldSlot::Bool(&mut self.use_dual_quaternion_deltas),
            "decay_factor" => FieldSlot::Float(&mut self.decay_factor),
            "nearest_neighbor_offset_weight" => {
                FieldSlot::Float(&mut self.nearest_neighbor_offset_weight)
            }
            "early_stop_epochs" => FieldSlot::Int(&mut self.early_stop_epochs),
            "b_use_rbf" => FieldSlot::Bool(&mut self.use_rbf),
            "rbf_sigma" => FieldSlot::Float(&mut self.rbf_sigma),
            "hidden_layer_dims" => FieldSlot::IntArray(&mut self.hidden_layer_dims),
            _ => return None,
        })
    }
}

/// Per-variant state of a model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelVariant {
    NeuralMorph(NeuralMorphSettings),
    NearestNeighbor {
        settings: NearestNeighborSettings,
        sections: Vec<Section>,
        network_input_dim: usize,
        network_output_dim: usize,
    },
}

impl ModelVariant {
    fn new(model_type: ModelType) -> Self {
        match model_type {
            ModelType::NeuralMorph => Self::NeuralMorph(NeuralMorphSettings::default()),
            ModelType::NearestNeighbor => Self::NearestNeighbor {
                settings: NearestNeighborSettings::default(),
                sections: Vec::new(),
                network_input_dim: 0,
                network_output_dim: 0,
            },
        }
    }

    /// The variant-specific override table.
    pub fn settings_mut(&mut self) -> &mut dyn Bindable {
        match self {
            Self::NeuralMorph(settings) => settings,
            Self::NearestNeighbor { settings, .. } => settings,
        }
    }
}

/// Preview settings of the deformer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VizSettings {
    pub deformer_graph: Option<AssetRef>,
    pub test_anim_sequence: Option<AssetRef>,
    pub show_heat_map: bool,
}

/// The inputs a network was (or will be) trained against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputInfo {
    pub bone_names: Vec<String>,
    pub curve_names: Vec<String>,
    pub num_base_vertices: i32,
    pub num_target_vertices: i32,
}

impl InputInfo {
    pub fn is_empty(&self) -> bool {
        self.bone_names.is_empty() && self.curve_names.is_empty() && self.num_base_vertices == 0
    }
}

/// Derived, editor-side state. Recomputed by [`crate::readiness::refresh`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub ready_for_training: bool,
    pub resampling_needed: bool,
    pub training_invalidated: bool,
    pub num_training_frames: i32,
    pub heat_map_enabled: bool,
    pub readiness: ReadinessErrors,
    pub input_info: InputInfo,
}

/// One trainable deformer model.
///
/// The model type is fixed at construction. Changing it means building a new
/// configuration through [`ModelConfiguration::switched_to`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfiguration {
    model_type: ModelType,
    pub variant: ModelVariant,
    pub settings: TrainingSettings,
    pub skeletal_mesh: Option<AssetRef>,
    pub bone_include_list: Vec<String>,
    pub vertex_map: Vec<i32>,
    pub cached_num_vertices: i32,
    pub viz: VizSettings,
    pub training_inputs: Vec<TrainingInput>,
    /// Input schema of the trained network.
    pub input_info: InputInfo,
    pub editor: EditorState,
}

impl ModelConfiguration {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            model_type,
            variant: ModelVariant::new(model_type),
            settings: TrainingSettings::default(),
            skeletal_mesh: None,
            bone_include_list: Vec::new(),
            vertex_map: Vec::new(),
            cached_num_vertices: 0,
            viz: VizSettings::default(),
            training_inputs: Vec::new(),
            input_info: InputInfo::default(),
            editor: EditorState::default(),
        }
    }

    /// Builds a configuration of another type that keeps the base mesh,
    /// preview settings and training inputs of this one.
    pub fn switched_to(&self, model_type: ModelType) -> Self {
        Self {
            skeletal_mesh: self.skeletal_mesh.clone(),
            bone_include_list: self.bone_include_list.clone(),
            vertex_map: self.vertex_map.clone(),
            cached_num_vertices: self.cached_num_vertices,
            viz: self.viz.clone(),
            training_inputs: self.training_inputs.clone(),
            ..Self::new(model_type)
        }
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn neural_morph(&self) -> Option<&NeuralMorphSettings> {
        match &self.variant {
            ModelVariant::NeuralMorph(settings) => Some(settings),
            _ => None,
        }
    }

    pub fn nearest_neighbor(&self) -> Option<&NearestNeighborSettings> {
        match &self.variant {
            ModelVariant::NearestNeighbor { settings, .. } => Some(settings),
            _ => None,
        }
    }

    /// Sections of the model; always empty for models without sections.
    pub fn sections(&self) -> &[Section] {
        match &self.variant {
            ModelVariant::NearestNeighbor { sections, .. } => sections,
            _ => &[],
        }
    }

    pub fn supports_sections(&self) -> bool {
        matches!(self.variant, ModelVariant::NearestNeighbor { .. })
    }

    /// Network dimensions as `(input, output)`, for models that declare them.
    pub fn network_dims(&self) -> Option<(usize, usize)> {
        match &self.variant {
            ModelVariant::NearestNeighbor {
                network_input_dim,
                network_output_dim,
                ..
            } => Some((*network_input_dim, *network_output_dim)),
            _ => None,
        }
    }

    /// Sets the base mesh along with every bone and the import vertex map.
    pub fn set_skeletal_mesh(&mut self, mesh: AssetRef, meshes: &dyn MeshQuery) {
        self.bone_include_list = meshes.bone_names(&mesh);
        self.vertex_map = meshes.import_vertex_map(&mesh);
        self.cached_num_vertices = meshes.num_imported_vertices(&mesh);
        self.skeletal_mesh = Some(mesh);
    }

    /// Whether any enabled training input carries target geometry.
    pub fn has_training_ground_truth(&self) -> bool {
        self.training_inputs
            .iter()
            .any(|input| input.enabled && input.geometry_cache.is_some())
    }

    /// Marks the current network stale.
    pub fn invalidate_training(&mut self) {
        self.editor.training_invalidated = true;
        self.editor.resampling_needed = true;
    }

    /// Recomputes the declared network dimensions from bones and sections.
    pub fn update_network_dims(&mut self) {
        let num_bones = self.bone_include_list.len();
        if let ModelVariant::NearestNeighbor {
            sections,
            network_input_dim,
            network_output_dim,
            ..
        } = &mut self.variant
        {
            *network_input_dim = 3 * num_bones;
            *network_output_dim = sections.iter().map(|s| s.num_basis as usize).sum();
        }
    }

    /// Builds the input schema the editor would hand to the trainer.
    pub fn editor_input_info(&self, meshes: &dyn MeshQuery) -> InputInfo {
        let num_target_vertices = self
            .training_inputs
            .iter()
            .filter(|input| input.enabled)
            .find_map(|input| input.geometry_cache.as_ref())
            .map(|geometry| meshes.geometry_imported_vertices(geometry))
            .unwrap_or(0);

        InputInfo {
            bone_names: self.bone_include_list.clone(),
            curve_names: Vec::new(),
            num_base_vertices: self.cached_num_vertices,
            num_target_vertices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_type_accepts_all_spellings() {
        for raw in ["nmm", "NMM", " NeuralMorph ", "neural_morph", "NeuralMorphModel"] {
            assert_eq!(ModelType::resolve(raw).unwrap(), Some(ModelType::NeuralMorph));
        }
        for raw in ["nnm", "NearestNeighbor", "nearest_neighbor", "nearestneighbormodel"] {
            assert_eq!(ModelType::resolve(raw).unwrap(), Some(ModelType::NearestNeighbor));
        }
    }

    #[test]
    fn blank_model_type_keeps_current() {
        assert_eq!(ModelType::resolve("  ").unwrap(), None);
    }

    #[test]
    fn unknown_model_type_is_an_error() {
        assert!(matches!(
            ModelType::resolve("vertex_delta"),
            Err(OrchestratorError::UnsupportedModelType(raw)) if raw == "vertex_delta"
        ));
    }

    #[test]
    fn switching_keeps_shared_state() {
        let mut nmm = ModelConfiguration::new(ModelType::NeuralMorph);
        nmm.bone_include_list = vec!["root".into()];
        nmm.training_inputs.push(TrainingInput::default());
        nmm.settings.num_iterations = 5;

        let nnm = nmm.switched_to(ModelType::NearestNeighbor);
        assert_eq!(nnm.model_type(), ModelType::NearestNeighbor);
        assert_eq!(nnm.bone_include_list, nmm.bone_include_list);
        assert_eq!(nnm.training_inputs.len(), 1);
        assert_eq!(nnm.settings, TrainingSettings::default());
        assert!(nnm.supports_sections());
        assert!(nnm.neural_morph().is_none());
    }

    #[test]
    fn override_keys_match_serialized_keys() {
        let nmm = NeuralMorphSettings::default();
        let value = serde_json::to_value(&nmm).unwrap();
        for key in nmm.field_names() {
            assert!(value.get(key).is_some(), "missing {key}");
        }

        let nnm = NearestNeighborSettings::default();
        let value = serde_json::to_value(&nnm).unwrap();
        for key in nnm.field_names() {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
