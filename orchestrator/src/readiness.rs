//! The readiness gate evaluated before every training run.

use crate::{
    assets::MeshQuery,
    configs::{ModelConfiguration, TrainingInput},
};

/// Why a model cannot be trained, grouped by the check that failed.
///
/// An empty string means the check passed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadinessErrors {
    pub inputs: String,
    pub base_asset: String,
    pub vertex_map: String,
    pub target_asset: String,
    pub skeletal_mesh: String,
}

impl ReadinessErrors {
    /// Every check with its label, in reporting order.
    pub fn labelled(&self) -> [(&'static str, &str); 5] {
        [
            ("inputs", &self.inputs),
            ("base_asset", &self.base_asset),
            ("vertex_map", &self.vertex_map),
            ("target_asset", &self.target_asset),
            ("skeletal_mesh", &self.skeletal_mesh),
        ]
    }

    pub fn is_clear(&self) -> bool {
        self.labelled().iter().all(|(_, text)| text.is_empty())
    }
}

/// Recomputes the frame count, the readiness errors and the ready flag of
/// `model` from the current asset data.
pub fn refresh(model: &mut ModelConfiguration, meshes: &dyn MeshQuery) {
    let num_training_frames = model
        .training_inputs
        .iter()
        .filter(|input| input.enabled && input.is_valid())
        .map(|input| input.num_frames_to_sample(meshes))
        .sum();

    model.editor.num_training_frames = num_training_frames;
    model.editor.readiness = ReadinessErrors {
        inputs: inputs_error(model, num_training_frames),
        base_asset: base_asset_error(model, meshes),
        vertex_map: vertex_map_error(model, meshes),
        target_asset: target_asset_error(model, meshes),
        skeletal_mesh: reimport_error(model, meshes),
    };
    model.editor.ready_for_training = model.editor.readiness.is_clear()
        && model.skeletal_mesh.is_some()
        && model.has_training_ground_truth()
        && num_training_frames > 0;

    log::debug!(
        ready = model.editor.ready_for_training,
        frames = num_training_frames;
        "readiness refreshed"
    );
}

fn inputs_error(model: &ModelConfiguration, num_training_frames: i32) -> String {
    if model.skeletal_mesh.is_none() {
        return "No skeletal mesh has been set.".into();
    }
    if num_usable_inputs(&model.training_inputs) == 0 {
        return "No enabled training input has both an animation and a geometry cache.".into();
    }
    if num_training_frames <= 0 {
        return "The training inputs contain no frames to sample.".into();
    }
    if model.supports_sections() {
        if model.sections().is_empty() {
            return "The model has no sections.".into();
        }
        if let Some(index) = model.sections().iter().position(|s| s.num_vertices() == 0) {
            return format!("Section {index} covers no vertices.");
        }
    }
    String::new()
}

fn base_asset_error(model: &ModelConfiguration, meshes: &dyn MeshQuery) -> String {
    let Some(mesh) = &model.skeletal_mesh else {
        return String::new();
    };
    let current = meshes.num_imported_vertices(mesh);
    if current == model.cached_num_vertices {
        return String::new();
    }
    format!(
        "Base mesh vertex count changed from {} to {current}.",
        model.cached_num_vertices
    )
}

fn vertex_map_error(model: &ModelConfiguration, meshes: &dyn MeshQuery) -> String {
    match &model.skeletal_mesh {
        Some(mesh) if meshes.import_vertex_map(mesh) != model.vertex_map => {
            "Base mesh vertex map changed.".into()
        }
        _ => String::new(),
    }
}

fn target_asset_error(model: &ModelConfiguration, meshes: &dyn MeshQuery) -> String {
    if model.skeletal_mesh.is_none() {
        return String::new();
    }

    let enabled = model.training_inputs.iter().enumerate().filter(|(_, i)| i.enabled);
    for (index, input) in enabled {
        let Some(geometry) = &input.geometry_cache else {
            continue;
        };
        let vertices = meshes.geometry_imported_vertices(geometry);
        if vertices > 0 && vertices != model.cached_num_vertices {
            return format!(
                "Target geometry of input {index} has {vertices} vertices, base mesh has {}.",
                model.cached_num_vertices
            );
        }
    }
    String::new()
}

fn reimport_error(model: &ModelConfiguration, meshes: &dyn MeshQuery) -> String {
    match &model.skeletal_mesh {
        Some(mesh) if meshes.needs_reimport(mesh) => "Skeletal mesh needs to be reimported.".into(),
        _ => String::new(),
    }
}

/// Number of training inputs that are enabled and fully referenced.
pub fn num_usable_inputs(inputs: &[TrainingInput]) -> usize {
    inputs.iter().filter(|i| i.enabled && i.is_valid()).count()
}

#[cfg(test)]
mod tests {
    use std::ops::Range;

    use super::*;
    use crate::{
        assets::{AssetKind, AssetRef},
        configs::{ModelType, Section},
    };

    struct Rig {
        vertices: i32,
        geometry_vertices: i32,
        reimport: bool,
    }

    impl MeshQuery for Rig {
        fn mesh_vertex_ranges(&self, _: &AssetRef) -> Vec<Range<i32>> {
            Vec::new()
        }
        fn num_imported_vertices(&self, _: &AssetRef) -> i32 {
            self.vertices
        }
        fn import_vertex_map(&self, _: &AssetRef) -> Vec<i32> {
            vec![0, 1, 2]
        }
        fn bone_names(&self, _: &AssetRef) -> Vec<String> {
            vec!["root".into()]
        }
        fn num_frames(&self, _: &AssetRef) -> i32 {
            30
        }
        fn geometry_imported_vertices(&self, _: &AssetRef) -> i32 {
            self.geometry_vertices
        }
        fn needs_reimport(&self, _: &AssetRef) -> bool {
            self.reimport
        }
    }

    fn ready_rig() -> Rig {
        Rig { vertices: 3, geometry_vertices: 3, reimport: false }
    }

    fn trained_input() -> TrainingInput {
        TrainingInput {
            anim_sequence: Some(AssetRef::new("/G/A.A", AssetKind::AnimSequence)),
            geometry_cache: Some(AssetRef::new("/G/C.C", AssetKind::GeometryCache)),
            ..TrainingInput::default()
        }
    }

    fn model(model_type: ModelType, rig: &Rig) -> ModelConfiguration {
        let mut model = ModelConfiguration::new(model_type);
        model.set_skeletal_mesh(AssetRef::new("/G/M.M", AssetKind::SkeletalMesh), rig);
        model.training_inputs.push(trained_input());
        model
    }

    #[test]
    fn complete_model_is_ready() {
        let rig = ready_rig();
        let mut model = model(ModelType::NeuralMorph, &rig);
        refresh(&mut model, &rig);
        assert!(model.editor.ready_for_training, "{:?}", model.editor.readiness);
        assert_eq!(model.editor.num_training_frames, 30);
    }

    #[test]
    fn no_ground_truth_is_not_ready() {
        let rig = ready_rig();
        let mut model = model(ModelType::NeuralMorph, &rig);
        model.training_inputs[0].geometry_cache = None;
        refresh(&mut model, &rig);
        assert!(!model.editor.ready_for_training);
        assert!(!model.editor.readiness.inputs.is_empty());
    }

    #[test]
    fn changed_base_mesh_is_reported() {
        let rig = ready_rig();
        let mut model = model(ModelType::NeuralMorph, &rig);
        let grown = Rig { vertices: 4, geometry_vertices: 3, reimport: true };
        refresh(&mut model, &grown);
        let errors = &model.editor.readiness;
        assert_eq!(errors.base_asset, "Base mesh vertex count changed from 3 to 4.");
        assert_eq!(errors.skeletal_mesh, "Skeletal mesh needs to be reimported.");
        assert!(errors.vertex_map.is_empty());
        assert!(!model.editor.ready_for_training);
    }

    #[test]
    fn mismatched_target_is_reported() {
        let rig = Rig { vertices: 3, geometry_vertices: 5, reimport: false };
        let mut model = model(ModelType::NeuralMorph, &rig);
        refresh(&mut model, &rig);
        assert!(model.editor.readiness.target_asset.contains("input 0 has 5 vertices"));
    }

    #[test]
    fn nearest_neighbor_needs_covering_sections() {
        let rig = ready_rig();
        let mut model = model(ModelType::NearestNeighbor, &rig);
        refresh(&mut model, &rig);
        assert_eq!(model.editor.readiness.inputs, "The model has no sections.");

        let empty = Section { vertex_map_string: " , ".into(), ..Section::default() };
        crate::configs::sections::replace_sections(&mut model, vec![empty]);
        refresh(&mut model, &rig);
        assert_eq!(model.editor.readiness.inputs, "Section 0 covers no vertices.");

        let whole = Section { vertex_map_string: "0-2".into(), ..Section::default() };
        crate::configs::sections::replace_sections(&mut model, vec![whole]);
        refresh(&mut model, &rig);
        assert!(model.editor.ready_for_training);
    }

    #[test]
    fn region_up_to_the_last_index_counts_as_covering() {
        let rig = ready_rig();
        let mut model = model(ModelType::NearestNeighbor, &rig);
        let widest = Section { vertex_map_string: "0-2147483647".into(), ..Section::default() };
        crate::configs::sections::replace_sections(&mut model, vec![widest]);
        refresh(&mut model, &rig);
        assert!(model.editor.readiness.inputs.is_empty());
        assert!(model.editor.ready_for_training);
    }

    #[test]
    fn usable_inputs_need_both_assets() {
        let mut disabled = trained_input();
        disabled.enabled = false;
        let inputs = [trained_input(), TrainingInput::default(), disabled];
        assert_eq!(num_usable_inputs(&inputs), 1);
    }
}
