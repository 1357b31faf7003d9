//! Single-line explanation of why a model is not ready for training.

use crate::{
    assets::{AssetRef, MeshQuery},
    configs::ModelConfiguration,
};

const PREFIX: &str = "Model is not ready for training.";
const FALLBACK: &str = "Check inputs (skeletal mesh / animation / geom cache / sections).";
const SEPARATOR: &str = " | ";

/// Builds the not-ready message from the readiness errors last computed by
/// [`crate::readiness::refresh`] and per-input diagnostics.
///
/// Missing data sources are skipped, never reported as errors.
pub fn collect(model: &ModelConfiguration, meshes: &dyn MeshQuery) -> String {
    let mut lines: Vec<String> = model
        .editor
        .readiness
        .labelled()
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(label, text)| format!("{label}={text}"))
        .collect();

    lines.push(format!(
        "diag:num_inputs={} training_frames={} has_ground_truth={} has_skel={}",
        model.training_inputs.len(),
        model.editor.num_training_frames,
        flag(model.has_training_ground_truth()),
        flag(model.skeletal_mesh.is_some()),
    ));

    for (index, input) in model.training_inputs.iter().enumerate() {
        let tag = format!("diag:input[{index}]");
        lines.push(format!(
            "{tag}:enabled={} valid={}",
            flag(input.enabled),
            flag(input.is_valid())
        ));
        lines.push(format!(
            "{tag}:anim={} geom={} use_range={} start={} end={} frames_to_sample={}",
            path_or_null(input.anim_sequence.as_ref()),
            path_or_null(input.geometry_cache.as_ref()),
            flag(input.use_custom_range),
            input.start_frame,
            input.end_frame,
            input.num_frames_to_sample(meshes),
        ));

        let Some(geometry) = &input.geometry_cache else {
            continue;
        };
        let source_parts = model
            .skeletal_mesh
            .as_ref()
            .map(|mesh| meshes.source_part_names(mesh))
            .unwrap_or_default();

        lines.push(format!("{tag}:geom_tracks={}", join(&meshes.geometry_track_names(geometry))));
        lines.push(format!(
            "{tag}:geom_imported_vertices={}",
            meshes.geometry_imported_vertices(geometry)
        ));
        lines.push(format!("{tag}:skel_source_parts={}", join(&source_parts)));

        let mapping_error = model
            .skeletal_mesh
            .as_ref()
            .and_then(|mesh| meshes.mesh_mapping_error(mesh, geometry))
            .filter(|e| !e.is_empty());
        if let Some(error) = mapping_error {
            lines.push(format!("{tag}:geom_mapping_error={}", error.replace('|', "/")));
        }
    }

    format_message(&lines)
}

fn format_message(lines: &[String]) -> String {
    if lines.is_empty() {
        format!("{PREFIX} {FALLBACK}")
    } else {
        format!("{PREFIX} {}", lines.join(SEPARATOR))
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn path_or_null(asset: Option<&AssetRef>) -> &str {
    asset.map_or("<null>", AssetRef::path)
}

fn join(names: &[String]) -> String {
    if names.is_empty() {
        "<none>".to_string()
    } else {
        names.join(",")
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Range;

    use super::*;
    use crate::{
        assets::{AssetKind, AssetRef},
        configs::{ModelType, TrainingInput},
        readiness,
    };

    struct Rig;

    impl MeshQuery for Rig {
        fn mesh_vertex_ranges(&self, _: &AssetRef) -> Vec<Range<i32>> {
            Vec::new()
        }
        fn num_imported_vertices(&self, _: &AssetRef) -> i32 {
            8
        }
        fn import_vertex_map(&self, _: &AssetRef) -> Vec<i32> {
            Vec::new()
        }
        fn bone_names(&self, _: &AssetRef) -> Vec<String> {
            Vec::new()
        }
        fn num_frames(&self, _: &AssetRef) -> i32 {
            10
        }
        fn geometry_imported_vertices(&self, _: &AssetRef) -> i32 {
            8
        }
        fn geometry_track_names(&self, _: &AssetRef) -> Vec<String> {
            vec!["body".into(), "head".into()]
        }
        fn mesh_mapping_error(&self, _: &AssetRef, _: &AssetRef) -> Option<String> {
            Some("track head|body unmatched".into())
        }
    }

    #[test]
    fn empty_model_reports_inputs_and_summary() {
        let mut model = ModelConfiguration::new(ModelType::NeuralMorph);
        readiness::refresh(&mut model, &Rig);
        assert_eq!(
            collect(&model, &Rig),
            "Model is not ready for training. inputs=No skeletal mesh has been set. | \
             diag:num_inputs=0 training_frames=0 has_ground_truth=0 has_skel=0"
        );
    }

    #[test]
    fn geometry_inputs_get_detail_lines() {
        let mut model = ModelConfiguration::new(ModelType::NeuralMorph);
        model.set_skeletal_mesh(AssetRef::new("/G/M.M", AssetKind::SkeletalMesh), &Rig);
        model.training_inputs.push(TrainingInput {
            geometry_cache: Some(AssetRef::new("/G/C.C", AssetKind::GeometryCache)),
            use_custom_range: true,
            end_frame: 4,
            ..TrainingInput::default()
        });
        readiness::refresh(&mut model, &Rig);

        let message = collect(&model, &Rig);
        let lines: Vec<&str> = message.split(SEPARATOR).collect();
        assert!(lines[0].starts_with("Model is not ready for training. inputs="));
        assert!(lines.contains(&"diag:num_inputs=1 training_frames=0 has_ground_truth=1 has_skel=1"));
        assert!(lines.contains(&"diag:input[0]:enabled=1 valid=0"));
        assert!(lines.contains(
            &"diag:input[0]:anim=<null> geom=/G/C.C use_range=1 start=0 end=4 frames_to_sample=0"
        ));
        assert!(lines.contains(&"diag:input[0]:geom_tracks=body,head"));
        assert!(lines.contains(&"diag:input[0]:geom_imported_vertices=8"));
        assert!(lines.contains(&"diag:input[0]:skel_source_parts=<none>"));
        assert!(lines.contains(&"diag:input[0]:geom_mapping_error=track head/body unmatched"));
    }

    #[test]
    fn no_lines_falls_back() {
        assert_eq!(
            format_message(&[]),
            "Model is not ready for training. Check inputs (skeletal mesh / animation / geom cache / sections)."
        );
    }
}
