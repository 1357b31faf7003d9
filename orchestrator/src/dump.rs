//! Serialises a model back into the payloads a setup request consumes.

use serde_json::{Map, Value};

use crate::{
    assets::AssetRef,
    configs::{ModelConfiguration, ModelVariant},
    requests::DumpResponse,
};

/// Describes `model` so that feeding the result back through setup
/// reproduces it.
pub fn dump_model(model: &ModelConfiguration) -> DumpResponse {
    let inputs: Vec<Value> = model.training_inputs.iter().map(|i| i.to_json()).collect();
    let sections: Vec<Value> = model.sections().iter().map(|s| s.to_json()).collect();

    DumpResponse {
        success: true,
        message: "Dump completed.".into(),
        model_type: model.model_type().code().to_string(),
        skeletal_mesh: path_of(model.skeletal_mesh.as_ref()),
        deformer_graph: path_of(model.viz.deformer_graph.as_ref()),
        test_anim: path_of(model.viz.test_anim_sequence.as_ref()),
        training_input_anims_json: Value::Array(inputs).to_string(),
        nnm_sections_json: Value::Array(sections).to_string(),
        model_overrides_json: Value::Object(overrides(model)).to_string(),
    }
}

fn path_of(asset: Option<&AssetRef>) -> String {
    asset.map(AssetRef::path).unwrap_or_default().to_string()
}

fn overrides(model: &ModelConfiguration) -> Map<String, Value> {
    let mut map = to_object(&model.settings);
    let variant = match &model.variant {
        ModelVariant::NeuralMorph(settings) => to_object(settings),
        ModelVariant::NearestNeighbor { settings, .. } => to_object(settings),
    };
    map.extend(variant);
    map
}

fn to_object<T: serde::Serialize>(settings: &T) -> Map<String, Value> {
    match serde_json::to_value(settings) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
