use serde::Serialize;
use serde_json::{Map, Value};

use super::{
    Warnings,
    fields::{Bindable, Binder, FieldSlot},
    model::ModelConfiguration,
};
use crate::{
    assets::{AssetKind, AssetRef, MeshQuery},
    error::OrchestratorError,
    json,
};

pub const INPUTS_FIELD: &str = "training_input_anims_json";

/// One animation / geometry pair the model is trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingInput {
    pub anim_sequence: Option<AssetRef>,
    pub geometry_cache: Option<AssetRef>,
    pub enabled: bool,
    pub use_custom_range: bool,
    pub start_frame: i32,
    pub end_frame: i32,
}

impl Default for TrainingInput {
    fn default() -> Self {
        Self {
            anim_sequence: None,
            geometry_cache: None,
            enabled: true,
            use_custom_range: false,
            start_frame: 0,
            end_frame: 0,
        }
    }
}

impl TrainingInput {
    /// Both the animation and its ground truth geometry are set.
    pub fn is_valid(&self) -> bool {
        self.anim_sequence.is_some() && self.geometry_cache.is_some()
    }

    /// Number of frames this input contributes to the training set.
    pub fn num_frames_to_sample(&self, meshes: &dyn MeshQuery) -> i32 {
        let (Some(anim), Some(geometry)) = (&self.anim_sequence, &self.geometry_cache) else {
            return 0;
        };

        let total = meshes.num_frames(anim).min(meshes.num_frames(geometry));
        if total <= 0 {
            return 0;
        }
        if !self.use_custom_range {
            return total;
        }

        let start = self.start_frame.clamp(0, total - 1);
        let end = self.end_frame.clamp(0, total - 1);
        if end >= start { end - start + 1 } else { 0 }
    }

    /// The request payload form of this input.
    pub fn to_json(&self) -> Value {
        #[derive(Serialize)]
        struct Entry<'a> {
            anim_sequence: &'a str,
            geometry_cache: &'a str,
            enabled: bool,
            use_custom_range: bool,
            start_frame: i32,
            end_frame: i32,
        }

        let entry = Entry {
            anim_sequence: self.anim_sequence.as_ref().map_or("", AssetRef::path),
            geometry_cache: self.geometry_cache.as_ref().map_or("", AssetRef::path),
            enabled: self.enabled,
            use_custom_range: self.use_custom_range,
            start_frame: self.start_frame,
            end_frame: self.end_frame,
        };
        serde_json::to_value(entry).unwrap_or(Value::Null)
    }
}

impl Bindable for TrainingInput {
    fn field_names(&self) -> &'static [&'static str] {
        &[
            "anim_sequence",
            "geometry_cache",
            "enabled",
            "use_custom_range",
            "start_frame",
            "end_frame",
        ]
    }

    fn field(&mut self, name: &str) -> Option<FieldSlot<'_>> {
        Some(match name {
            "anim_sequence" => FieldSlot::Reference {
                slot: &mut self.anim_sequence,
                kind: AssetKind::AnimSequence,
            },
            "geometry_cache" => FieldSlot::Reference {
                slot: &mut self.geometry_cache,
                kind: AssetKind::GeometryCache,
            },
            "enabled" => FieldSlot::Bool(&mut self.enabled),
            "use_custom_range" => FieldSlot::Bool(&mut self.use_custom_range),
            "start_frame" => FieldSlot::Int(&mut self.start_frame),
            "end_frame" => FieldSlot::Int(&mut self.end_frame),
            _ => return None,
        })
    }
}

/// Decodes training input descriptors in array order.
///
/// Non-object elements are skipped. An element whose asset references do not
/// resolve is kept with those references unset, so indices stay aligned with
/// the source array for every well-formed entry.
pub fn decode_inputs(items: &[Value], binder: &Binder<'_>, warnings: &mut Warnings) -> Vec<TrainingInput> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| item.as_object().map(|item| (index, item)))
        .map(|(index, item)| decode_input(index, item, binder, warnings))
        .collect()
}

fn decode_input(
    index: usize,
    item: &Map<String, Value>,
    binder: &Binder<'_>,
    warnings: &mut Warnings,
) -> TrainingInput {
    let mut input = TrainingInput::default();

    for &key in input.field_names() {
        let Some(value) = item.get(key) else {
            continue;
        };
        let is_reference = matches!(key, "anim_sequence" | "geometry_cache");
        if is_reference && value.as_str().is_some_and(|s| s.trim().is_empty()) {
            continue;
        }
        if binder.bind(&mut input, key, value) {
            continue;
        }

        if is_reference {
            let path = value.as_str().map_or_else(|| value.to_string(), str::to_string);
            warnings.push(format!("Missing {key} asset: {path}"));
        } else {
            warnings.push(format!("Training input {index} {key} skipped"));
        }
    }

    input
}

/// Replaces the training inputs of `model` with the decoded `text`.
///
/// # Errors
/// A `Payload` error, leaving the model untouched, if `text` is not a JSON
/// array.
pub fn build_inputs(
    model: &mut ModelConfiguration,
    text: &str,
    binder: &Binder<'_>,
) -> Result<Vec<String>, OrchestratorError> {
    let items = json::parse_array(text).map_err(|source| OrchestratorError::Payload {
        field: INPUTS_FIELD,
        source,
    })?;

    let mut warnings = Warnings::new();
    model.training_inputs = decode_inputs(&items, binder, &mut warnings);
    Ok(warnings.into_vec())
}
