use std::ops::RangeInclusive;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{
    Warnings,
    fields::{self, Bindable, Binder, FieldSlot},
    model::{ModelConfiguration, ModelVariant},
};
use crate::{
    assets::{AssetKind, AssetRef, MeshQuery},
    error::OrchestratorError,
    json,
};

pub const SECTIONS_FIELD: &str = "nnm_sections_json";

const DEFAULT_NUM_BASIS: i32 = 64;

/// A region of the base mesh trained with its own basis.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub mesh_index: i32,
    pub num_basis: i32,
    /// Vertex indices as comma separated `a-b` ranges or single indices.
    pub vertex_map_string: String,
    pub external_txt_file: Option<String>,
    pub neighbor_poses: Option<AssetRef>,
    pub neighbor_meshes: Option<AssetRef>,
    pub excluded_frames: Vec<i32>,
}

impl Default for Section {
    fn default() -> Self {
        Self {
            mesh_index: 0,
            num_basis: DEFAULT_NUM_BASIS,
            vertex_map_string: String::new(),
            external_txt_file: None,
            neighbor_poses: None,
            neighbor_meshes: None,
            excluded_frames: Vec::new(),
        }
    }
}

impl Section {
    /// The vertex ranges of the section, or `None` if the region is malformed.
    pub fn vertex_ranges(&self) -> Option<Vec<RangeInclusive<i32>>> {
        parse_vertex_map(&self.vertex_map_string)
    }

    /// Number of vertices the region covers. Malformed regions cover none.
    pub fn num_vertices(&self) -> usize {
        self.vertex_ranges()
            .map(|ranges| {
                ranges
                    .iter()
                    .map(|r| i64::from(*r.end()) - i64::from(*r.start()) + 1)
                    .map(|n| usize::try_from(n).unwrap_or(0))
                    .fold(0, usize::saturating_add)
            })
            .unwrap_or(0)
    }

    /// The request payload form of this section.
    pub fn to_json(&self) -> Value {
        #[derive(Serialize)]
        struct Entry<'a> {
            mesh_index: i32,
            num_pca_coeffs: i32,
            vertex_map_string: &'a str,
            external_txt_file: &'a str,
            neighbor_poses: &'a str,
            neighbor_meshes: &'a str,
            excluded_frames: &'a [i32],
        }

        let entry = Entry {
            mesh_index: self.mesh_index,
            num_pca_coeffs: self.num_basis,
            vertex_map_string: &self.vertex_map_string,
            external_txt_file: self.external_txt_file.as_deref().unwrap_or(""),
            neighbor_poses: self.neighbor_poses.as_ref().map_or("", AssetRef::path),
            neighbor_meshes: self.neighbor_meshes.as_ref().map_or("", AssetRef::path),
            excluded_frames: &self.excluded_frames,
        };
        serde_json::to_value(entry).unwrap_or(Value::Null)
    }
}

impl Bindable for Section {
    fn field_names(&self) -> &'static [&'static str] {
        &["neighbor_poses", "neighbor_meshes", "excluded_frames"]
    }

    fn field(&mut self, name: &str) -> Option<FieldSlot<'_>> {
        Some(match name {
            "neighbor_poses" => FieldSlot::Reference {
                slot: &mut self.neighbor_poses,
                kind: AssetKind::AnimSequence,
            },
            "neighbor_meshes" => FieldSlot::Reference {
                slot: &mut self.neighbor_meshes,
                kind: AssetKind::GeometryCache,
            },
            "excluded_frames" => FieldSlot::IntArray(&mut self.excluded_frames),
            _ => return None,
        })
    }
}

/// Parses `"0-99, 150, 200-299"` into inclusive ranges.
///
/// # Returns
/// `None` if any item is not an index or an ascending `a-b` pair.
pub fn parse_vertex_map(text: &str) -> Option<Vec<RangeInclusive<i32>>> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (start, end): (i32, i32) = match item.split_once('-') {
                Some((start, end)) => (start.trim().parse().ok()?, end.trim().parse().ok()?),
                None => {
                    let index = item.parse().ok()?;
                    (index, index)
                }
            };
            (0 <= start && start <= end).then_some(start..=end)
        })
        .collect()
}

/// Builds the default region for `mesh_index` of the model's skeletal mesh.
///
/// Uses the mesh part's vertex range when the mesh has one, otherwise the
/// whole imported vertex range. Empty if neither is known.
pub fn infer_vertex_map(model: &ModelConfiguration, mesh_index: i32, meshes: &dyn MeshQuery) -> String {
    let Some(mesh) = &model.skeletal_mesh else {
        return String::new();
    };

    let ranges = meshes.mesh_vertex_ranges(mesh);
    let part = usize::try_from(mesh_index).ok().and_then(|i| ranges.get(i));
    if let Some(range) = part.filter(|r| r.end > r.start) {
        return format!("{}-{}", range.start, range.end - 1);
    }

    match meshes.num_imported_vertices(mesh) {
        n if n > 0 => format!("0-{}", n - 1),
        _ => String::new(),
    }
}

/// Decodes section descriptors in array order, skipping non-objects.
///
/// Warnings name entries by their position in `items`.
pub fn decode_sections(
    items: &[Value],
    model: &ModelConfiguration,
    binder: &Binder<'_>,
    meshes: &dyn MeshQuery,
    warnings: &mut Warnings,
) -> Vec<Section> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| item.as_object().map(|item| (index, item)))
        .map(|(index, item)| decode_section(index, item, model, binder, meshes, warnings))
        .collect()
}

fn decode_section(
    index: usize,
    item: &Map<String, Value>,
    model: &ModelConfiguration,
    binder: &Binder<'_>,
    meshes: &dyn MeshQuery,
    warnings: &mut Warnings,
) -> Section {
    let int_field = |key: &str| item.get(key).and_then(fields::to_int);

    let mesh_index = int_field("mesh_index").unwrap_or(0);
    let vertex_map_string = match json::non_empty_str(item, "vertex_map_string") {
        Some(region) => region.to_string(),
        None => infer_vertex_map(model, mesh_index, meshes),
    };

    let mut section = Section {
        mesh_index,
        num_basis: int_field("num_pca_coeffs").unwrap_or(DEFAULT_NUM_BASIS).max(1),
        vertex_map_string,
        external_txt_file: json::non_empty_str(item, "external_txt_file").map(str::to_string),
        ..Section::default()
    };

    for key in ["neighbor_poses", "neighbor_meshes"] {
        let Some(path) = json::non_empty_str(item, key) else {
            continue;
        };
        if !binder.bind(&mut section, key, &Value::from(path)) {
            warnings.push(format!("NNM section {index} {key} failed: {path}"));
        }
    }

    if let Some(frames) = item.get("excluded_frames") {
        if !binder.bind(&mut section, "excluded_frames", frames) {
            warnings.push(format!("NNM section {index} excluded_frames failed"));
        }
    }

    section
}

/// Replaces every section of a nearest neighbor model.
///
/// Invalidates the trained network and recomputes the declared network
/// dimensions. Models without sections are left untouched.
pub fn replace_sections(model: &mut ModelConfiguration, new_sections: Vec<Section>) {
    let ModelVariant::NearestNeighbor { sections, .. } = &mut model.variant else {
        return;
    };
    *sections = new_sections;
    model.invalidate_training();
    model.update_network_dims();
}

/// Decodes `text` and replaces the sections of `model` with the result.
///
/// # Errors
/// A `Payload` error, leaving the model untouched, if `text` is not a JSON
/// array.
pub fn build_sections(
    model: &mut ModelConfiguration,
    text: &str,
    binder: &Binder<'_>,
    meshes: &dyn MeshQuery,
) -> Result<Vec<String>, OrchestratorError> {
    let items = json::parse_array(text).map_err(|source| OrchestratorError::Payload {
        field: SECTIONS_FIELD,
        source,
    })?;

    let mut warnings = Warnings::new();
    apply_sections(model, &items, binder, meshes, &mut warnings);
    Ok(warnings.into_vec())
}

pub(crate) fn apply_sections(
    model: &mut ModelConfiguration,
    items: &[Value],
    binder: &Binder<'_>,
    meshes: &dyn MeshQuery,
    warnings: &mut Warnings,
) {
    if !model.supports_sections() {
        if !items.is_empty() {
            warnings.push(format!(
                "{SECTIONS_FIELD} ignored: model does not support sections"
            ));
        }
        return;
    }

    let sections = decode_sections(items, model, binder, meshes, warnings);
    replace_sections(model, sections);
}
