#![allow(dead_code)]

use std::{collections::HashMap, ops::Range};

use orchestrator::{
    AssetEditor, AssetKind, AssetRef, AssetResolver, AssetSession, MeshQuery, Trainer,
    configs::{InputInfo, ModelConfiguration, ModelType},
};

pub const ASSET: &str = "/A/B";
pub const BODY: &str = "/Game/Body";
pub const WALK: &str = "/Game/Walk";
pub const WALK_GEO: &str = "/Game/WalkGeo";

/// An in-memory asset library with one skeletal mesh, one animation and its
/// ground truth geometry.
pub struct Stage {
    assets: Vec<(String, AssetKind)>,
    pub vertices: i32,
    pub frames: i32,
}

impl Default for Stage {
    fn default() -> Self {
        let assets = [
            ("/Game/Body.Body", AssetKind::SkeletalMesh),
            ("/Game/Walk.Walk", AssetKind::AnimSequence),
            ("/Game/WalkGeo.WalkGeo", AssetKind::GeometryCache),
            ("/Game/Graph.Graph", AssetKind::DeformerGraph),
        ];
        Self {
            assets: assets.into_iter().map(|(p, k)| (p.to_string(), k)).collect(),
            vertices: 100,
            frames: 24,
        }
    }
}

impl AssetResolver for Stage {
    fn resolve(&self, path: &str, kind: AssetKind) -> Option<AssetRef> {
        self.assets
            .iter()
            .any(|(p, k)| p == path && *k == kind)
            .then(|| AssetRef::new(path, kind))
    }
}

impl MeshQuery for Stage {
    fn mesh_vertex_ranges(&self, _: &AssetRef) -> Vec<Range<i32>> {
        vec![0..60, 60..self.vertices]
    }
    fn num_imported_vertices(&self, _: &AssetRef) -> i32 {
        self.vertices
    }
    fn import_vertex_map(&self, _: &AssetRef) -> Vec<i32> {
        (0..self.vertices).collect()
    }
    fn bone_names(&self, _: &AssetRef) -> Vec<String> {
        vec!["root".into(), "spine".into(), "neck".into(), "head".into()]
    }
    fn num_frames(&self, _: &AssetRef) -> i32 {
        self.frames
    }
    fn geometry_imported_vertices(&self, _: &AssetRef) -> i32 {
        self.vertices
    }
    fn geometry_track_names(&self, _: &AssetRef) -> Vec<String> {
        vec!["body".into()]
    }
}

/// Counts the session calls the core makes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Calls {
    pub opened: usize,
    pub closed: usize,
    pub dirty: usize,
    pub refreshed: usize,
    pub graph_updates: usize,
    pub switches: usize,
}

#[derive(Default)]
pub struct Editor {
    pub models: HashMap<String, ModelConfiguration>,
    pub refuse_switch: bool,
    pub calls: Calls,
}

impl Editor {
    pub fn with(asset_path: &str, model_type: ModelType) -> Self {
        let mut editor = Self::default();
        editor.models.insert(asset_path.to_string(), ModelConfiguration::new(model_type));
        editor
    }

    pub fn model(&self, asset_path: &str) -> &ModelConfiguration {
        &self.models[asset_path]
    }
}

struct OpenAsset<'e> {
    editor: &'e mut Editor,
    path: String,
}

impl AssetEditor for Editor {
    fn open(&mut self, asset_path: &str) -> Result<Box<dyn AssetSession + '_>, String> {
        if !self.models.contains_key(asset_path) {
            return Err("asset not found".into());
        }
        self.calls.opened += 1;
        Ok(Box::new(OpenAsset {
            editor: self,
            path: asset_path.to_string(),
        }))
    }
}

impl AssetSession for OpenAsset<'_> {
    fn active_model(&mut self) -> Option<&mut ModelConfiguration> {
        self.editor.models.get_mut(&self.path)
    }

    fn switch_model_type(&mut self, model_type: ModelType, _force: bool) -> bool {
        self.editor.calls.switches += 1;
        if self.editor.refuse_switch {
            return false;
        }
        let Some(model) = self.editor.models.get_mut(&self.path) else {
            return false;
        };
        *model = model.switched_to(model_type);
        true
    }

    fn refresh_components(&mut self) {
        self.editor.calls.refreshed += 1;
    }

    fn update_deformer_graph(&mut self) {
        self.editor.calls.graph_updates += 1;
    }

    fn mark_dirty(&mut self) {
        self.editor.calls.dirty += 1;
    }

    fn close(&mut self) {
        self.editor.calls.closed += 1;
    }
}

/// A trainer that returns a fixed code and records what it was asked to do.
pub struct FakeTrainer {
    pub code: i32,
    pub loads: bool,
    pub calls: usize,
    pub iterations_seen: Vec<i32>,
}

impl FakeTrainer {
    pub fn returning(code: i32) -> Self {
        Self {
            code,
            loads: true,
            calls: 0,
            iterations_seen: Vec::new(),
        }
    }
}

impl Trainer for FakeTrainer {
    fn train(&mut self, model: &ModelConfiguration) -> i32 {
        self.calls += 1;
        self.iterations_seen.push(model.settings.num_iterations);
        self.code
    }

    fn load_trained_network(&mut self, model: &ModelConfiguration) -> Option<InputInfo> {
        self.loads.then(|| model.editor.input_info.clone())
    }
}

/// A setup request payload with one complete training input.
pub fn walk_inputs() -> String {
    format!(r#"[{{"anim_sequence": "{WALK}", "geometry_cache": "{WALK_GEO}"}}]"#)
}
