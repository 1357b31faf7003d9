//! Asset library manifests: the assets, mesh data and deformer assets the
//! command line front end works against.

use std::{collections::HashMap, fs, ops::Range, path::Path};

use anyhow::{Context, Result};
use orchestrator::{
    AssetEditor, AssetKind, AssetRef, AssetResolver, AssetSession, MeshQuery,
    configs::{ModelConfiguration, ModelType},
    normalize_asset_path,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub skeletal_meshes: Vec<SkeletalMeshEntry>,
    pub geometry_caches: Vec<GeometryCacheEntry>,
    pub anim_sequences: Vec<AnimSequenceEntry>,
    pub deformer_graphs: Vec<String>,
    pub deformers: Vec<DeformerEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SkeletalMeshEntry {
    pub path: String,
    /// Vertex range of each mesh part as `[start, end)`.
    pub vertex_ranges: Vec<(i32, i32)>,
    pub imported_vertices: i32,
    /// Defaults to the identity map over the imported vertices.
    pub import_vertex_map: Option<Vec<i32>>,
    pub bones: Vec<String>,
    pub source_parts: Vec<String>,
    pub needs_reimport: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeometryCacheEntry {
    pub path: String,
    pub tracks: Vec<String>,
    pub imported_vertices: i32,
    pub frames: i32,
    pub mapping_error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnimSequenceEntry {
    pub path: String,
    pub frames: i32,
}

#[derive(Debug, Deserialize)]
pub struct DeformerEntry {
    pub path: String,
    #[serde(default)]
    pub model_type: String,
}

/// The assets of a manifest, keyed by normalised object path.
#[derive(Debug, Default)]
pub struct Library {
    meshes: HashMap<String, SkeletalMeshEntry>,
    geometry: HashMap<String, GeometryCacheEntry>,
    anims: HashMap<String, AnimSequenceEntry>,
    graphs: Vec<String>,
    deformers: Vec<DeformerEntry>,
}

impl Library {
    /// Reads a JSON manifest from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read library '{}'", path.display()))?;
        let manifest: Manifest = serde_json::from_str(&text)
            .with_context(|| format!("invalid library '{}'", path.display()))?;
        Ok(Self::from_manifest(manifest))
    }

    pub fn from_manifest(manifest: Manifest) -> Self {
        let key = |path: &str| normalize_asset_path(path);
        Self {
            meshes: manifest.skeletal_meshes.into_iter().map(|m| (key(&m.path), m)).collect(),
            geometry: manifest.geometry_caches.into_iter().map(|g| (key(&g.path), g)).collect(),
            anims: manifest.anim_sequences.into_iter().map(|a| (key(&a.path), a)).collect(),
            graphs: manifest.deformer_graphs.iter().map(|g| key(g)).collect(),
            deformers: manifest.deformers,
        }
    }

    /// An editor holding a fresh model for every declared deformer asset.
    pub fn editor(&self) -> Result<DeformerEditor> {
        let mut models = HashMap::new();
        for deformer in &self.deformers {
            let model_type = ModelType::resolve(&deformer.model_type)
                .with_context(|| format!("deformer '{}'", deformer.path))?
                .unwrap_or(ModelType::NeuralMorph);
            models.insert(
                normalize_asset_path(&deformer.path),
                ModelConfiguration::new(model_type),
            );
        }
        Ok(DeformerEditor { models })
    }

    fn mesh(&self, asset: &AssetRef) -> Option<&SkeletalMeshEntry> {
        self.meshes.get(asset.path())
    }

    fn geometry(&self, asset: &AssetRef) -> Option<&GeometryCacheEntry> {
        self.geometry.get(asset.path())
    }
}

impl AssetResolver for Library {
    fn resolve(&self, path: &str, kind: AssetKind) -> Option<AssetRef> {
        let known = match kind {
            AssetKind::SkeletalMesh => self.meshes.contains_key(path),
            AssetKind::GeometryCache => self.geometry.contains_key(path),
            AssetKind::AnimSequence => self.anims.contains_key(path),
            AssetKind::DeformerGraph => self.graphs.iter().any(|g| g == path),
        };
        known.then(|| AssetRef::new(path, kind))
    }
}

impl MeshQuery for Library {
    fn mesh_vertex_ranges(&self, mesh: &AssetRef) -> Vec<Range<i32>> {
        self.mesh(mesh)
            .map(|m| m.vertex_ranges.iter().map(|&(start, end)| start..end).collect())
            .unwrap_or_default()
    }

    fn num_imported_vertices(&self, mesh: &AssetRef) -> i32 {
        self.mesh(mesh).map_or(0, |m| m.imported_vertices)
    }

    fn import_vertex_map(&self, mesh: &AssetRef) -> Vec<i32> {
        match self.mesh(mesh) {
            Some(SkeletalMeshEntry { import_vertex_map: Some(map), .. }) => map.clone(),
            Some(m) => (0..m.imported_vertices).collect(),
            None => Vec::new(),
        }
    }

    fn bone_names(&self, mesh: &AssetRef) -> Vec<String> {
        self.mesh(mesh).map(|m| m.bones.clone()).unwrap_or_default()
    }

    fn num_frames(&self, asset: &AssetRef) -> i32 {
        match asset.kind() {
            AssetKind::AnimSequence => self.anims.get(asset.path()).map_or(0, |a| a.frames),
            AssetKind::GeometryCache => self.geometry(asset).map_or(0, |g| g.frames),
            _ => 0,
        }
    }

    fn geometry_imported_vertices(&self, geometry: &AssetRef) -> i32 {
        self.geometry(geometry).map_or(0, |g| g.imported_vertices)
    }

    fn geometry_track_names(&self, geometry: &AssetRef) -> Vec<String> {
        self.geometry(geometry).map(|g| g.tracks.clone()).unwrap_or_default()
    }

    fn source_part_names(&self, mesh: &AssetRef) -> Vec<String> {
        self.mesh(mesh).map(|m| m.source_parts.clone()).unwrap_or_default()
    }

    fn mesh_mapping_error(&self, _mesh: &AssetRef, geometry: &AssetRef) -> Option<String> {
        self.geometry(geometry).and_then(|g| g.mapping_error.clone())
    }

    fn needs_reimport(&self, mesh: &AssetRef) -> bool {
        self.mesh(mesh).is_some_and(|m| m.needs_reimport)
    }
}

/// Holds the in-memory model of each deformer asset for one process run.
#[derive(Debug, Default)]
pub struct DeformerEditor {
    models: HashMap<String, ModelConfiguration>,
}

impl DeformerEditor {
    pub fn model(&self, asset_path: &str) -> Option<&ModelConfiguration> {
        self.models.get(&normalize_asset_path(asset_path))
    }
}

struct OpenDeformer<'e> {
    model: &'e mut ModelConfiguration,
    path: String,
}

impl AssetEditor for DeformerEditor {
    fn open(&mut self, asset_path: &str) -> Result<Box<dyn AssetSession + '_>, String> {
        let path = normalize_asset_path(asset_path);
        match self.models.get_mut(&path) {
            Some(model) => Ok(Box::new(OpenDeformer { model, path })),
            None => Err("no such deformer asset in the library".into()),
        }
    }
}

impl AssetSession for OpenDeformer<'_> {
    fn active_model(&mut self) -> Option<&mut ModelConfiguration> {
        Some(self.model)
    }

    fn switch_model_type(&mut self, model_type: ModelType, _force: bool) -> bool {
        *self.model = self.model.switched_to(model_type);
        true
    }

    fn mark_dirty(&mut self) {
        log::debug!("{} modified", self.path);
    }

    fn close(&mut self) {
        log::debug!("{} closed", self.path);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MANIFEST: &str = r#"{
        "skeletal_meshes": [{
            "path": "/Game/Body",
            "vertex_ranges": [[0, 6], [6, 10]],
            "imported_vertices": 10,
            "bones": ["root", "spine"],
            "source_parts": ["body:10"]
        }],
        "geometry_caches": [{"path": "/Game/WalkGeo", "tracks": ["body"], "imported_vertices": 10, "frames": 30}],
        "anim_sequences": [{"path": "/Game/Walk.Walk", "frames": 31}],
        "deformer_graphs": ["/Game/Graph"],
        "deformers": [{"path": "/Game/MLD_Body", "model_type": "nnm"}, {"path": "/Game/MLD_Face"}]
    }"#;

    fn load() -> Library {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();
        Library::load(file.path()).unwrap()
    }

    fn finds(library: &Library, path: &str, kind: AssetKind) -> bool {
        AssetResolver::load(library, path, kind).is_some()
    }

    #[test]
    fn resolves_by_normalised_path_and_kind() {
        let library = load();
        assert!(finds(&library, "/Game/Body", AssetKind::SkeletalMesh));
        assert!(finds(&library, "/Game/Walk", AssetKind::AnimSequence));
        assert!(finds(&library, "/Game/Graph.Graph", AssetKind::DeformerGraph));
        assert!(!finds(&library, "/Game/Body", AssetKind::GeometryCache));
    }

    #[test]
    fn answers_mesh_queries() {
        let library = load();
        let body = AssetRef::new("/Game/Body.Body", AssetKind::SkeletalMesh);
        assert_eq!(library.mesh_vertex_ranges(&body), vec![0..6, 6..10]);
        assert_eq!(library.import_vertex_map(&body), (0..10).collect::<Vec<_>>());
        assert_eq!(library.source_part_names(&body), vec!["body:10"]);
        assert!(!library.needs_reimport(&body));

        let walk = AssetRef::new("/Game/Walk.Walk", AssetKind::AnimSequence);
        assert_eq!(library.num_frames(&walk), 31);
    }

    #[test]
    fn editor_opens_declared_deformers() {
        let library = load();
        let mut editor = library.editor().unwrap();
        assert_eq!(
            editor.model("/Game/MLD_Body").map(ModelConfiguration::model_type),
            Some(ModelType::NearestNeighbor)
        );
        assert_eq!(
            editor.model("/Game/MLD_Face.MLD_Face").map(ModelConfiguration::model_type),
            Some(ModelType::NeuralMorph)
        );
        assert!(editor.open("/Game/Nope").is_err());
    }

    #[test]
    fn bad_manifests_are_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"deformers\": 3}").unwrap();
        let err = Library::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid library"));

        let library = Library::from_manifest(Manifest {
            deformers: vec![DeformerEntry { path: "/D".into(), model_type: "vdm".into() }],
            ..Manifest::default()
        });
        assert!(library.editor().is_err());
    }
}
