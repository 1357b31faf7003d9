//! Asset references and the read-only query surfaces the core consumes.

use std::{fmt, ops::Range};

use serde::{Deserialize, Serialize};

/// The kinds of assets a request may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    AnimSequence,
    GeometryCache,
    SkeletalMesh,
    DeformerGraph,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AnimSequence => "anim_sequence",
            Self::GeometryCache => "geometry_cache",
            Self::SkeletalMesh => "skeletal_mesh",
            Self::DeformerGraph => "deformer_graph",
        };
        f.write_str(name)
    }
}

/// A resolved reference to an external asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRef {
    path: String,
    kind: AssetKind,
}

impl AssetRef {
    pub fn new<S: Into<String>>(path: S, kind: AssetKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// The normalised object path of the asset.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }
}

/// Expands a package path into an object path.
///
/// `/Game/Dir/Name` becomes `/Game/Dir/Name.Name`. Paths that already name an
/// object (contain a `.`) are only trimmed.
pub fn normalize_asset_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() || path.contains('.') {
        return path.to_string();
    }

    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => format!("{path}.{name}"),
        _ => path.to_string(),
    }
}

/// Looks assets up by path.
pub trait AssetResolver {
    /// Resolves a normalised object path to an asset of the expected kind.
    ///
    /// # Returns
    /// `None` if no asset of that kind lives at `path`.
    fn resolve(&self, path: &str, kind: AssetKind) -> Option<AssetRef>;

    /// Normalises `path` and resolves it.
    fn load(&self, path: &str, kind: AssetKind) -> Option<AssetRef> {
        let path = normalize_asset_path(path);
        if path.is_empty() {
            return None;
        }
        self.resolve(&path, kind)
    }
}

/// Read-only access to mesh, skeleton and geometry data.
pub trait MeshQuery {
    /// Vertex ranges of each mesh part of a skeletal mesh, end exclusive.
    fn mesh_vertex_ranges(&self, mesh: &AssetRef) -> Vec<Range<i32>>;

    /// Number of vertices imported for the skeletal mesh.
    fn num_imported_vertices(&self, mesh: &AssetRef) -> i32;

    /// Render vertex to imported vertex mapping of the first LOD.
    fn import_vertex_map(&self, mesh: &AssetRef) -> Vec<i32>;

    /// Names of every bone of the reference skeleton.
    fn bone_names(&self, mesh: &AssetRef) -> Vec<String>;

    /// Number of frames of an animation or geometry cache.
    fn num_frames(&self, asset: &AssetRef) -> i32;

    /// Number of vertices imported into a geometry cache.
    fn geometry_imported_vertices(&self, geometry: &AssetRef) -> i32;

    /// Names of the tracks of a geometry cache.
    fn geometry_track_names(&self, _geometry: &AssetRef) -> Vec<String> {
        Vec::new()
    }

    /// Source geometry parts of the mesh as `name:vertex_count`.
    fn source_part_names(&self, _mesh: &AssetRef) -> Vec<String> {
        Vec::new()
    }

    /// Why the geometry cache cannot be mapped onto the mesh, if it cannot.
    fn mesh_mapping_error(&self, _mesh: &AssetRef, _geometry: &AssetRef) -> Option<String> {
        None
    }

    /// Whether the skeletal mesh must be reimported before training.
    fn needs_reimport(&self, _mesh: &AssetRef) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_paths_gain_object_name() {
        assert_eq!(normalize_asset_path("/Game/Anims/Walk"), "/Game/Anims/Walk.Walk");
        assert_eq!(normalize_asset_path("  /A/B "), "/A/B.B");
    }

    #[test]
    fn object_paths_are_kept() {
        assert_eq!(normalize_asset_path("/Game/Anims/Walk.Walk"), "/Game/Anims/Walk.Walk");
        assert_eq!(normalize_asset_path(""), "");
        assert_eq!(normalize_asset_path("/Game/"), "/Game/");
    }
}
