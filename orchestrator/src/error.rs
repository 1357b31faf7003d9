use std::fmt;

use crate::json::JsonError;

/// All errors that abort a request before the model is touched.
#[derive(Debug)]
pub enum OrchestratorError {
    /// The request carried no asset path.
    EmptyAssetPath,
    /// The asset session could not be opened.
    OpenFailed { asset_path: String, msg: String },
    /// The requested model type matches no known variant.
    UnsupportedModelType(String),
    /// The asset session refused to switch variants.
    SwitchFailed { requested: String, current: String },
    /// The session has no model to configure or train.
    NoActiveModel,
    /// One of the JSON payloads of a request could not be decoded.
    Payload {
        field: &'static str,
        source: JsonError,
    },
    /// A non-empty skeletal mesh path did not resolve.
    SkeletalMeshNotFound(String),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAssetPath => write!(f, "asset_path is empty."),
            Self::OpenFailed { asset_path, msg } => {
                write!(f, "Failed to open ML Deformer asset {asset_path}: {msg}")
            }
            Self::UnsupportedModelType(raw) => write!(f, "Unsupported model_type: '{raw}'"),
            Self::SwitchFailed { requested, current } => {
                write!(f, "SwitchModelType failed. requested={requested} current={current}")
            }
            Self::NoActiveModel => write!(f, "No active model found after model switch."),
            Self::Payload { field, source } => write!(f, "{field} parse failed: {source}"),
            Self::SkeletalMeshNotFound(path) => write!(f, "Failed to load skeletal mesh: {path}"),
        }
    }
}

impl std::error::Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Payload { source, .. } => Some(source),
            _ => None,
        }
    }
}
