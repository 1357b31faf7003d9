//! Request and response shapes. Field names are the external contract.

use serde::{Deserialize, Serialize};

use crate::{error::OrchestratorError, training::TrainingOutcome};

/// Code reported when a request fails before training is classified.
pub const NOT_CLASSIFIED: i32 = -1;

/// Configures a deformer asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupRequest {
    pub asset_path: String,
    pub model_type: String,
    pub skeletal_mesh: String,
    pub deformer_graph: String,
    pub test_anim_sequence: String,
    pub training_input_anims_json: String,
    pub model_overrides_json: String,
    pub nnm_sections_json: String,
    pub force_switch: bool,
}

impl Default for SetupRequest {
    fn default() -> Self {
        Self {
            asset_path: String::new(),
            model_type: String::new(),
            skeletal_mesh: String::new(),
            deformer_graph: String::new(),
            test_anim_sequence: String::new(),
            training_input_anims_json: String::new(),
            model_overrides_json: String::new(),
            nnm_sections_json: String::new(),
            force_switch: true,
        }
    }
}

/// Trains a deformer asset as it is currently configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainRequest {
    pub asset_path: String,
    pub model_type: String,
    pub suppress_dialogs: bool,
    pub force_switch: bool,
}

impl Default for TrainRequest {
    fn default() -> Self {
        Self {
            asset_path: String::new(),
            model_type: String::new(),
            suppress_dialogs: true,
            force_switch: true,
        }
    }
}

impl From<&SetupRequest> for TrainRequest {
    fn from(setup: &SetupRequest) -> Self {
        Self {
            asset_path: setup.asset_path.clone(),
            model_type: setup.model_type.clone(),
            suppress_dialogs: true,
            force_switch: setup.force_switch,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpRequest {
    pub asset_path: String,
}

/// The answer to a setup, train or run request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    pub success: bool,
    pub message: String,
    pub warnings: Vec<String>,
    pub training_result_code: i32,
    pub duration_sec: f64,
    pub network_loaded: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            success: false,
            message: String::new(),
            warnings: Vec::new(),
            training_result_code: NOT_CLASSIFIED,
            duration_sec: 0.0,
            network_loaded: false,
        }
    }
}

impl Response {
    pub fn completed(message: &str, warnings: Vec<String>) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            warnings,
            ..Self::default()
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            message,
            ..Self::default()
        }
    }

    /// Copies the training fields of `outcome` into this response.
    pub fn with_outcome(self, outcome: TrainingOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message,
            training_result_code: outcome.result.code(),
            duration_sec: outcome.duration.as_secs_f64(),
            network_loaded: outcome.network_loaded,
            ..self
        }
    }
}

impl From<OrchestratorError> for Response {
    fn from(e: OrchestratorError) -> Self {
        Self::failed(e.to_string())
    }
}

/// A deformer asset's configuration in setup request form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpResponse {
    pub success: bool,
    pub message: String,
    pub model_type: String,
    pub skeletal_mesh: String,
    pub deformer_graph: String,
    pub test_anim: String,
    pub training_input_anims_json: String,
    pub nnm_sections_json: String,
    pub model_overrides_json: String,
}

impl DumpResponse {
    /// The setup request that reproduces the dumped configuration on
    /// `asset_path`.
    pub fn to_setup_request(&self, asset_path: &str) -> SetupRequest {
        SetupRequest {
            asset_path: asset_path.to_string(),
            model_type: self.model_type.clone(),
            skeletal_mesh: self.skeletal_mesh.clone(),
            deformer_graph: self.deformer_graph.clone(),
            test_anim_sequence: self.test_anim.clone(),
            training_input_anims_json: self.training_input_anims_json.clone(),
            model_overrides_json: self.model_overrides_json.clone(),
            nnm_sections_json: self.nnm_sections_json.clone(),
            force_switch: true,
        }
    }
}

impl From<OrchestratorError> for DumpResponse {
    fn from(e: OrchestratorError) -> Self {
        Self {
            message: e.to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let setup: SetupRequest = serde_json::from_str(r#"{"asset_path": "/A/B"}"#).unwrap();
        assert_eq!(setup.asset_path, "/A/B");
        assert!(setup.force_switch);
        assert!(setup.nnm_sections_json.is_empty());

        let train: TrainRequest = serde_json::from_str("{}").unwrap();
        assert!(train.suppress_dialogs);
        assert!(train.force_switch);
    }

    #[test]
    fn failures_are_unclassified() {
        let response = Response::from(OrchestratorError::EmptyAssetPath);
        assert!(!response.success);
        assert_eq!(response.message, "asset_path is empty.");
        assert_eq!(response.training_result_code, NOT_CLASSIFIED);
    }

    #[test]
    fn response_keys_are_stable() {
        let value = serde_json::to_value(Response::default()).unwrap();
        for key in [
            "success",
            "message",
            "warnings",
            "training_result_code",
            "duration_sec",
            "network_loaded",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
