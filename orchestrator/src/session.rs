use crate::{
    configs::{ModelConfiguration, ModelType},
    error::OrchestratorError,
};

/// Opens deformer assets for editing.
pub trait AssetEditor {
    /// Opens the asset at `asset_path`.
    ///
    /// # Errors
    /// A human readable reason if the asset cannot be opened.
    fn open(&mut self, asset_path: &str) -> Result<Box<dyn AssetSession + '_>, String>;
}

/// One asset opened for editing.
pub trait AssetSession {
    /// The model currently active in the editor, if any.
    fn active_model(&mut self) -> Option<&mut ModelConfiguration>;

    /// Replaces the active model with one of `model_type`.
    ///
    /// # Returns
    /// `false` if the switch was refused.
    fn switch_model_type(&mut self, model_type: ModelType, force: bool) -> bool;

    /// Notifies live consumers that the model changed.
    fn refresh_components(&mut self) {}

    /// Rebuilds the deformer graph bound to the model.
    fn update_deformer_graph(&mut self) {}

    /// Flags the asset as modified.
    fn mark_dirty(&mut self);

    fn close(&mut self);
}

/// Represents an open asset for the duration of one request.
/// The underlying session is closed when this value is dropped.
pub struct Session<'e> {
    inner: Box<dyn AssetSession + 'e>,
}

impl<'e> Session<'e> {
    /// Opens a new `Session`.
    ///
    /// # Arguments
    /// * `editor` - The editor that owns the asset.
    /// * `asset_path` - The path of the deformer asset.
    ///
    /// # Errors
    /// `EmptyAssetPath` for a blank path and `OpenFailed` if the editor
    /// cannot open it.
    pub fn open(editor: &'e mut dyn AssetEditor, asset_path: &str) -> Result<Self, OrchestratorError> {
        let asset_path = asset_path.trim();
        if asset_path.is_empty() {
            return Err(OrchestratorError::EmptyAssetPath);
        }

        log::debug!("opening {asset_path}");
        let inner = editor.open(asset_path).map_err(|msg| OrchestratorError::OpenFailed {
            asset_path: asset_path.to_string(),
            msg,
        })?;
        Ok(Self { inner })
    }

    /// Makes sure the active model is of the requested type.
    ///
    /// A blank `raw` keeps the current type. Switching only happens when the
    /// types differ.
    ///
    /// # Errors
    /// `UnsupportedModelType` for an unknown type and `SwitchFailed` if the
    /// session refuses to switch.
    pub fn ensure_model_type(&mut self, raw: &str, force: bool) -> Result<(), OrchestratorError> {
        let Some(requested) = ModelType::resolve(raw)? else {
            return Ok(());
        };

        let current = self.inner.active_model().map(|m| m.model_type());
        if current == Some(requested) {
            return Ok(());
        }

        log::info!("switching model type to {requested}");
        if self.inner.switch_model_type(requested, force) {
            let switched = self.inner.active_model().map(|m| m.model_type());
            if switched == Some(requested) {
                return Ok(());
            }
        }

        let current = self
            .inner
            .active_model()
            .map_or_else(|| "<none>".to_string(), |m| m.model_type().to_string());
        Err(OrchestratorError::SwitchFailed {
            requested: requested.to_string(),
            current,
        })
    }

    /// The active model.
    ///
    /// # Errors
    /// `NoActiveModel` if the editor has none.
    pub fn model_mut(&mut self) -> Result<&mut ModelConfiguration, OrchestratorError> {
        self.inner.active_model().ok_or(OrchestratorError::NoActiveModel)
    }

    pub fn refresh_components(&mut self) {
        self.inner.refresh_components();
    }

    pub fn update_deformer_graph(&mut self) {
        self.inner.update_deformer_graph();
    }

    pub fn mark_dirty(&mut self) {
        self.inner.mark_dirty();
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        closed: usize,
        switches: usize,
    }

    struct OneAsset {
        model: Option<ModelConfiguration>,
        refuse_switch: bool,
        log: Log,
    }

    struct Open<'a>(&'a mut OneAsset);

    impl AssetEditor for OneAsset {
        fn open(&mut self, asset_path: &str) -> Result<Box<dyn AssetSession + '_>, String> {
            match asset_path {
                "/A/B" => Ok(Box::new(Open(self))),
                _ => Err("not found".into()),
            }
        }
    }

    impl AssetSession for Open<'_> {
        fn active_model(&mut self) -> Option<&mut ModelConfiguration> {
            self.0.model.as_mut()
        }

        fn switch_model_type(&mut self, model_type: ModelType, _force: bool) -> bool {
            self.0.log.switches += 1;
            if self.0.refuse_switch {
                return false;
            }
            self.0.model = self.0.model.as_ref().map(|m| m.switched_to(model_type));
            true
        }

        fn mark_dirty(&mut self) {}

        fn close(&mut self) {
            self.0.log.closed += 1;
        }
    }

    fn asset(model_type: ModelType) -> OneAsset {
        OneAsset {
            model: Some(ModelConfiguration::new(model_type)),
            refuse_switch: false,
            log: Log::default(),
        }
    }

    #[test]
    fn blank_path_is_rejected_before_opening() {
        let mut editor = asset(ModelType::NeuralMorph);
        assert!(matches!(Session::open(&mut editor, "  "), Err(OrchestratorError::EmptyAssetPath)));
        assert_eq!(editor.log.closed, 0);
    }

    #[test]
    fn open_failures_carry_the_path() {
        let mut editor = asset(ModelType::NeuralMorph);
        let err = Session::open(&mut editor, "/X").err().unwrap();
        assert_eq!(err.to_string(), "Failed to open ML Deformer asset /X: not found");
    }

    #[test]
    fn session_closes_on_drop() {
        let mut editor = asset(ModelType::NeuralMorph);
        {
            let mut session = Session::open(&mut editor, "/A/B").unwrap();
            session.ensure_model_type("", true).unwrap();
        }
        assert_eq!(editor.log.closed, 1);
    }

    #[test]
    fn same_type_does_not_switch() {
        let mut editor = asset(ModelType::NeuralMorph);
        Session::open(&mut editor, "/A/B").unwrap().ensure_model_type("NMM", true).unwrap();
        assert_eq!(editor.log.switches, 0);
    }

    #[test]
    fn switches_to_other_type() {
        let mut editor = asset(ModelType::NeuralMorph);
        Session::open(&mut editor, "/A/B").unwrap().ensure_model_type("nnm", true).unwrap();
        assert_eq!(editor.log.switches, 1);
        assert_eq!(editor.model.unwrap().model_type(), ModelType::NearestNeighbor);
    }

    #[test]
    fn refused_switch_reports_both_types() {
        let mut editor = asset(ModelType::NeuralMorph);
        editor.refuse_switch = true;
        let err = Session::open(&mut editor, "/A/B")
            .unwrap()
            .ensure_model_type("nearest_neighbor", false)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "SwitchModelType failed. requested=NearestNeighborModel current=NeuralMorphModel"
        );
    }

    #[test]
    fn unknown_type_fails_without_switching() {
        let mut editor = asset(ModelType::NeuralMorph);
        let err = Session::open(&mut editor, "/A/B").unwrap().ensure_model_type("vdm", true).unwrap_err();
        assert!(matches!(err, OrchestratorError::UnsupportedModelType(_)));
        assert_eq!(editor.log.switches, 0);
    }
}
