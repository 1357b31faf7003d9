mod adapter;
pub mod fields;
pub mod inputs;
mod model;
pub mod overrides;
pub mod sections;

pub use adapter::{Adapter, SetupPlan};
pub use fields::{Bindable, Binder, EnumField, FieldSlot};
pub use inputs::TrainingInput;
pub use model::{
    EditorState, InputInfo, ModelConfiguration, ModelType, ModelVariant, NearestNeighborSettings,
    NeuralMorphMode, NeuralMorphSettings, TrainingSettings, VizSettings,
};
pub use sections::Section;

/// Non-fatal problems collected over one request.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Warnings(Vec<String>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and mirrors it to the log.
    pub fn push(&mut self, warning: String) {
        log::warn!("{warning}");
        self.0.push(warning);
    }

    pub fn extend(&mut self, warnings: impl IntoIterator<Item = String>) {
        for warning in warnings {
            self.push(warning);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}
