use serde_json::{Map, Value};

use super::{
    Warnings,
    fields::{self, Bindable, Binder, FieldSlot},
    model::ModelConfiguration,
};
use crate::{error::OrchestratorError, json};

pub const OVERRIDES_FIELD: &str = "model_overrides_json";

/// Applies the hyperparameter overrides in `text` to `model`.
///
/// The shared training table is applied first, then the table of the model's
/// own variant. Keys in neither table are ignored.
///
/// # Returns
/// One `"Override skipped: <key>"` warning per known key that did not bind.
///
/// # Errors
/// A `Payload` error, leaving the model untouched, if `text` is not a JSON
/// object.
pub fn apply_overrides(
    model: &mut ModelConfiguration,
    text: &str,
    binder: &Binder<'_>,
) -> Result<Vec<String>, OrchestratorError> {
    let overrides = json::parse_object(text).map_err(|source| OrchestratorError::Payload {
        field: OVERRIDES_FIELD,
        source,
    })?;

    let mut warnings = Warnings::new();
    apply_override_map(model, &overrides, binder, &mut warnings);
    Ok(warnings.into_vec())
}

pub(crate) fn apply_override_map(
    model: &mut ModelConfiguration,
    overrides: &Map<String, Value>,
    binder: &Binder<'_>,
    warnings: &mut Warnings,
) {
    if overrides.is_empty() {
        return;
    }

    apply_table(&mut model.settings, overrides, binder, warnings);
    apply_table(model.variant.settings_mut(), overrides, binder, warnings);
}

fn apply_table(
    target: &mut dyn Bindable,
    overrides: &Map<String, Value>,
    binder: &Binder<'_>,
    warnings: &mut Warnings,
) {
    for &key in target.field_names() {
        let Some(value) = overrides.get(key) else {
            continue;
        };
        // An empty topology never replaces the current one.
        if is_int_array(target, key) && fields::to_int_array(value).is_some_and(|v| v.is_empty()) {
            continue;
        }
        if !binder.bind(target, key, value) {
            warnings.push(format!("Override skipped: {key}"));
        }
    }
}

fn is_int_array(target: &mut dyn Bindable, key: &str) -> bool {
    matches!(target.field(key), Some(FieldSlot::IntArray(_)))
}
