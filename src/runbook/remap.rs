//! Automation id remapping.
//!
//! Export-mode fetches label automations with stable placeholder ids, while
//! the service only resolves its live internal ids on import. Exported
//! runbooks are rewritten to the internal ids by pairing each step with the
//! step at the same position in a standard-mode fetch of the same runbook.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use super::Runbook;

/// Errors raised while pairing export-mode and standard-mode runbooks.
#[derive(Debug, thiserror::Error)]
pub enum RemapError {
    #[error("Runbook {id}: export has {exported} step(s) but service returned {standard}")]
    StepCountMismatch { id: String, exported: usize, standard: usize },

    #[error("Runbook {id}: step {exported} at position {position} is step {standard} in service")]
    StepMismatch { id: String, position: usize, exported: u32, standard: u32 },

    #[error("Runbook {id}: step {step} references automation {placeholder} with no internal id")]
    MissingAutomation { id: String, step: u32, placeholder: String },

    #[error("Runbook {id}: automation {placeholder} maps to both {first} and {second}")]
    ConflictingAutomation { id: String, placeholder: String, first: String, second: String },
}

/// Placeholder automation id to internal automation id.
pub type IdMap = HashMap<String, String>;

/// Pair the automation ids of an export-mode runbook with a standard-mode one.
///
/// Steps are matched by position; both fetches must list the same steps in
/// the same order.
pub fn correspondence(exported: &Runbook, standard: &Runbook) -> Result<IdMap, RemapError> {
    if exported.steps.len() != standard.steps.len() {
        return Err(RemapError::StepCountMismatch {
            id: exported.id.clone(),
            exported: exported.steps.len(),
            standard: standard.steps.len(),
        });
    }

    let mut ids = IdMap::new();
    for (position, (ex, st)) in exported.steps.iter().zip(&standard.steps).enumerate() {
        if ex.number != st.number {
            return Err(RemapError::StepMismatch {
                id: exported.id.clone(),
                position,
                exported: ex.number,
                standard: st.number,
            });
        }

        let Some(placeholder) = &ex.automation_id else { continue };
        let Some(internal) = &st.automation_id else {
            return Err(RemapError::MissingAutomation {
                id: exported.id.clone(),
                step: ex.number,
                placeholder: placeholder.clone(),
            });
        };

        match ids.get(placeholder) {
            Some(existing) if existing != internal => {
                return Err(RemapError::ConflictingAutomation {
                    id: exported.id.clone(),
                    placeholder: placeholder.clone(),
                    first: existing.clone(),
                    second: internal.clone(),
                });
            }
            Some(_) => {}
            None => {
                ids.insert(placeholder.clone(), internal.clone());
            }
        }
    }

    Ok(ids)
}

/// Replace placeholder automation ids in steps and the automations mapping.
///
/// Only whole values equal to a placeholder are replaced; ids embedded in
/// longer strings are left alone.
pub fn apply(runbook: &mut Runbook, ids: &IdMap) {
    if ids.is_empty() {
        return;
    }

    for step in &mut runbook.steps {
        if let Some(id) = step.automation_id.as_mut() {
            replace_id(id, ids);
        }
        for value in step.extra.values_mut() {
            replace_in_value(value, ids);
        }
    }

    let automations = std::mem::take(&mut runbook.automations);
    runbook.automations = automations
        .into_iter()
        .map(|(mut key, mut entries)| {
            replace_id(&mut key, ids);
            for entry in &mut entries {
                for value in entry.extra.values_mut() {
                    replace_in_value(value, ids);
                }
            }
            (key, entries)
        })
        .collect::<BTreeMap<_, _>>();
}

/// Rewrite an export-mode runbook to internal automation ids.
pub fn remap(exported: &mut Runbook, standard: &Runbook) -> Result<(), RemapError> {
    let ids = correspondence(exported, standard)?;
    tracing::debug!(runbook = %exported.id, pairs = ids.len(), "Remapping automation ids");
    apply(exported, &ids);
    Ok(())
}

fn replace_id(id: &mut String, ids: &IdMap) {
    if let Some(internal) = ids.get(id.as_str()) {
        id.clone_from(internal);
    }
}

fn replace_in_value(value: &mut Value, ids: &IdMap) {
    match value {
        Value::String(s) => replace_id(s, ids),
        Value::Array(items) => items.iter_mut().for_each(|v| replace_in_value(v, ids)),
        Value::Object(map) => map.values_mut().for_each(|v| replace_in_value(v, ids)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
