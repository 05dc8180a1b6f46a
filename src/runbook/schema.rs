//! Runbook schema definitions.
//!
//! Mirrors the JSON representation used by the runbook automation service.
//! Only the fields the sync engine reads or rewrites are typed; everything
//! else is carried through untouched so an exported file can be re-imported
//! without losing data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A runbook definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Runbook {
    /// Identifier, stable across export and standard fetch modes
    #[serde(rename = "_runbookId", default)]
    pub id: String,

    /// Name of the runbook
    #[serde(default)]
    pub name: String,

    /// Description of what this runbook does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered steps
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Automations keyed by automation id
    #[serde(default)]
    pub automations: BTreeMap<String, Vec<Automation>>,

    /// Runbook parameters
    #[serde(default)]
    pub parameters: Vec<Value>,

    /// Tags attached to the runbook
    #[serde(default)]
    pub tags: Vec<Value>,

    /// Fields the sync engine does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A step in the runbook.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Step {
    /// 1-based step number, aligned with the step's position
    pub number: u32,

    /// Rich-text (HTML) description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Automation invoked by this step
    #[serde(rename = "automationId", default, skip_serializing_if = "Option::is_none")]
    pub automation_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference to an executable automation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Automation {
    /// Automation name
    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Runbook {
    /// Get the number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Whether any automation is bound to this runbook.
    pub fn has_automations(&self) -> bool {
        !self.automations.is_empty()
    }

    /// Compare the fields that decide whether a remote copy needs patching.
    ///
    /// Automations, the identifier and unmodelled fields are not compared.
    pub fn same_content(&self, other: &Self) -> bool {
        self.steps == other.steps
            && self.parameters == other.parameters
            && self.tags == other.tags
            && self.name == other.name
            && self.description == other.description
    }

    /// Find a step by its number.
    pub fn step_mut(&mut self, number: u32) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.number == number)
    }
}

impl Step {
    /// Whether the step carries a non-empty description.
    pub fn has_description(&self) -> bool {
        self.description.as_deref().is_some_and(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Runbook {
        serde_json::from_value(json!({
            "_runbookId": "rb-1",
            "name": "Restart service",
            "description": "Restarts the web tier",
            "steps": [
                { "number": 1, "description": "<p>Check health</p>", "automationId": "auto-1" },
                { "number": 2, "title": "Manual step" }
            ],
            "automations": {
                "auto-1": [{ "name": "restart-web", "_automationId": "auto-1" }]
            },
            "parameters": [{ "name": "host", "default": "web01" }],
            "tags": ["web"],
            "revision": 7
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_runbook_json() {
        let runbook = sample();

        assert_eq!(runbook.id, "rb-1");
        assert_eq!(runbook.step_count(), 2);
        assert_eq!(runbook.steps[0].automation_id.as_deref(), Some("auto-1"));
        assert!(runbook.has_automations());
        assert_eq!(runbook.extra.get("revision"), Some(&json!(7)));
        assert_eq!(runbook.steps[1].extra.get("title"), Some(&json!("Manual step")));
    }

    #[test]
    fn test_unknown_fields_survive_serialization() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["revision"], json!(7));
        assert_eq!(value["steps"][1]["title"], json!("Manual step"));
        assert_eq!(value["automations"]["auto-1"][0]["_automationId"], json!("auto-1"));
        assert!(value["steps"][1].get("description").is_none());
    }

    #[test]
    fn test_same_content_for_copies() {
        let a = sample();
        let b = a.clone();
        assert!(a.same_content(&b));
    }

    #[test]
    fn test_same_content_ignores_id_and_automations() {
        let a = sample();
        let mut b = a.clone();
        b.id = "other".to_string();
        b.automations.clear();
        b.extra.insert("revision".to_string(), json!(8));
        assert!(a.same_content(&b));
    }

    #[test]
    fn test_same_content_detects_each_field() {
        let a = sample();

        let mut b = a.clone();
        b.name.push('!');
        assert!(!a.same_content(&b));

        let mut b = a.clone();
        b.description = None;
        assert!(!a.same_content(&b));

        let mut b = a.clone();
        b.steps[1].description = Some("new".to_string());
        assert!(!a.same_content(&b));

        let mut b = a.clone();
        b.parameters.clear();
        assert!(!a.same_content(&b));

        let mut b = a.clone();
        b.tags.push(json!("db"));
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_step_has_description() {
        let mut step = Step { number: 1, ..Default::default() };
        assert!(!step.has_description());
        step.description = Some(String::new());
        assert!(!step.has_description());
        step.description = Some("<p>x</p>".to_string());
        assert!(step.has_description());
    }
}
