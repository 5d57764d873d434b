//! Analytics tags attached by hooks to their outcomes.
//!
//! Tags are opaque to the engine: they are carried through the outcome
//! tree untouched and consumed by analytics adapters downstream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The analytics payload a hook may attach to its result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    /// Activities the hook performed, in the order it reported them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<Activity>,
}

impl Analytics {
    /// Returns true if no activities were reported.
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

/// A single activity reported by a hook (e.g. an enrichment it applied).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity name, chosen by the module.
    pub name: String,

    /// Module-defined status tag, e.g. `success`.
    pub status: String,

    /// Free-form structured detail.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub values: Value,
}
