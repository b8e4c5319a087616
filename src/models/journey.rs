use serde::{Deserialize, Serialize};

use super::action::ActionInContext;

/// A named, ordered group of actions forming one logical unit of a journey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<ActionInContext>,
}

impl Step {
    pub fn new(name: impl Into<String>, actions: Vec<ActionInContext>) -> Self {
        Self {
            name: name.into(),
            actions,
        }
    }

    /// Name a step after its first action when the UI supplied none
    pub fn untitled(actions: Vec<ActionInContext>) -> Self {
        let name = actions
            .first()
            .map(|a| a.action.title())
            .unwrap_or_else(|| "Empty step".to_string());
        Self { name, actions }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Ordered sequence of steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Journey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Journey {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { name: None, steps }
    }

    /// All actions of all steps, in order
    pub fn actions(&self) -> impl Iterator<Item = &ActionInContext> {
        self.steps.iter().flat_map(|s| s.actions.iter())
    }

    pub fn action_count(&self) -> usize {
        self.steps.iter().map(|s| s.actions.len()).sum()
    }
}
