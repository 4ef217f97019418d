//! Handler trait implemented by every action type

use async_trait::async_trait;
use secretact_core::{ActionEnvelope, ActionKind, ActionResult, ResultSchema};
use serde::Serialize;

/// What a handler advertises about itself (docs endpoint, service registry)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCapability {
    pub action_type: ActionKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_schema: Option<ResultSchema>,
}

/// Executes one action type
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// The action type this handler is registered under
    fn kind(&self) -> ActionKind;

    fn description(&self) -> String {
        format!("Handles {}", self.kind())
    }

    /// Schema of the result this handler writes, if it has a fixed shape
    fn result_schema(&self) -> Option<ResultSchema> {
        None
    }

    fn capability(&self) -> ActionCapability {
        ActionCapability {
            action_type: self.kind(),
            description: self.description(),
            result_schema: self.result_schema(),
        }
    }

    /// Execute the action, writing the outcome into `envelope` via
    /// [`ActionEnvelope::complete`]. Errors are recorded on the envelope by
    /// the registry.
    async fn handle(&self, envelope: &mut ActionEnvelope) -> ActionResult<()>;
}
