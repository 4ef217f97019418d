//! Registry mapping action types to handlers

use crate::{
    error::{RegistryError, RegistryResult},
    handler::{ActionCapability, ActionHandler},
};
use secretact_core::{ActionEnvelope, ActionError, ActionKind, ActionResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Dispatch table from action type to handler.
///
/// Built once at start-up and shared behind an `Arc`; it carries no
/// per-request state and no knowledge of individual action types.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    handlers: BTreeMap<ActionKind, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own action type
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) -> RegistryResult<()> {
        let kind = handler.kind();
        if self.handlers.contains_key(&kind) {
            return Err(RegistryError::DuplicateHandler(kind));
        }
        debug!(action_type = %kind, "registered action handler");
        self.handlers.insert(kind, handler);
        Ok(())
    }

    /// Registered action types, sorted
    pub fn supported_types(&self) -> Vec<String> {
        self.handlers.keys().map(|k| k.as_str().to_string()).collect()
    }

    pub fn capabilities(&self) -> Vec<ActionCapability> {
        self.handlers.values().map(|h| h.capability()).collect()
    }

    /// Resolve the envelope's type to a handler and run it.
    ///
    /// On return the envelope is terminal: completed with a result, or
    /// failed with the returned error recorded on it.
    pub async fn dispatch(&self, envelope: &mut ActionEnvelope) -> ActionResult<()> {
        let Some(handler) = self.handlers.get(envelope.kind()).cloned() else {
            let err = ActionError::UnsupportedAction {
                kind: envelope.kind().to_string(),
                supported: self.supported_types(),
            };
            warn!(action_type = %envelope.kind(), "no handler registered");
            envelope.fail(&err);
            return Err(err);
        };

        envelope.begin();
        debug!(action_type = %envelope.kind(), "dispatching action");

        let outcome = match handler.handle(envelope).await {
            Ok(()) if envelope.result().is_some() => Ok(()),
            Ok(()) => Err(ActionError::Internal(format!(
                "handler for {} finished without a result",
                envelope.kind()
            ))),
            Err(err) => Err(err),
        };

        if let Err(err) = &outcome {
            envelope.fail(err);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use secretact_core::{ActionOutcome, ActionStatus, EnvelopeShape, SecretEntry};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ActionHandler for EchoHandler {
        fn kind(&self) -> ActionKind {
            ActionKind::new(ActionKind::RETRIEVE)
        }

        async fn handle(&self, envelope: &mut ActionEnvelope) -> ActionResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            envelope.complete(ActionOutcome::Secrets(vec![SecretEntry::new("A", "b")]));
            Ok(())
        }
    }

    struct RejectingHandler;

    #[async_trait]
    impl ActionHandler for RejectingHandler {
        fn kind(&self) -> ActionKind {
            ActionKind::new(ActionKind::DELETE)
        }

        async fn handle(&self, _envelope: &mut ActionEnvelope) -> ActionResult<()> {
            Err(ActionError::validation("object.identifier"))
        }
    }

    struct SilentHandler;

    #[async_trait]
    impl ActionHandler for SilentHandler {
        fn kind(&self) -> ActionKind {
            ActionKind::new(ActionKind::SEARCH)
        }

        async fn handle(&self, _envelope: &mut ActionEnvelope) -> ActionResult<()> {
            Ok(())
        }
    }

    fn registry(calls: Arc<AtomicUsize>) -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(EchoHandler { calls })).unwrap();
        registry.register(Arc::new(RejectingHandler)).unwrap();
        registry.register(Arc::new(SilentHandler)).unwrap();
        registry
    }

    #[tokio::test]
    async fn dispatches_to_registered_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry(calls.clone());
        let mut env = ActionEnvelope::new(ActionKind::RETRIEVE, EnvelopeShape::JsonLd);

        registry.dispatch(&mut env).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(env.status(), ActionStatus::Completed);
        assert!(env.start_time().is_some() && env.end_time().is_some());
    }

    #[tokio::test]
    async fn unknown_type_lists_supported_types() {
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let mut env = ActionEnvelope::new("FooAction", EnvelopeShape::JsonLd);

        let err = registry.dispatch(&mut env).await.unwrap_err();

        match err {
            ActionError::UnsupportedAction { kind, supported } => {
                assert_eq!(kind, "FooAction");
                assert_eq!(supported, vec!["DeleteAction", "RetrieveAction", "SearchAction"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(env.status(), ActionStatus::Failed);
        assert_eq!(env.error().unwrap().code, "UNSUPPORTED_ACTION");
    }

    #[tokio::test]
    async fn handler_errors_are_recorded_on_the_envelope() {
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let mut env = ActionEnvelope::new(ActionKind::DELETE, EnvelopeShape::Typed);

        let err = registry.dispatch(&mut env).await.unwrap_err();

        assert!(matches!(err, ActionError::Validation { .. }));
        assert_eq!(env.error().unwrap().message, "object.identifier is required");
        assert!(env.result().is_none());
    }

    #[tokio::test]
    async fn handler_without_result_fails_the_envelope() {
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let mut env = ActionEnvelope::new(ActionKind::SEARCH, EnvelopeShape::Typed);

        let err = registry.dispatch(&mut env).await.unwrap_err();

        assert!(matches!(err, ActionError::Internal(_)));
        assert_eq!(env.status(), ActionStatus::Failed);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(RejectingHandler)).unwrap();
        let err = registry.register(Arc::new(RejectingHandler)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateHandler(ref k) if k.as_str() == "DeleteAction"));
        assert_eq!(registry.capabilities()[0].description, "Handles DeleteAction");
    }
}
