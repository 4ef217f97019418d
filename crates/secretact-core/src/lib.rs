//! SecretAct core
//!
//! Canonical action envelope, the parser that produces it from JSON-LD or
//! typed documents, the REST adapter, masking helpers and the error
//! taxonomy shared by the other crates.

pub mod envelope;
pub mod error;
pub mod masking;
pub mod parser;
pub mod rest;

// Re-export commonly used types
pub use envelope::{
    ActionEnvelope, ActionFailure, ActionKind, ActionObject, ActionOutcome, ActionStatus,
    ActionTarget, EnvelopeShape, PropertyValueSpec, ResultSchema, SecretEntry, TargetField,
};
pub use error::{ActionError, ActionResult, BoxError};
pub use masking::{mask_credential, mask_json_value, mask_secret};
pub use parser::{parse_action, parse_action_value, parse_envelope, RawAction};
