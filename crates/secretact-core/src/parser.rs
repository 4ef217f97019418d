//! Decoding of inbound action documents into the canonical envelope
//!
//! Two shapes are accepted:
//! - JSON-LD documents keyed by `@type`, kept as an ordered property bag
//!   until [`RawAction::normalize`] maps the schema.org vocabulary
//!   (`actionPlatform`, `actionApplication`, `urlTemplate`, ...) onto
//!   typed fields;
//! - schema-typed documents keyed by `type` that use the canonical field
//!   names directly.
//!
//! Only the discriminator is checked here. Everything else is validated by
//! the handler that executes the action.

use crate::envelope::{ActionEnvelope, ActionKind, ActionObject, ActionTarget, EnvelopeShape};
use crate::error::{ActionError, ActionResult};
use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

/// Properties that only ever appear on processed envelopes
const OUTPUT_ONLY: &[&str] =
    &["actionStatus", "status", "startTime", "endTime", "result", "error"];

/// Property names a target field may be read from, in priority order
struct TargetKeys {
    url: &'static [&'static str],
    identifier: &'static [&'static str],
    environment: &'static [&'static str],
    secret_path: &'static [&'static str],
}

const JSON_LD_TARGET_KEYS: TargetKeys = TargetKeys {
    url: &["url", "siteUrl"],
    identifier: &["identifier", "projectId", "actionPlatform"],
    environment: &["environment", "actionApplication"],
    secret_path: &["secretPath", "urlTemplate", "path"],
};

const TYPED_TARGET_KEYS: TargetKeys = TargetKeys {
    url: &["url"],
    identifier: &["identifier"],
    environment: &["environment"],
    secret_path: &["secretPath"],
};

/// A decoded document before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawAction {
    Generic(GenericAction),
    Typed(TypedAction),
}

/// JSON-LD document held as an ordered property bag
#[derive(Debug, Clone, PartialEq)]
pub struct GenericAction {
    pub kind: ActionKind,
    pub properties: IndexMap<String, JsonValue>,
}

/// Schema-typed document; target fields use canonical names only
#[derive(Debug, Clone, PartialEq)]
pub struct TypedAction {
    pub kind: ActionKind,
    pub properties: IndexMap<String, JsonValue>,
}

/// Parse raw request bytes.
pub fn parse_action(body: &[u8]) -> ActionResult<RawAction> {
    let value: JsonValue = serde_json::from_slice(body)
        .map_err(|e| ActionError::Parse(format!("invalid JSON: {}", e)))?;
    parse_action_value(value)
}

/// Parse an already-decoded JSON document.
pub fn parse_action_value(value: JsonValue) -> ActionResult<RawAction> {
    let JsonValue::Object(mut map) = value else {
        return Err(ActionError::Parse("action must be a JSON object".into()));
    };

    if let Some(tag) = map.shift_remove("@type") {
        let kind = discriminator("@type", tag)?;
        let properties = map.into_iter().collect();
        return Ok(RawAction::Generic(GenericAction { kind, properties }));
    }

    match map.shift_remove("type") {
        Some(tag) => {
            let kind = discriminator("type", tag)?;
            let properties = map.into_iter().collect();
            Ok(RawAction::Typed(TypedAction { kind, properties }))
        }
        None => Err(ActionError::Parse("@type field is required".into())),
    }
}

/// Parse bytes straight into the canonical envelope.
pub fn parse_envelope(body: &[u8]) -> ActionResult<ActionEnvelope> {
    parse_action(body).map(RawAction::normalize)
}

fn discriminator(key: &str, tag: JsonValue) -> ActionResult<ActionKind> {
    match tag {
        JsonValue::String(s) if !s.trim().is_empty() => Ok(ActionKind::new(s)),
        JsonValue::String(_) => Err(ActionError::Parse(format!("{} must not be empty", key))),
        _ => Err(ActionError::Parse(format!("{} must be a string", key))),
    }
}

impl RawAction {
    pub fn kind(&self) -> &ActionKind {
        match self {
            RawAction::Generic(g) => &g.kind,
            RawAction::Typed(t) => &t.kind,
        }
    }

    /// Convert to the typed envelope.
    pub fn normalize(self) -> ActionEnvelope {
        match self {
            RawAction::Generic(g) => {
                normalize_properties(g.kind, EnvelopeShape::JsonLd, g.properties, &JSON_LD_TARGET_KEYS)
            }
            RawAction::Typed(t) => {
                normalize_properties(t.kind, EnvelopeShape::Typed, t.properties, &TYPED_TARGET_KEYS)
            }
        }
    }
}

/// Values of an unexpected JSON type are never rejected: recognised fields
/// fall back to the extra bag and are left for the handler to judge.
fn normalize_properties(
    kind: ActionKind,
    shape: EnvelopeShape,
    properties: IndexMap<String, JsonValue>,
    keys: &TargetKeys,
) -> ActionEnvelope {
    let mut envelope = ActionEnvelope::new(kind, shape);
    for (key, value) in properties {
        match (key.as_str(), value) {
            ("@context", JsonValue::String(ctx)) => envelope.context = Some(ctx),
            ("target", JsonValue::Object(bag)) => envelope.target = target_from_bag(&bag, keys),
            ("target", JsonValue::String(url)) => {
                envelope.target = non_empty(url).map(|url| ActionTarget {
                    url: Some(url),
                    ..Default::default()
                })
            }
            ("object", JsonValue::Object(bag)) => envelope.object = Some(object_from_bag(bag)),
            ("object", JsonValue::String(id)) => {
                envelope.object = Some(ActionObject {
                    identifier: non_empty(id),
                    ..Default::default()
                })
            }
            ("query", JsonValue::String(q)) => envelope.query = non_empty(q),
            (k, _) if OUTPUT_ONLY.contains(&k) => {}
            (_, value) => {
                envelope.extra.insert(key.clone(), value);
            }
        }
    }
    envelope
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn first_string(bag: &Map<String, JsonValue>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| bag.get(*k).and_then(JsonValue::as_str))
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn flag(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn target_from_bag(bag: &Map<String, JsonValue>, keys: &TargetKeys) -> Option<ActionTarget> {
    let target = ActionTarget {
        url: first_string(bag, keys.url),
        identifier: first_string(bag, keys.identifier),
        environment: first_string(bag, keys.environment),
        secret_path: first_string(bag, keys.secret_path),
        include_imports: bag.get("includeImports").and_then(flag),
    };
    (!target.is_empty()).then_some(target)
}

fn object_from_bag(bag: Map<String, JsonValue>) -> ActionObject {
    let mut object = ActionObject::default();
    for (key, value) in bag {
        match (key.as_str(), value) {
            ("@type", JsonValue::String(t)) => object.object_type = Some(t),
            ("identifier", JsonValue::String(id)) => object.identifier = non_empty(id),
            ("name", JsonValue::String(name)) if object.identifier.is_none() => {
                object.identifier = non_empty(name)
            }
            ("value", JsonValue::String(v)) => object.value = non_empty(v),
            ("value", v @ (JsonValue::Number(_) | JsonValue::Bool(_))) => {
                object.value = Some(v.to_string())
            }
            (_, value) => {
                object.properties.insert(key.clone(), value);
            }
        }
    }
    object
}
