//! REST convenience payloads and their translation into action envelopes
//!
//! Each request is rewritten into the JSON-LD document a client would send
//! to the semantic endpoint and decoded through the same parser, so both
//! entry points yield identical envelopes.

use crate::envelope::{ActionEnvelope, ActionKind};
use crate::error::{ActionError, ActionResult};
use crate::parser::parse_action_value;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

pub const SCHEMA_ORG: &str = "https://schema.org";

/// Body of `POST /secrets`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSecretRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub secret_path: Option<String>,
}

/// Body of `PUT /secrets/{key}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSecretRequest {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub secret_path: Option<String>,
}

/// Query string of `GET` and `DELETE /secrets/{key}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretQuery {
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub secret_path: Option<String>,
}

pub fn create_action(req: &CreateSecretRequest) -> ActionResult<ActionEnvelope> {
    let key = required("key", &req.key)?;
    let value = required("value", &req.value)?;
    let doc = action_doc(
        ActionKind::CREATE,
        "object",
        property_value(key, Some(value)),
        entry_point(&req.project_id, &req.environment, &req.secret_path),
    );
    to_envelope(doc)
}

pub fn search_action(key: &str, query: &SecretQuery) -> ActionResult<ActionEnvelope> {
    let key = required("key", key)?;
    let doc = action_doc(
        ActionKind::SEARCH,
        "query",
        JsonValue::String(key.to_string()),
        entry_point(&query.project_id, &query.environment, &query.secret_path),
    );
    to_envelope(doc)
}

pub fn update_action(key: &str, req: &UpdateSecretRequest) -> ActionResult<ActionEnvelope> {
    let key = required("key", key)?;
    let value = required("value", &req.value)?;
    let doc = action_doc(
        ActionKind::UPDATE,
        "object",
        property_value(key, Some(value)),
        entry_point(&req.project_id, &req.environment, &req.secret_path),
    );
    to_envelope(doc)
}

pub fn delete_action(key: &str, query: &SecretQuery) -> ActionResult<ActionEnvelope> {
    let key = required("key", key)?;
    let doc = action_doc(
        ActionKind::DELETE,
        "object",
        property_value(key, None),
        entry_point(&query.project_id, &query.environment, &query.secret_path),
    );
    to_envelope(doc)
}

fn required<'a>(name: &str, value: &'a str) -> ActionResult<&'a str> {
    if value.trim().is_empty() {
        return Err(ActionError::InvalidRequest(format!("{} is required", name)));
    }
    Ok(value)
}

fn property_value(key: &str, value: Option<&str>) -> JsonValue {
    let mut object = json!({"@type": "PropertyValue", "identifier": key});
    if let Some(value) = value {
        object["value"] = JsonValue::String(value.to_string());
    }
    object
}

/// Schema.org EntryPoint carrying only the fields that were supplied.
fn entry_point(
    project_id: &Option<String>,
    environment: &Option<String>,
    secret_path: &Option<String>,
) -> Option<JsonValue> {
    let mut target = Map::new();
    let fields = [
        ("actionPlatform", project_id),
        ("actionApplication", environment),
        ("urlTemplate", secret_path),
    ];
    for (key, value) in fields {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            target.insert(key.to_string(), JsonValue::String(v.to_string()));
        }
    }
    if target.is_empty() {
        return None;
    }
    target.insert("@type".to_string(), JsonValue::String("EntryPoint".into()));
    Some(JsonValue::Object(target))
}

fn action_doc(
    kind: &str,
    payload_key: &str,
    payload: JsonValue,
    target: Option<JsonValue>,
) -> JsonValue {
    let mut doc = json!({"@context": SCHEMA_ORG, "@type": kind});
    doc[payload_key] = payload;
    if let Some(target) = target {
        doc["target"] = target;
    }
    doc
}

fn to_envelope(doc: JsonValue) -> ActionResult<ActionEnvelope> {
    Ok(parse_action_value(doc)?.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_or_value_is_rejected() {
        let req = CreateSecretRequest { key: "".into(), value: "v".into(), ..Default::default() };
        let err = create_action(&req).unwrap_err();
        assert!(matches!(err, ActionError::InvalidRequest(ref m) if m == "key is required"));

        let req = UpdateSecretRequest { value: "  ".into(), ..Default::default() };
        let err = update_action("API_KEY", &req).unwrap_err();
        assert!(matches!(err, ActionError::InvalidRequest(ref m) if m == "value is required"));

        assert!(delete_action("", &SecretQuery::default()).is_err());
    }

    #[test]
    fn target_is_omitted_when_no_scope_is_given() {
        let env = search_action("DB_PASSWORD", &SecretQuery::default()).unwrap();
        assert!(env.target.is_none());
        assert_eq!(env.query.as_deref(), Some("DB_PASSWORD"));
    }

    #[test]
    fn empty_scope_fields_are_not_attached() {
        let query = SecretQuery {
            environment: Some("prod".into()),
            project_id: Some(String::new()),
            secret_path: None,
        };
        let env = delete_action("DB_PASSWORD", &query).unwrap();
        let target = env.target.unwrap();
        assert_eq!(target.environment.as_deref(), Some("prod"));
        assert_eq!(target.identifier, None);
        assert_eq!(env.object.unwrap().value, None);
    }
}
