//! Canonical in-memory representation of one requested action

use crate::error::{ActionError, ActionResult};
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// Action type tag (`@type` in JSON-LD, `type` in typed documents)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionKind(pub String);

impl ActionKind {
    pub const RETRIEVE: &'static str = "RetrieveAction";
    pub const SEARCH: &'static str = "SearchAction";
    pub const CREATE: &'static str = "CreateAction";
    pub const UPDATE: &'static str = "UpdateAction";
    pub const DELETE: &'static str = "DeleteAction";

    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

/// Input shape an envelope arrived in; responses are rendered the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnvelopeShape {
    #[default]
    JsonLd,
    Typed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Failed,
}

impl ActionStatus {
    pub fn label(self, shape: EnvelopeShape) -> &'static str {
        match (shape, self) {
            (EnvelopeShape::JsonLd, ActionStatus::Pending) => "PotentialActionStatus",
            (EnvelopeShape::JsonLd, ActionStatus::Active) => "ActiveActionStatus",
            (EnvelopeShape::JsonLd, ActionStatus::Completed) => "CompletedActionStatus",
            (EnvelopeShape::JsonLd, ActionStatus::Failed) => "FailedActionStatus",
            (EnvelopeShape::Typed, ActionStatus::Pending) => "pending",
            (EnvelopeShape::Typed, ActionStatus::Active) => "active",
            (EnvelopeShape::Typed, ActionStatus::Completed) => "completed",
            (EnvelopeShape::Typed, ActionStatus::Failed) => "failed",
        }
    }
}

/// Fields of [`ActionTarget`] that handlers may insist on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetField {
    Url,
    Identifier,
    Environment,
    SecretPath,
}

impl TargetField {
    pub fn path(self) -> &'static str {
        match self {
            TargetField::Url => "target.url",
            TargetField::Identifier => "target.identifier",
            TargetField::Environment => "target.environment",
            TargetField::SecretPath => "target.secretPath",
        }
    }
}

/// Where an action executes: backend url, project, environment and path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Project (workspace) id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_imports: Option<bool>,
}

impl ActionTarget {
    pub fn get(&self, field: TargetField) -> Option<&str> {
        let value = match field {
            TargetField::Url => &self.url,
            TargetField::Identifier => &self.identifier,
            TargetField::Environment => &self.environment,
            TargetField::SecretPath => &self.secret_path,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn require(&self, field: TargetField) -> ActionResult<&str> {
        self.get(field).ok_or_else(|| ActionError::validation(field.path()))
    }

    pub fn is_empty(&self) -> bool {
        self == &ActionTarget::default()
    }
}

/// Payload acted on: a secret key, its value, and any extra properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionObject {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub properties: IndexMap<String, JsonValue>,
}

impl ActionObject {
    pub fn identifier(&self) -> ActionResult<&str> {
        self.identifier
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ActionError::validation("object.identifier"))
    }

    pub fn value(&self) -> ActionResult<&str> {
        self.value
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ActionError::validation("object.value"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretEntry {
    pub name: String,
    pub value: String,
}

impl SecretEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValueSpec {
    #[serde(rename = "@type")]
    pub spec_type: String,
    pub name: String,
    pub value_type: String,
    pub description: String,
}

/// Description of the shape of an action's result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSchema {
    #[serde(rename = "@type")]
    pub schema_type: String,
    pub properties: Vec<PropertyValueSpec>,
}

impl ResultSchema {
    /// List of `{name, value}` text pairs
    pub fn property_value_list() -> Self {
        let text = |name: &str, description: &str| PropertyValueSpec {
            spec_type: "PropertyValue".into(),
            name: name.into(),
            value_type: "Text".into(),
            description: description.into(),
        };
        Self {
            schema_type: "PropertyValueList".into(),
            properties: vec![text("name", "Secret key name"), text("value", "Secret value")],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionOutcome {
    Secrets(Vec<SecretEntry>),
    Structured {
        value: JsonValue,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<ResultSchema>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionFailure {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl From<&ActionError> for ActionFailure {
    fn from(err: &ActionError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            cause: err.cause(),
            details: err.details(),
        }
    }
}

/// One action request, mutated in place while it is processed.
///
/// `result` and `error` are only reachable through [`complete`](Self::complete)
/// and [`fail`](Self::fail), so at most one of them is ever set.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEnvelope {
    kind: ActionKind,
    shape: EnvelopeShape,
    pub context: Option<String>,
    pub target: Option<ActionTarget>,
    pub object: Option<ActionObject>,
    pub query: Option<String>,
    /// Unrecognised top-level properties, echoed back verbatim
    pub extra: IndexMap<String, JsonValue>,
    status: ActionStatus,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    result: Option<ActionOutcome>,
    error: Option<ActionFailure>,
}

impl ActionEnvelope {
    pub fn new(kind: impl Into<ActionKind>, shape: EnvelopeShape) -> Self {
        Self {
            kind: kind.into(),
            shape,
            context: None,
            target: None,
            object: None,
            query: None,
            extra: IndexMap::new(),
            status: ActionStatus::Pending,
            start_time: None,
            end_time: None,
            result: None,
            error: None,
        }
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn shape(&self) -> EnvelopeShape {
        self.shape
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn result(&self) -> Option<&ActionOutcome> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&ActionFailure> {
        self.error.as_ref()
    }

    pub fn require_target(&self) -> ActionResult<&ActionTarget> {
        self.target
            .as_ref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ActionError::validation("target"))
    }

    pub fn require_object(&self) -> ActionResult<&ActionObject> {
        self.object.as_ref().ok_or_else(|| ActionError::validation("object"))
    }

    /// Mark the envelope active and stamp `startTime`.
    pub fn begin(&mut self) {
        self.status = ActionStatus::Active;
        self.start_time = Some(Utc::now());
        self.end_time = None;
        self.result = None;
        self.error = None;
    }

    pub fn complete(&mut self, outcome: ActionOutcome) {
        self.result = Some(outcome);
        self.error = None;
        self.finish(ActionStatus::Completed);
    }

    pub fn fail(&mut self, err: &ActionError) {
        self.error = Some(ActionFailure::from(err));
        self.result = None;
        self.finish(ActionStatus::Failed);
    }

    fn finish(&mut self, status: ActionStatus) {
        let now = Utc::now();
        self.status = status;
        self.start_time.get_or_insert(now);
        self.end_time = Some(now);
    }
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl Serialize for ActionEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(context) = &self.context {
            map.serialize_entry("@context", context)?;
        }
        let (type_key, status_key) = match self.shape {
            EnvelopeShape::JsonLd => ("@type", "actionStatus"),
            EnvelopeShape::Typed => ("type", "status"),
        };
        map.serialize_entry(type_key, &self.kind)?;
        map.serialize_entry(status_key, self.status.label(self.shape))?;
        if let Some(target) = &self.target {
            match self.shape {
                EnvelopeShape::JsonLd => map.serialize_entry("target", &JsonLdTarget(target))?,
                EnvelopeShape::Typed => map.serialize_entry("target", target)?,
            }
        }
        if let Some(object) = &self.object {
            map.serialize_entry("object", object)?;
        }
        if let Some(query) = &self.query {
            map.serialize_entry("query", query)?;
        }
        if let Some(start) = &self.start_time {
            map.serialize_entry("startTime", &timestamp(start))?;
        }
        if let Some(end) = &self.end_time {
            map.serialize_entry("endTime", &timestamp(end))?;
        }
        if let Some(result) = &self.result {
            map.serialize_entry("result", result)?;
        }
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct JsonLdTarget<'a>(&'a ActionTarget);

impl Serialize for JsonLdTarget<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let t = self.0;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("@type", "EntryPoint")?;
        let fields = [
            ("url", &t.url),
            ("identifier", &t.identifier),
            ("environment", &t.environment),
            ("secretPath", &t.secret_path),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                map.serialize_entry(key, value)?;
            }
        }
        if let Some(include) = t.include_imports {
            map.serialize_entry("includeImports", &include)?;
        }
        map.end()
    }
}
