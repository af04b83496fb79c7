use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::metadata::{self, HostIdentity};
use crate::router::LogRecord;

/// Label whose value names the service group a container belongs to.
pub const STACK_SERVICE_LABEL: &str = "io.rancher.stack_service.name";

/// Case-insensitive label-name prefix that flags a label for inclusion as a
/// custom structured field.
const MARKER_PREFIX: &str = "gelf_";

/// A single extra-field value. Closed set on purpose: everything that goes
/// on the wire is one of these.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// The extra-field mapping attached to one outgoing message. Keys carry
/// their underscore prefix already; the map is built fresh per record.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtraFields {
    inner: BTreeMap<String, FieldValue>,
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("extra fields did not serialize to an object")]
    NotAnObject,
}

impl ExtraFields {
    fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Serialize the mapping into the JSON object attached to the outgoing
    /// message. The only encoding step between labels and the wire.
    pub fn to_json(&self) -> Result<Map<String, Value>, EncodeError> {
        match serde_json::to_value(&self.inner)? {
            Value::Object(map) => Ok(map),
            _ => Err(EncodeError::NotAnObject),
        }
    }
}

/// Field key for a marker-prefixed label name, if it is one. The key keeps
/// the marker's trailing underscore: `gelf_foo` maps to `_foo`.
fn marker_key(name: &str) -> Option<&str> {
    if name.len() <= MARKER_PREFIX.len() {
        return None;
    }
    let prefix = name.get(..MARKER_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(MARKER_PREFIX) {
        return None;
    }
    name.get(MARKER_PREFIX.len() - 1..)
}

/// Build the extra-field mapping for one record. Pure: everything comes from
/// the record and the resolved identity.
pub fn extra_fields(record: &LogRecord, identity: &HostIdentity) -> ExtraFields {
    let container = &record.container;
    let mut fields = ExtraFields::default();

    fields.insert("_container_id", container.id.as_str());
    fields.insert("_container_name", container.name.trim_start_matches('/'));
    fields.insert("_image_id", container.image_id.as_str());
    fields.insert("_image_name", container.image_name.as_str());
    fields.insert("_command", container.command.join(" "));
    fields.insert("_created", container.created.timestamp());
    fields.insert(
        "_stack_service",
        container
            .labels
            .get(STACK_SERVICE_LABEL)
            .map(String::as_str)
            .unwrap_or(""),
    );
    fields.insert("_host", identity.host.as_str());
    fields.insert("_environment", identity.environment.as_str());
    // The shipper's own identity, not the resolved host. Captured per call.
    fields.insert("_spigot_instance", metadata::os_hostname());
    fields.insert("_spigot_source", record.source.as_ref());

    for (name, value) in &container.labels {
        if let Some(key) = marker_key(name) {
            fields.insert(key, value.as_str());
        }
    }

    if let Some(node) = &container.node {
        fields.insert("_swarm_node", node.name.as_str());
    }

    fields
}
