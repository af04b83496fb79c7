use serde::Serialize;
use serde_json::{Map, Value};

use crate::metadata::HostIdentity;
use crate::router::{LogRecord, StreamSource};

/// Label operators set to override the message host per container.
pub const CONTAINER_NAME_LABEL: &str = "io.rancher.container.name";

const GELF_VERSION: &str = "1.1";

/// Substituted for empty payloads; collectors reject an empty short_message.
const EMPTY_MESSAGE_PLACEHOLDER: &str = "None";

/// Syslog severity carried in the `level` field. Only these two are ever
/// produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Severity {
    Error = 3,
    Informational = 6,
}

impl Serialize for Severity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl From<StreamSource> for Severity {
    fn from(source: StreamSource) -> Self {
        match source {
            StreamSource::Stderr => Self::Error,
            StreamSource::Stdout => Self::Informational,
        }
    }
}

/// One GELF 1.1 message, ready for the wire.
#[derive(Debug, Clone, Serialize)]
pub struct GelfMessage {
    pub version: &'static str,
    pub host: String,
    pub short_message: String,
    /// Seconds since the epoch, capped at millisecond precision.
    pub timestamp: f64,
    pub level: Severity,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GelfMessage {
    /// Map one enriched record into a transport-ready message.
    pub fn from_record(
        record: &LogRecord,
        extra: Map<String, Value>,
        identity: &HostIdentity,
    ) -> Self {
        let host = match record.container.labels.get(CONTAINER_NAME_LABEL) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => identity.host.clone(),
        };

        let short_message = if record.data.is_empty() {
            EMPTY_MESSAGE_PLACEHOLDER.to_string()
        } else {
            record.data.clone()
        };

        GelfMessage {
            version: GELF_VERSION,
            host,
            short_message,
            timestamp: record.time.timestamp_millis() as f64 / 1000.0,
            level: Severity::from(record.source),
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::ContainerInfo;
    use chrono::{DateTime, Utc};
    use quickcheck_macros::quickcheck;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn identity() -> HostIdentity {
        HostIdentity {
            host: "rancher-host-1".to_string(),
            environment: "staging".to_string(),
        }
    }

    fn record(data: &str, source: StreamSource, labels: &[(&str, &str)]) -> LogRecord {
        let container = ContainerInfo {
            id: "8a4f22b1c3d4".to_string(),
            name: "/web-1".to_string(),
            image_id: "sha256:9f3c1a".to_string(),
            image_name: "nginx:1.27".to_string(),
            command: vec!["nginx".to_string()],
            created: Utc::now(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            node: None,
        };

        LogRecord {
            data: data.to_string(),
            time: Utc::now(),
            source,
            container: Arc::new(container),
        }
    }

    #[test]
    fn stderr_maps_to_error_and_stdout_to_informational() {
        let msg = GelfMessage::from_record(
            &record("boom", StreamSource::Stderr, &[]),
            Map::new(),
            &identity(),
        );
        assert_eq!(msg.level, Severity::Error);

        let msg = GelfMessage::from_record(
            &record("ok", StreamSource::Stdout, &[]),
            Map::new(),
            &identity(),
        );
        assert_eq!(msg.level, Severity::Informational);
    }

    #[test]
    fn empty_payloads_get_the_placeholder() {
        let msg = GelfMessage::from_record(
            &record("", StreamSource::Stdout, &[]),
            Map::new(),
            &identity(),
        );
        assert_eq!(msg.short_message, "None");
    }

    #[test]
    fn host_prefers_the_container_name_label() {
        let msg = GelfMessage::from_record(
            &record("x", StreamSource::Stdout, &[(CONTAINER_NAME_LABEL, "web-1")]),
            Map::new(),
            &identity(),
        );
        assert_eq!(msg.host, "web-1");

        // An empty label value falls through to the resolved host.
        let msg = GelfMessage::from_record(
            &record("x", StreamSource::Stdout, &[(CONTAINER_NAME_LABEL, "")]),
            Map::new(),
            &identity(),
        );
        assert_eq!(msg.host, "rancher-host-1");

        let msg = GelfMessage::from_record(
            &record("x", StreamSource::Stdout, &[]),
            Map::new(),
            &identity(),
        );
        assert_eq!(msg.host, "rancher-host-1");
    }

    #[test]
    fn timestamp_keeps_millisecond_precision_only() {
        let time: DateTime<Utc> = "2020-01-02T03:04:05.678999Z".parse().unwrap();
        let mut rec = record("x", StreamSource::Stdout, &[]);
        rec.time = time;

        let msg = GelfMessage::from_record(&rec, Map::new(), &identity());
        assert_eq!(msg.timestamp, 1577934245.678);
    }

    #[test]
    fn wire_json_flattens_extra_fields_at_the_top_level() {
        let mut extra = Map::new();
        extra.insert("_container_id".to_string(), json!("8a4f22b1c3d4"));
        extra.insert("_foo".to_string(), json!("bar"));

        let msg = GelfMessage::from_record(
            &record("hello", StreamSource::Stdout, &[]),
            extra,
            &identity(),
        );

        let value = serde_json::to_value(&msg).expect("Failed to serialize message");
        assert_eq!(value["version"], "1.1");
        assert_eq!(value["short_message"], "hello");
        assert_eq!(value["level"], 6);
        assert_eq!(value["_container_id"], "8a4f22b1c3d4");
        assert_eq!(value["_foo"], "bar");
    }

    #[quickcheck]
    fn short_message_is_never_empty(payload: String) -> bool {
        let msg = GelfMessage::from_record(
            &record(&payload, StreamSource::Stdout, &[]),
            Map::new(),
            &identity(),
        );
        !msg.short_message.is_empty()
    }

    #[quickcheck]
    fn level_is_always_error_or_informational(stderr: bool) -> bool {
        let source = if stderr {
            StreamSource::Stderr
        } else {
            StreamSource::Stdout
        };
        let msg = GelfMessage::from_record(&record("x", source, &[]), Map::new(), &identity());
        matches!(msg.level, Severity::Error | Severity::Informational)
            && (msg.level == Severity::Error) == stderr
    }
}
