use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Whether a log line came from the container's stdout or stderr channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl AsRef<str> for StreamSource {
    fn as_ref(&self) -> &str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Swarm node a container is scheduled on, when the daemon reports one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwarmNode {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    /// Name as reported by the daemon, with its leading slash.
    pub name: String,
    pub image_id: String,
    pub image_name: String,
    pub command: Vec<String>,
    pub created: DateTime<Utc>,
    pub labels: HashMap<String, String>,
    pub node: Option<SwarmNode>,
}

/// One log line pulled from a container stream. The container info is shared
/// by every record of the same container.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub data: String,
    pub time: DateTime<Utc>,
    pub source: StreamSource,
    pub container: Arc<ContainerInfo>,
}
