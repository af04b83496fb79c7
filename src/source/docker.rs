//! Container discovery and log pumping via the Docker daemon.
//!
//! One pump task per container follows its stdout/stderr streams and feeds
//! records into the adapter channel. Containers started after us are picked
//! up from the daemon's event stream.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use bollard::container::LogOutput;
use bollard::query_parameters::{
    EventsOptions, EventsOptionsBuilder, InspectContainerOptions, InspectContainerOptionsBuilder,
    ListContainersOptions, ListContainersOptionsBuilder, LogsOptions, LogsOptionsBuilder,
};
use bollard::Docker;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use tokio::sync::mpsc::Sender;

use crate::router::{ContainerInfo, LogRecord, StreamSource};

static DOCKER_CLIENT: OnceLock<Docker> = OnceLock::new();

/// Get a reference to the shared Docker client.
///
/// Lazily initialized on first use, connecting with the default method
/// (Unix socket on Linux/macOS, named pipe on Windows).
fn get_docker() -> &'static Docker {
    DOCKER_CLIENT.get_or_init(|| {
        Docker::connect_with_local_defaults().expect("Failed to connect to Docker daemon")
    })
}

pub struct DockerSource {
    tx: Sender<LogRecord>,
}

impl DockerSource {
    pub fn new(tx: Sender<LogRecord>) -> Self {
        Self { tx }
    }

    /// Attach to every running container, then follow container start events
    /// until the daemon's event stream ends.
    pub async fn run(self) {
        let docker = get_docker();

        let options: ListContainersOptions = ListContainersOptionsBuilder::new().build();
        match docker.list_containers(Some(options)).await {
            Ok(containers) => {
                for summary in containers {
                    if let Some(id) = summary.id {
                        self.attach(&id).await;
                    }
                }
            }
            Err(e) => error!("failed to list containers: {e}"),
        }

        let filters = HashMap::from([
            ("type".to_string(), vec!["container".to_string()]),
            ("event".to_string(), vec!["start".to_string()]),
        ]);
        let options: EventsOptions = EventsOptionsBuilder::new().filters(&filters).build();

        let mut events = docker.events(Some(options));
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    if let Some(id) = event.actor.and_then(|actor| actor.id) {
                        self.attach(&id).await;
                    }
                }
                Err(e) => {
                    error!("docker event stream failed: {e}");
                    break;
                }
            }
        }
        info!("docker event stream ended, no new containers will be attached");
    }

    /// Inspect one container and spawn its log pump.
    async fn attach(&self, id: &str) {
        let options: InspectContainerOptions = InspectContainerOptionsBuilder::new().build();
        let inspect = match get_docker().inspect_container(id, Some(options)).await {
            Ok(inspect) => inspect,
            Err(e) => {
                warn!("failed to inspect container {id}: {e}");
                return;
            }
        };

        let config = inspect.config.unwrap_or_default();
        let container = Arc::new(ContainerInfo {
            id: inspect.id.unwrap_or_else(|| id.to_string()),
            name: inspect.name.unwrap_or_default(),
            image_id: inspect.image.unwrap_or_default(),
            image_name: config.image.unwrap_or_default(),
            command: config.cmd.unwrap_or_default(),
            created: inspect
                .created
                .and_then(|created| DateTime::parse_from_rfc3339(&created).ok())
                .map(|created| created.with_timezone(&Utc))
                .unwrap_or_default(),
            labels: config.labels.unwrap_or_default(),
            // The classic-swarm node annotation is gone from the modern
            // engine API; records built here never carry one.
            node: None,
        });

        info!(
            "attaching to container {} ({})",
            container.name.trim_start_matches('/'),
            short_id(&container.id),
        );
        tokio::spawn(pump(container, self.tx.clone()));
    }
}

fn short_id(id: &str) -> &str {
    &id[..id.len().min(12)]
}

/// Follow one container's log stream and turn frames into records. Ends when
/// the stream does (container stop) or when the receiver is gone.
async fn pump(container: Arc<ContainerInfo>, tx: Sender<LogRecord>) {
    let options: LogsOptions = LogsOptionsBuilder::new()
        .follow(true)
        .stdout(true)
        .stderr(true)
        .tail("0")
        .build();

    let mut stream = get_docker().logs(&container.id, Some(options));
    while let Some(frame) = stream.next().await {
        let (source, message) = match frame {
            Ok(LogOutput::StdOut { message }) | Ok(LogOutput::Console { message }) => {
                (StreamSource::Stdout, message)
            }
            Ok(LogOutput::StdErr { message }) => (StreamSource::Stderr, message),
            Ok(LogOutput::StdIn { .. }) => continue,
            Err(e) => {
                warn!("log stream for container {} failed: {e}", short_id(&container.id));
                break;
            }
        };

        let time = Utc::now();
        for line in String::from_utf8_lossy(&message).lines() {
            let record = LogRecord {
                data: line.to_string(),
                time,
                source,
                container: Arc::clone(&container),
            };
            if tx.send(record).await.is_err() {
                // Receiver gone, the adapter is shutting down.
                return;
            }
        }
    }
    debug!("log stream for container {} ended", short_id(&container.id));
}
