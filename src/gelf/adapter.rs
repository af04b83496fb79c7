use async_trait::async_trait;
use log::{error, info};
use tokio::sync::mpsc::Receiver;

use super::fields::extra_fields;
use super::message::GelfMessage;
use super::writer::GelfWriter;
use crate::metadata::HostIdentity;
use crate::router::{
    AdapterError, AdapterRegistry, LogAdapter, LogRecord, Route, TransportKind,
};

/// Name the factory is registered under.
pub const ADAPTER_NAME: &str = "gelf";

/// Streams GELF-encoded records to a collection endpoint over UDP.
pub struct GelfAdapter {
    writer: GelfWriter,
    identity: HostIdentity,
}

impl GelfAdapter {
    pub fn new(route: &Route, identity: HostIdentity) -> Result<Self, AdapterError> {
        if route.transport != TransportKind::Udp {
            return Err(AdapterError::UnsupportedTransport(route.transport));
        }

        let writer = GelfWriter::connect(&route.address)?;
        Ok(Self { writer, identity })
    }
}

/// Register the GELF factory. The identity is resolved once at startup and
/// moves into every adapter the factory constructs.
pub fn register(registry: &mut AdapterRegistry, identity: HostIdentity) {
    registry.register(
        ADAPTER_NAME,
        Box::new(move |route| {
            GelfAdapter::new(route, identity.clone())
                .map(|adapter| Box::new(adapter) as Box<dyn LogAdapter>)
        }),
    );
}

#[async_trait]
impl LogAdapter for GelfAdapter {
    async fn stream(self: Box<Self>, mut rx: Receiver<LogRecord>) {
        while let Some(record) = rx.recv().await {
            let extra = match extra_fields(&record, &self.identity).to_json() {
                Ok(extra) => extra,
                Err(e) => {
                    error!("gelf: dropping record from {}: {e}", record.container.id);
                    continue;
                }
            };

            let message = GelfMessage::from_record(&record, extra, &self.identity);
            if let Err(e) = self.writer.send(&message) {
                error!("gelf: send failed for {}: {e}", record.container.id);
                continue;
            }
        }
        info!("log stream closed, gelf adapter stopping");
    }
}
