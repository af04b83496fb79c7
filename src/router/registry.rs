use std::collections::HashMap;

use tokio::sync::mpsc::Receiver;

use super::message::LogRecord;
use super::route::{Route, TransportKind};

/// A running adapter instance. Consumes records from its stream until the
/// channel closes, then stops.
#[async_trait::async_trait]
pub trait LogAdapter: Send {
    async fn stream(self: Box<Self>, rx: Receiver<LogRecord>);
}

pub type AdapterFactory =
    Box<dyn Fn(&Route) -> Result<Box<dyn LogAdapter>, AdapterError> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("no adapter registered as {0:?}")]
    UnknownAdapter(String),
    #[error("transport {} is not supported by this adapter", .0.as_ref())]
    UnsupportedTransport(TransportKind),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Named adapter constructors. Factories are registered once at startup and
/// looked up by the symbolic name a route asks for.
#[derive(Default)]
pub struct AdapterRegistry {
    factories: HashMap<&'static str, AdapterFactory>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, factory: AdapterFactory) {
        self.factories.insert(name, factory);
    }

    pub fn create(&self, name: &str, route: &Route) -> Result<Box<dyn LogAdapter>, AdapterError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| AdapterError::UnknownAdapter(name.to_string()))?;
        factory(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullAdapter;

    #[async_trait::async_trait]
    impl LogAdapter for NullAdapter {
        async fn stream(self: Box<Self>, mut rx: Receiver<LogRecord>) {
            while rx.recv().await.is_some() {}
        }
    }

    fn test_route() -> Route {
        Route {
            address: "127.0.0.1:12201".to_string(),
            transport: TransportKind::Udp,
        }
    }

    #[test]
    fn creates_registered_adapters() {
        let mut registry = AdapterRegistry::new();
        registry.register(
            "null",
            Box::new(|_route| Ok(Box::new(NullAdapter) as Box<dyn LogAdapter>)),
        );

        assert!(registry.create("null", &test_route()).is_ok());
    }

    #[test]
    fn unknown_adapter_name_is_an_error() {
        let registry = AdapterRegistry::new();
        let err = registry.create("gelf", &test_route()).err().unwrap();
        assert!(matches!(err, AdapterError::UnknownAdapter(name) if name == "gelf"));
    }
}
