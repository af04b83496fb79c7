pub mod message;
pub mod registry;
pub mod route;

pub use message::{ContainerInfo, LogRecord, StreamSource, SwarmNode};
pub use registry::{AdapterError, AdapterRegistry, LogAdapter};
pub use route::{Route, TransportKind};
