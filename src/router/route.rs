use serde::Deserialize;

/// Requested wire transport for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Udp,
    Tcp,
    Tls,
}

impl AsRef<str> for TransportKind {
    fn as_ref(&self) -> &str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
            Self::Tls => "tls",
        }
    }
}

fn default_transport() -> TransportKind {
    TransportKind::Udp
}

/// Destination an adapter ships to, as supplied by configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Route {
    pub address: String,
    #[serde(default = "default_transport")]
    pub transport: TransportKind,
}
