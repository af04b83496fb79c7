//! Startup identity resolution against the Rancher metadata service.

use log::{info, warn};

/// Fixed internal endpoint the metadata service answers on.
pub const METADATA_BASE_URL: &str = "http://rancher-metadata.rancher.internal";

const HOST_NAME_PATH: &str = "/latest/self/host/name";
const ENVIRONMENT_PATH: &str = "/latest/name";

/// Sentinel used when the environment name cannot be resolved.
const UNKNOWN_ENVIRONMENT: &str = "-";

/// Process-wide identity, resolved once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub host: String,
    pub environment: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("metadata service returned an empty body")]
    EmptyBody,
}

/// GET a metadata path and return the raw response body. The body is the
/// whole answer, there is no JSON envelope.
async fn fetch(base_url: &str, path: &str) -> Result<String, MetadataError> {
    let body = reqwest::get(format!("{base_url}{path}"))
        .await?
        .error_for_status()?
        .text()
        .await?;
    if body.is_empty() {
        return Err(MetadataError::EmptyBody);
    }
    Ok(body)
}

/// Resolve host and environment names, falling back to local identity when
/// the metadata service cannot answer. Never fails startup.
pub async fn resolve_identity(base_url: &str) -> HostIdentity {
    let host = match fetch(base_url, HOST_NAME_PATH).await {
        Ok(host) => host,
        Err(e) => {
            warn!("host name not available from metadata service: {e}");
            os_hostname()
        }
    };
    info!("host: {host}");

    let environment = match fetch(base_url, ENVIRONMENT_PATH).await {
        Ok(environment) => environment,
        Err(e) => {
            warn!("environment not available from metadata service: {e}");
            UNKNOWN_ENVIRONMENT.to_string()
        }
    };
    info!("environment: {environment}");

    HostIdentity { host, environment }
}

/// Hostname of the machine this process runs on. Containers usually carry
/// HOSTNAME in the environment; the syscall covers the rest.
pub fn os_hostname() -> String {
    if let Ok(hostname) = std::env::var("HOSTNAME") {
        if !hostname.is_empty() {
            return hostname;
        }
    }
    match nix::unistd::gethostname() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(_) => "unknown".to_string(),
    }
}
