use serde::Deserialize;

use crate::router::Route;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize)]
pub struct SpigotConfigFile {
    pub route: Route,
    #[serde(default)]
    pub metadata: MetadataEntry,
}

#[derive(Debug, Deserialize)]
pub struct MetadataEntry {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for MetadataEntry {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    crate::metadata::METADATA_BASE_URL.to_string()
}

impl SpigotConfigFile {
    fn try_init_from_string(config: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(config)?)
    }

    pub fn try_init() -> Result<Self, ConfigError> {
        use std::io::Read;
        let mut config = String::new();
        std::fs::File::open(&crate::cli::get_cli_args().config)?.read_to_string(&mut config)?;
        Self::try_init_from_string(&config)
    }
}
