use std::process::ExitCode;

use tokio::sync::mpsc;

mod cli;
mod config_file;
mod gelf;
mod metadata;
mod router;
mod source;

use config_file::SpigotConfigFile;
use router::AdapterRegistry;
use source::DockerSource;

/// Records in flight between the docker pumps and the adapter. A slow
/// collector throttles the pumps through this channel.
const CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let config = match SpigotConfigFile::try_init() {
        Ok(config) => config,
        Err(e) => {
            log::error!("unable to read config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let identity = metadata::resolve_identity(&config.metadata.base_url).await;

    let mut registry = AdapterRegistry::new();
    gelf::register(&mut registry, identity);

    let adapter = match registry.create(gelf::ADAPTER_NAME, &config.route) {
        Ok(adapter) => adapter,
        Err(e) => {
            log::error!(
                "unable to create adapter for {}: {e}",
                config.route.address
            );
            return ExitCode::FAILURE;
        }
    };

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let mut consumer = tokio::spawn(adapter.stream(rx));

    let source = DockerSource::new(tx);
    tokio::spawn(source.run());

    tokio::select! {
        // Only completes if every pump ends and the channel closes.
        _ = &mut consumer => log::warn!("adapter stopped"),
        _ = tokio::signal::ctrl_c() => log::info!("interrupt received, shutting down"),
    }

    ExitCode::SUCCESS
}
