pub mod docker;

pub use docker::DockerSource;
