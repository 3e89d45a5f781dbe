use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: '{0}'")]
    NotFound(PathBuf),

    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config '{origin}'")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
}
