use crate::config::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tokio::fs;

/// Default location of the YAML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const SRV_SCHEME: &str = "mongodb+srv://";

/// Connection settings for the MongoDB sink, read from the `mongo` section of a YAML file:
///
/// ```yaml
/// mongo:
///   username: weather
///   password: secret
///   cluster: cluster0.example.mongodb.net
///   database: weather
///   collection: daily
/// ```
///
/// Other top-level sections are ignored. Unknown keys inside `mongo` are rejected.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MongoConfig {
    pub username: String,
    pub password: String,
    pub cluster: String,
    pub database: String,
    pub collection: String,
}

#[derive(Deserialize)]
struct ConfigFile {
    mongo: MongoConfig,
}

impl MongoConfig {
    /// Reads and parses the `mongo` section of the YAML file at `path`.
    pub async fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read(path.to_path_buf(), e)
            }
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Parses the `mongo` section from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml, "<string>")
    }

    fn parse(yaml: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str::<ConfigFile>(yaml)
            .map(|file| file.mongo)
            .map_err(|source| ConfigError::Parse {
                origin: origin.to_string(),
                source,
            })
    }

    /// SRV connection string for the cluster, without credentials.
    pub fn connection_uri(&self) -> String {
        format!("{SRV_SCHEME}{}", self.cluster)
    }
}

impl fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .field("cluster", &self.cluster)
            .field("database", &self.database)
            .field("collection", &self.collection)
            .finish()
    }
}
