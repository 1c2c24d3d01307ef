use config::{Config, ConfigError};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub socrata: SocrataConfig,
    pub dropbox: DropboxConfig,
    #[serde(default = "default_sync_config")]
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SocrataConfig {
    pub domain: String,
    pub resource_id: String,
    pub app_token: String,
    pub api_key_id: String,
    pub api_key_secret: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DropboxConfig {
    pub token: String,
    #[serde(default = "default_source_root")]
    pub root: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_sync_config() -> SyncConfig {
    SyncConfig {
        batch_size: default_batch_size(),
    }
}

fn default_batch_size() -> usize {
    10_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_source_root() -> String {
    // note the lowercase-ness
    "austinbcycletripdata".to_string()
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        // Credentials come in through the environment in deployment, e.g.
        // APP_SOCRATA__APP_TOKEN or APP_DROPBOX__TOKEN.
        let builder = Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        // Build the configuration
        let config = builder.build()?;

        // Try to deserialize the entire configuration
        let settings: Settings = config.try_deserialize()?;

        debug!(
            resource_id = %settings.socrata.resource_id,
            source_root = %settings.dropbox.root,
            "Loaded sync configuration"
        );

        Ok(settings)
    }
}
