use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Glob patterns matched against root-relative paths; matching files
    /// and directories are excluded from the scan.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// When set, log output is also written to this file.
    #[serde(default)]
    pub log_file: Option<String>,
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
