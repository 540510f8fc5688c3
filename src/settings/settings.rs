use crate::logger::{Level, LogConfig};
use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log: LogConfig,
}

impl Settings {
    /// Command line values win over the settings file.
    pub fn apply_cli(&mut self, cli: &super::Cli) {
        if let Some(level) = cli.level.as_deref() {
            self.log.level = Level::parse(level);
        }
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "LEVELOG";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    parse_settings_with_env(path, ENV_PREFIX)
}

fn parse_settings_with_env(path: Option<&str>, env_prefix: &str) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);
    if path.is_empty() {
        return Err(anyhow!("settings path is empty"));
    }

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix(env_prefix).separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
