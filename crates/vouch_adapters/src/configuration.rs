use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use vouch_core::config::{Settings, DEFAULT_KEYRING_SERVICE};
use vouch_core::Error;

use crate::accounts::STORE_FILE_NAME;

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "vouch", "vouch")
}

/// Directory holding the credential file and `config.toml`
pub fn default_config_dir() -> Result<PathBuf, Error> {
    project_dirs()
        .map(|d| d.config_dir().to_path_buf())
        .ok_or(Error::ConfigDirectoryNotFound)
}

/// Credential file location: the configured override or
/// `<config dir>/config.json`
pub fn store_path(settings: &Settings) -> Result<PathBuf, Error> {
    match &settings.store_path {
        Some(path) => Ok(path.clone()),
        None => Ok(default_config_dir()?.join(STORE_FILE_NAME)),
    }
}

pub fn get_configuration_with_paths(
    current_dir_path: Option<PathBuf>,
    system_config_dir_path: Option<PathBuf>,
) -> Result<Settings, config::ConfigError> {
    let config_directory = current_dir_path.unwrap_or_else(|| {
        std::env::current_dir()
            .map(|p| p.join("config"))
            .unwrap_or_else(|_| PathBuf::from("config"))
    });

    let system_config_dir = if let Some(path) = system_config_dir_path {
        path
    } else {
        project_dirs()
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("config"))
    };

    let settings = Config::builder()
        .set_default("log_level", "info")?
        .set_default("default_remote", "origin")?
        .set_default("keyring_service", DEFAULT_KEYRING_SERVICE)?
        .set_default("http_timeout_secs", 30)?
        .add_source(File::from(system_config_dir.join("config.toml")).required(false))
        .add_source(File::from(config_directory.join("config.toml")).required(false))
        .add_source(Environment::with_prefix("VOUCH").separator("__"))
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    get_configuration_with_paths(None, None)
}
