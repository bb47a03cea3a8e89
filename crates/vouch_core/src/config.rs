use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_KEYRING_SERVICE: &str = "vouch-cli";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub log_level: String,
    /// Remote consulted for branch status and pushes when none is given.
    pub default_remote: String,
    /// Overrides the credential file location (`<config dir>/config.json`).
    pub store_path: Option<PathBuf>,
    pub keyring_service: String,
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            default_remote: "origin".to_string(),
            store_path: None,
            keyring_service: DEFAULT_KEYRING_SERVICE.to_string(),
            http_timeout_secs: 30,
        }
    }
}
