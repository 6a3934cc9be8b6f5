// Start-up configuration, read once from the environment (and `.env` via dotenv).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://a4gq6-oaaaa-aaaab-qaa4q-cai.raw.icp0.io";
pub const DEFAULT_SERVICE_ID: &str = "xgktx-viaaa-aaaab-qadda-cai";
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("{name} must not be blank")]
    Blank { name: &'static str },

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub endpoint_address: String,
    pub service_identifier: String,
    pub developer_identity: String,
    pub request_timeout: Option<Duration>,
    pub data_dir: PathBuf,
    pub probe_on_start: bool,
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |name: &'static str, default: &str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(v) if v.trim().is_empty() => Err(ConfigError::Blank { name }),
                Some(v) => Ok(v.trim().to_string()),
                None => Ok(default.to_string()),
            }
        };

        let endpoint_address = non_blank("ECOKIND_ENDPOINT", DEFAULT_ENDPOINT)?
            .trim_end_matches('/')
            .to_string();
        let service_identifier = non_blank("ECOKIND_SERVICE_ID", DEFAULT_SERVICE_ID)?;

        let developer_identity = lookup("ECOKIND_IDENTITY")
            .ok_or(ConfigError::Missing("ECOKIND_IDENTITY"))?
            .trim()
            .to_string();
        if developer_identity.is_empty() {
            return Err(ConfigError::Blank {
                name: "ECOKIND_IDENTITY",
            });
        }

        let request_timeout = match lookup("ECOKIND_REQUEST_TIMEOUT_SECS") {
            Some(v) => Some(Duration::from_secs(v.trim().parse::<u64>().map_err(|_| {
                ConfigError::Invalid {
                    name: "ECOKIND_REQUEST_TIMEOUT_SECS",
                    value: v.clone(),
                }
            })?)),
            None => None,
        };

        let probe_on_start = match lookup("ECOKIND_PROBE_ON_START") {
            Some(v) => v.trim().parse::<bool>().map_err(|_| ConfigError::Invalid {
                name: "ECOKIND_PROBE_ON_START",
                value: v.clone(),
            })?,
            None => true,
        };

        let data_dir = lookup("ECOKIND_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        Ok(Self {
            endpoint_address,
            service_identifier,
            developer_identity,
            request_timeout,
            data_dir: PathBuf::from(data_dir),
            probe_on_start,
        })
    }

    pub fn projects_db_path(&self) -> PathBuf {
        self.data_dir.join("projects.db")
    }
}
