use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.opsgenie.com";
pub const API_KEY_ENV: &str = "OPSGENIE_API_KEY";
pub const API_URL_ENV: &str = "OPSGENIE_API_URL";
pub const CONFIG_PATH_ENV: &str = "LAMP_CONFIG";

const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RETRY_COUNT: usize = 3;
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "No API key configured. Pass --apiKey, set OPSGENIE_API_KEY or add apiKey to the config file"
    )]
    MissingApiKey,

    #[error("Proxy configuration is incomplete: {0}")]
    InvalidProxy(String),
}

/// The config file as stored on disk (YAML). Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_timeout: Option<u64>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProxyFile {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: bool,
}

impl ConfigFile {
    /// Load the file at `path`. A missing file is treated as empty.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(ConfigFile::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file at {}", path.display()))?;

        if raw.trim().is_empty() {
            return Ok(ConfigFile::default());
        }

        serde_yaml::from_str(&raw)
            .with_context(|| format!("Malformed YAML in config file {}", path.display()))
    }
}

/// Values supplied on the command line. They win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
}

/// Settings resolved once at startup and passed by reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub api_key: String,
    pub api_url: String,
    pub proxy: Option<ProxyConfig>,
    pub connection_timeout: Duration,
    pub request_timeout: Duration,
    pub retry_count: usize,
    pub log_level: String,
    pub log_path: Option<PathBuf>,
}

impl Configuration {
    /// Resolve from flags, the process environment and the config file.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let path = overrides
            .config_path
            .clone()
            .or_else(|| env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(default_path);
        let file = ConfigFile::load(&path)?;
        Ok(Self::resolve(file, |key| env::var(key).ok(), overrides)?)
    }

    /// Precedence: flag, then environment, then file, then defaults.
    pub fn resolve<E>(
        file: ConfigFile,
        env: E,
        overrides: &Overrides,
    ) -> std::result::Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let api_key = non_empty(overrides.api_key.clone())
            .or_else(|| non_empty(env(API_KEY_ENV)))
            .or_else(|| non_empty(file.api_key))
            .ok_or(ConfigError::MissingApiKey)?;

        let api_url = non_empty(env(API_URL_ENV))
            .or_else(|| non_empty(file.api_url))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let proxy = file.proxy.map(ProxyConfig::try_from).transpose()?;

        Ok(Self {
            api_key,
            api_url,
            proxy,
            connection_timeout: Duration::from_secs(
                file.connection_timeout
                    .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS),
            ),
            request_timeout: Duration::from_secs(
                file.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            retry_count: file.retry_count.unwrap_or(DEFAULT_RETRY_COUNT),
            log_level: non_empty(file.log_level).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_path: file.log_path,
        })
    }
}

impl TryFrom<ProxyFile> for ProxyConfig {
    type Error = ConfigError;

    fn try_from(proxy: ProxyFile) -> std::result::Result<Self, Self::Error> {
        let host = proxy
            .host
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| ConfigError::InvalidProxy("host is required".to_string()))?;
        let port = proxy
            .port
            .ok_or_else(|| ConfigError::InvalidProxy("port is required".to_string()))?;
        if proxy.password.is_some() && proxy.username.is_none() {
            return Err(ConfigError::InvalidProxy(
                "password given without username".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            username: proxy.username,
            password: proxy.password,
            tls: proxy.tls,
        })
    }
}

pub fn default_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".lamp");
    path.push("lamp.yaml");
    path
}
