//! Configuration loaded from `~/.rentlens/config.toml`, merged with `-c`
//! overrides from the command line and explicit [`ConfigOverrides`].
//!
//! Precedence (highest first): [`ConfigOverrides`], `-c key=value` overrides,
//! the `RENTLENS_API_BASE` environment variable, the config file, built-in
//! defaults.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use dirs::home_dir;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::error::RentlensErr;
use crate::error::Result;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_STREAM_IDLE_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_PAGE_SIZE: u32 = rentlens_protocol::listing::DEFAULT_PAGE_SIZE;

/// Environment variable that relocates the configuration directory.
pub const RENTLENS_HOME_ENV_VAR: &str = "RENTLENS_HOME";
/// Environment variable that overrides `api_base`.
pub const RENTLENS_API_BASE_ENV_VAR: &str = "RENTLENS_API_BASE";

/// On-disk representation. Every field is optional so a partial file only
/// overrides what it names.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ConfigToml {
    pub api_base: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub stream_idle_timeout_ms: Option<u64>,
    pub page_size: Option<u32>,
}

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the backend, without a trailing slash. Both the listing
    /// service and the analysis stream live under it.
    pub api_base: String,

    /// Upper bound for establishing a TCP/TLS connection.
    pub connect_timeout: Duration,

    /// Upper bound for receiving response headers of any request.
    pub request_timeout: Duration,

    /// Maximum silence tolerated between two reads of the analysis stream.
    pub stream_idle_timeout: Duration,

    pub page_size: u32,
}

/// Optional overrides for user configuration (e.g., from CLI flags).
#[derive(Default, Debug, Clone)]
pub struct ConfigOverrides {
    pub api_base: Option<String>,
    pub stream_idle_timeout: Option<Duration>,
}

impl Config {
    /// Load `config.toml` from the rentlens home, apply `RENTLENS_API_BASE`,
    /// then `cli_overrides` (dotted `key=value` pairs), then `overrides`.
    pub fn load_with_cli_overrides(
        cli_overrides: Vec<(String, toml::Value)>,
        overrides: ConfigOverrides,
    ) -> Result<Self> {
        let rentlens_home = find_rentlens_home()?;
        let mut root = load_config_as_toml(&rentlens_home)?;
        let env_api_base = std::env::var(RENTLENS_API_BASE_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty());
        apply_overrides(&mut root, env_api_base, cli_overrides);
        let cfg: ConfigToml = root.try_into()?;
        Self::load_from_base_config_with_overrides(cfg, overrides)
    }

    /// Build a `Config` from an already parsed [`ConfigToml`]. Used directly
    /// by tests that must not touch the real home directory.
    pub fn load_from_base_config_with_overrides(
        cfg: ConfigToml,
        overrides: ConfigOverrides,
    ) -> Result<Self> {
        let api_base = overrides
            .api_base
            .or(cfg.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = normalize_api_base(&api_base)?;

        let page_size = cfg.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(RentlensErr::Config("page_size must be positive".into()));
        }

        Ok(Self {
            api_base,
            connect_timeout: Duration::from_millis(
                cfg.connect_timeout_ms.unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
            ),
            request_timeout: Duration::from_millis(
                cfg.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            ),
            stream_idle_timeout: overrides.stream_idle_timeout.unwrap_or_else(|| {
                Duration::from_millis(
                    cfg.stream_idle_timeout_ms
                        .unwrap_or(DEFAULT_STREAM_IDLE_TIMEOUT_MS),
                )
            }),
            page_size,
        })
    }

    /// Defaults pointed at `api_base`, for tests and embedding.
    pub fn for_api_base(api_base: &str) -> Result<Self> {
        Self::load_from_base_config_with_overrides(
            ConfigToml::default(),
            ConfigOverrides {
                api_base: Some(api_base.to_string()),
                ..Default::default()
            },
        )
    }
}

fn normalize_api_base(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(RentlensErr::Config(format!(
            "api_base must be an http(s) URL, got `{raw}`"
        )));
    }
    Ok(trimmed.to_string())
}

/// Reads `config.toml` as a raw TOML table. A missing file is an empty table.
pub fn load_config_as_toml(rentlens_home: &Path) -> Result<toml::Value> {
    let path = rentlens_home.join("config.toml");
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str::<toml::Value>(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no config file at {}", path.display());
            Ok(toml::Value::Table(Default::default()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Layer the `RENTLENS_API_BASE` value and then the `-c` overrides onto the
/// parsed config file, so a command-line flag beats the environment.
fn apply_overrides(
    root: &mut toml::Value,
    env_api_base: Option<String>,
    cli_overrides: Vec<(String, toml::Value)>,
) {
    if let Some(api_base) = env_api_base {
        apply_toml_override(root, "api_base", toml::Value::String(api_base));
    }
    for (path, value) in cli_overrides {
        apply_toml_override(root, &path, value);
    }
}

/// Apply a single dotted-path override onto `root`, creating intermediate
/// tables as necessary.
fn apply_toml_override(root: &mut toml::Value, path: &str, value: toml::Value) {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = root;

    for (i, part) in parts.iter().enumerate() {
        if !current.is_table() {
            *current = toml::Value::Table(Default::default());
        }
        let toml::Value::Table(table) = current else {
            return;
        };
        if i == parts.len() - 1 {
            table.insert((*part).to_string(), value);
            return;
        }
        current = table
            .entry((*part).to_string())
            .or_insert_with(|| toml::Value::Table(Default::default()));
    }
}

/// Returns the rentlens configuration directory: `$RENTLENS_HOME` when set,
/// otherwise `~/.rentlens`. Does not verify that the directory exists.
pub fn find_rentlens_home() -> Result<PathBuf> {
    if let Ok(val) = std::env::var(RENTLENS_HOME_ENV_VAR)
        && !val.is_empty()
    {
        return Ok(PathBuf::from(val));
    }
    let mut p = home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        )
    })?;
    p.push(".rentlens");
    Ok(p)
}
