//! Configuration loading: config file, environment overrides, CLI merge.
//!
//! Precedence, highest first: CLI flags, `PROJCTL_*` environment variables,
//! the config file, built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::api::{ApiCredentials, HttpTimeouts};
use crate::download::{DEFAULT_PARALLEL, MAX_PARALLEL, default_archive_name};

const PARALLEL_RANGE: std::ops::RangeInclusive<u64> = 1..=MAX_PARALLEL as u64;
const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=3600;

/// Default GraphQL endpoint.
pub const DEFAULT_API_URL: &str = "https://api.projctl.io/graphql";

/// Default base URL for file content downloads.
pub const DEFAULT_FILES_URL: &str = "https://api.projctl.io/files";

const ENV_API_URL: &str = "PROJCTL_API_URL";
const ENV_FILES_URL: &str = "PROJCTL_FILES_URL";
const ENV_TOKEN: &str = "PROJCTL_TOKEN";
const ENV_CLIENT_ID: &str = "PROJCTL_CLIENT_ID";
const ENV_COMPANY_ID: &str = "PROJCTL_COMPANY_ID";

/// Configuration errors. All are fatal before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for `{field}`: {value}. Expected range: {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("no API token configured; set PROJCTL_TOKEN or `token` in the config file")]
    MissingToken,
}

/// TOML-backed file configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// GraphQL endpoint.
    pub api_url: Option<String>,
    /// Base URL that file ids are appended to.
    pub files_url: Option<String>,
    /// Bearer token.
    pub token: Option<String>,
    pub client_id: Option<String>,
    pub company_id: Option<String>,
    /// Default concurrent downloads (`1..=MAX_PARALLEL`).
    pub parallel: Option<u64>,
    /// Directory for archives when `--output` is not given.
    pub output_dir: Option<PathBuf>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Parses and validates TOML config text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// [`ConfigError::OutOfRange`] for values outside their allowed range.
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values against runtime and CLI constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_range("parallel", self.parallel, &PARALLEL_RANGE)?;
        validate_range(
            "connect_timeout_secs",
            self.connect_timeout_secs,
            &TIMEOUT_RANGE_SECS,
        )?;
        validate_range("read_timeout_secs", self.read_timeout_secs, &TIMEOUT_RANGE_SECS)?;
        Ok(())
    }
}

fn validate_range(
    field: &'static str,
    value: Option<u64>,
    range: &std::ops::RangeInclusive<u64>,
) -> Result<(), ConfigError> {
    match value {
        Some(value) if !range.contains(&value) => Err(ConfigError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        }),
        _ => Ok(()),
    }
}

/// Values taken from `PROJCTL_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub api_url: Option<String>,
    pub files_url: Option<String>,
    pub token: Option<String>,
    pub client_id: Option<String>,
    pub company_id: Option<String>,
}

impl EnvOverrides {
    /// Reads overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads overrides through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            api_url: get(ENV_API_URL),
            files_url: get(ENV_FILES_URL),
            token: get(ENV_TOKEN),
            client_id: get(ENV_CLIENT_ID),
            company_id: get(ENV_COMPANY_ID),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub parallel: Option<usize>,
    /// Archive path.
    pub output: Option<PathBuf>,
}

/// Fully merged configuration for one run.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_url: String,
    pub files_url: String,
    pub credentials: ApiCredentials,
    pub parallel: usize,
    /// Archive path.
    pub output: PathBuf,
    pub timeouts: HttpTimeouts,
}

impl ResolvedConfig {
    /// Merges the three layers over the built-in defaults.
    ///
    /// When no output path is given, the archive is named
    /// `files-YYYYMMDD-HHMMSS.zip` inside `output_dir` (or the working directory).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] if no layer supplies a token.
    pub fn merge(
        cli: CliOverrides,
        env: EnvOverrides,
        file: Option<&FileConfig>,
    ) -> Result<Self, ConfigError> {
        let file = file.cloned().unwrap_or_default();

        let token = env
            .token
            .or(file.token)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let parallel = cli
            .parallel
            .or_else(|| file.parallel.and_then(|p| usize::try_from(p).ok()))
            .unwrap_or(DEFAULT_PARALLEL);

        let output = cli.output.unwrap_or_else(|| {
            file.output_dir
                .unwrap_or_default()
                .join(default_archive_name())
        });

        let defaults = HttpTimeouts::default();
        let timeouts = HttpTimeouts {
            connect_secs: file.connect_timeout_secs.unwrap_or(defaults.connect_secs),
            read_secs: file.read_timeout_secs.unwrap_or(defaults.read_secs),
        };

        Ok(Self {
            api_url: env
                .api_url
                .or(file.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            files_url: env
                .files_url
                .or(file.files_url)
                .unwrap_or_else(|| DEFAULT_FILES_URL.to_string()),
            credentials: ApiCredentials {
                token,
                client_id: env.client_id.or(file.client_id),
                company_id: env.company_id.or(file.company_id),
            },
            parallel,
            output,
            timeouts,
        })
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/projctl/config.toml`
/// 2. `$HOME/.config/projctl/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("projctl")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("projctl")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file cannot be read, plus any error
/// from [`FileConfig::from_toml_str`].
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    FileConfig::from_toml_str(&raw, path)
}

/// Loads the config file from the default path if present.
///
/// # Errors
///
/// Returns an error only when a config file exists but is unreadable or invalid.
pub fn load_default_file_config() -> Result<Option<FileConfig>, ConfigError> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        debug!(path = %path.display(), "no config file");
        return Ok(None);
    }
    debug!(path = %path.display(), "loading config file");
    load_file_config(&path).map(Some)
}
