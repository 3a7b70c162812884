//! Layered configuration for folio.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Environment variables prefixed with `FOLIO_`, nested keys separated by
//!    `__` (e.g. `FOLIO_SEARCH__YIELD_EVERY=5`).
//! 2. A config file: the one passed explicitly, otherwise `config.toml` in
//!    the platform config directory if it exists. TOML, YAML and JSON are
//!    supported, chosen by file extension.
//! 3. Hardcoded defaults.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use folio_search::Settings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

const ENV_PREFIX: &str = "FOLIO_";
const DATABASE_FILENAME: &str = "search-cache.sqlite";
const CONFIG_FILENAME: &str = "config.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "folio")
}

/// Default location of the search cache database.
///
/// Falls back to the working directory when the platform has no data
/// directory for the current user.
pub fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DATABASE_FILENAME))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILENAME))
}

/// Config file read when none is given explicitly.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default `tracing` filter directive, overridden by `RUST_LOG` and
    /// `-v` flags.
    pub level: String,
    /// Colourise log output.
    pub ansi: bool,
}
impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            ansi: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding cached book text.
    pub database: PathBuf,
    pub search: Settings,
    pub log: LogConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            search: Settings::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, a config file and the environment.
    ///
    /// An explicit `file` must exist; the default config file is optional.
    #[instrument]
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|path| path.is_file()),
        };
        Self::extract(Self::figment(file.as_deref())?)
    }

    /// The layered providers, without extracting anything.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "Reading config file");
            figment = match path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref() {
                Some("toml") => figment.merge(Toml::file_exact(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                Some("json") => figment.merge(Json::file_exact(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn extract(figment: Figment) -> Result<Self> {
        figment.extract().or_raise(|| ErrorKind::Invalid)
    }
}
