//! Configuration loader and validator for the blogging samples.
use crate::model::SchemaVariant;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub database: Database,
    #[serde(default)]
    pub web: Web,
    #[serde(default)]
    pub console: Console,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Database {
    #[serde(default)]
    pub schema: SchemaVariant,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Web {
    pub bind: String,
}

impl Default for Web {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Console {
    pub seed_url: String,
}

impl Default for Console {
    fn default() -> Self {
        Self {
            seed_url: "http://blogs.msdn.com/adonet".into(),
        }
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    /// `DATABASE_URL` wins; otherwise the database file inside `app.data_dir`.
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.default_database_url())
    }

    pub fn default_database_url(&self) -> String {
        format!(
            "sqlite://{}/{}",
            self.app.data_dir.trim_end_matches('/'),
            self.database.file
        )
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.web
            .bind
            .parse()
            .map_err(|_| ConfigError::Invalid("web.bind must be a socket address"))
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Like `load`, but falls back to the built-in example when the file is absent.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        return load(Some(path));
    }
    let cfg: Config = serde_yaml::from_str(example())?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.database.file.trim().is_empty() {
        return Err(ConfigError::Invalid("database.file must be non-empty"));
    }
    cfg.bind_addr()?;
    if cfg.console.seed_url.trim().is_empty() {
        return Err(ConfigError::Invalid("console.seed_url must be non-empty"));
    }
    Ok(())
}

pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"

database:
  # new: schema created by migrations; existing: map onto a prepared database
  schema: new
  file: "blogging.db"

web:
  bind: "127.0.0.1:5000"

console:
  seed_url: "http://blogs.msdn.com/adonet"
"#
}
