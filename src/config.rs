//! Index configuration: where snapshots live, and how verbose logging is.
//!
//! Layered config source (environment, with an optional file fallback),
//! matching the `AppConfig::from_env` / `AppConfig::from_file` /
//! `AppConfig::default` shape used elsewhere in this codebase's lineage,
//! generalized to this index's own fields: `snapshot_dir` in place of a
//! storage path tied to an API server, no port or model fields since this
//! crate exposes no network surface.

use config::{Config, File};
use std::convert::TryFrom;
use std::error::Error;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Directory named snapshots are saved to and loaded from.
    pub snapshot_dir: PathBuf,
    /// Passed through to `env_logger` by the embedding application.
    pub log_level: String,
}

impl TryFrom<Config> for IndexConfig {
    type Error = Box<dyn Error>;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        Ok(Self {
            snapshot_dir: PathBuf::from(config.get::<String>("snapshot_dir")?),
            log_level: config.get::<String>("log_level")?,
        })
    }
}

impl IndexConfig {
    /// Read `SNAPSHOT_DIR` / `LOG_LEVEL` from the environment, loading a
    /// `.env` file first if present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            snapshot_dir: std::env::var("SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| Self::default().snapshot_dir),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| Self::default().log_level),
        }
    }

    #[allow(deprecated)]
    pub fn from_file(path: &str) -> Result<Self, Box<dyn Error>> {
        let mut settings = Config::default();
        settings.merge(File::with_name(path))?;
        Self::try_from(settings)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("./data/snapshots"),
            log_level: "info".to_string(),
        }
    }
}
