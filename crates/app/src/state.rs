//! Application state management

use std::path::{Path, PathBuf};

use concierge_core::{Database, EngineConfig, Error, Result};
use directories::ProjectDirs;
use tracing::{debug, info};

const CONFIG_FILE: &str = "concierge.toml";
const DATABASE_FILE: &str = "concierge.db";

/// Opened store plus the locations it came from
pub struct AppState {
    pub db: Database,
    pub db_path: PathBuf,
}

impl AppState {
    /// Resolve configuration and database locations, then open the store.
    ///
    /// Explicit paths win. Otherwise the config is read from the platform
    /// config directory when present, and the database lives in the platform
    /// data directory.
    pub fn open(config_path: Option<&Path>, db_path: Option<&Path>) -> Result<Self> {
        let config = Self::load_config(config_path)?;

        let db_path = match db_path {
            Some(path) => path.to_path_buf(),
            None => Self::project_dirs()?.data_dir().join(DATABASE_FILE),
        };

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::open_with_config(&db_path, config)?;
        info!(path = %db_path.display(), schema_version = db.schema_version(), "Opened database");

        Ok(Self { db, db_path })
    }

    fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
        if let Some(path) = explicit {
            return EngineConfig::load(path);
        }

        let default_path = Self::project_dirs()?.config_dir().join(CONFIG_FILE);
        if default_path.exists() {
            EngineConfig::load(&default_path)
        } else {
            debug!(path = %default_path.display(), "No config file, using defaults");
            Ok(EngineConfig::default())
        }
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "onyx", "concierge").ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine data directory",
            ))
        })
    }
}
