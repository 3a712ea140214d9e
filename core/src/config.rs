use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, YummyError};

/// Application settings, loaded once at startup and handed to the stores and
/// the codec by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub codec: CodecConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub recipe_db_name: String,
    pub session_log_db_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Width reserved for the label column of the "Kitchen Prep" table.
    pub title_column_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            codec: CodecConfig::default(),
            log_level: "warn".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            recipe_db_name: "cookbook.db".to_string(),
            session_log_db_name: "session_log.db".to_string(),
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            title_column_width: 15,
        }
    }
}

impl Config {
    /// Read `path` as JSON. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| YummyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| YummyError::Parse(format!("config: {e}")))
    }
}
