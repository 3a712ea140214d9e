use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

use yummy_core::config::Config as CoreConfig;

pub struct Config {
    pub data_dir: PathBuf,
    pub settings: CoreConfig,
}

impl Config {
    /// Resolve the data directory (`YUMMY_DATA_DIR` wins over the platform
    /// default), create it, and read `config.json` from it.
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os("YUMMY_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("", "", "yummy")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        Self::load_in(data_dir)
    }

    pub fn load_in(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let config_path = data_dir.join("config.json");
        let settings = CoreConfig::load_from(&config_path)
            .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

        Ok(Config { data_dir, settings })
    }
}
