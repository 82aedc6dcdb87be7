use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::SyncStore;
use crate::uid::{DEFAULT_MAX_ATTEMPTS, DEFAULT_NAME_LENGTH, NameAllocator, RandomHex};

/// Environment variable consulted when the config file names no database
pub const DATABASE_ENV: &str = "AXISGTD_DATABASE";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SyncConfig {
    pub database: Option<String>,
    pub id_length: Option<usize>,
    pub max_attempts: Option<u32>,
}

impl SyncConfig {
    /// Resolve the database file, relative paths being taken from `base`
    pub fn database_path(&self, base: &Path) -> PathBuf {
        let configured = self
            .database
            .clone()
            .or_else(|| std::env::var(DATABASE_ENV).ok().filter(|v| !v.is_empty()));

        match configured {
            Some(db) => base.join(db),
            None => default_database_path_in(base),
        }
    }

    pub fn allocator(&self) -> crate::Result<NameAllocator> {
        NameAllocator::new(
            RandomHex,
            self.id_length.unwrap_or(DEFAULT_NAME_LENGTH),
            self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
        )
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("axisgtd-sync.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".axisgtd").join("axisgtd.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<SyncConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: SyncConfig = toml::from_str(&contents)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &SyncConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (write with force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create database directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Load the config (defaults when absent) and open the store it describes.
pub fn open_store(config_path: Option<&Path>, base: &Path) -> anyhow::Result<SyncStore> {
    let config = load_config(config_path)?.unwrap_or_default();
    let allocator = config.allocator()?;

    let db_path = config.database_path(base);
    ensure_db_dir(&db_path)?;

    let store = SyncStore::open(&db_path)?.with_allocator(allocator);
    Ok(store)
}
