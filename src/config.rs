use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::order::SortOrder;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub view: ViewConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Key holding the serialized collection in the primary store.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    #[serde(default = "default_primary_capacity")]
    pub primary_capacity_bytes: usize,

    /// Name of the fallback record database.
    #[serde(default = "default_secondary_name")]
    pub secondary_name: String,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gallerypix")
}

fn default_primary_key() -> String {
    "albumsDB".to_string()
}

fn default_primary_capacity() -> usize {
    crate::storage::local::DEFAULT_CAPACITY
}

fn default_secondary_name() -> String {
    "GalleryPixDB".to_string()
}

impl StorageConfig {
    pub fn primary_dir(&self) -> PathBuf {
        self.data_dir.join("local_storage")
    }

    pub fn secondary_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.secondary_name))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            primary_key: default_primary_key(),
            primary_capacity_bytes: default_primary_capacity(),
            secondary_name: default_secondary_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,

    #[serde(default = "default_max_photos")]
    pub max_photos: usize,

    #[serde(default = "default_max_cover_bytes")]
    pub max_cover_bytes: u64,

    /// Batches larger than this are converted in chunks.
    #[serde(default = "default_chunk_threshold")]
    pub chunk_threshold: usize,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Pause between chunks so the interface keeps drawing.
    #[serde(default = "default_chunk_yield_ms")]
    pub chunk_yield_ms: u64,

    #[serde(default = "default_conversion_timeout_secs")]
    pub conversion_timeout_secs: u64,

    /// Extensions picked up when a directory is added.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_max_total_bytes() -> u64 {
    50 * 1024 * 1024 // 50MB
}

fn default_max_photos() -> usize {
    50
}

fn default_max_cover_bytes() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_chunk_threshold() -> usize {
    50
}

fn default_chunk_size() -> usize {
    10
}

fn default_chunk_yield_ms() -> u64 {
    100
}

fn default_conversion_timeout_secs() -> u64 {
    30
}

fn default_image_extensions() -> Vec<String> {
    vec![
        "jpg".to_string(),
        "jpeg".to_string(),
        "png".to_string(),
        "gif".to_string(),
        "webp".to_string(),
        "bmp".to_string(),
        "svg".to_string(),
        "avif".to_string(),
        "heic".to_string(),
    ]
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_total_bytes: default_max_total_bytes(),
            max_photos: default_max_photos(),
            max_cover_bytes: default_max_cover_bytes(),
            chunk_threshold: default_chunk_threshold(),
            chunk_size: default_chunk_size(),
            chunk_yield_ms: default_chunk_yield_ms(),
            conversion_timeout_secs: default_conversion_timeout_secs(),
            image_extensions: default_image_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub default_sort: SortOrder,
}

fn default_page_size() -> usize {
    crate::view::DEFAULT_PAGE_SIZE
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_sort: SortOrder::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// How long toasts and error messages stay visible.
    #[serde(default = "default_notification_ms")]
    pub notification_ms: u64,

    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_notification_ms() -> u64 {
    3000
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notification_ms: default_notification_ms(),
            download_dir: default_download_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("GALLERYPIX_CONFIG") {
            return Self::load_from(Path::new(&path));
        }

        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Create default config
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gallerypix")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [view]
            default_sort = "name-desc"

            [ingest]
            max_photos = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.view.default_sort, SortOrder::NameDesc);
        assert_eq!(config.view.page_size, 12);
        assert_eq!(config.ingest.max_photos, 20);
        assert_eq!(config.ingest.chunk_size, 10);
        assert_eq!(config.storage.primary_key, "albumsDB");
        assert_eq!(config.storage.primary_capacity_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gallerypix").join("config.toml");

        let mut config = Config::default();
        config.storage.data_dir = dir.path().join("data");
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage.data_dir, dir.path().join("data"));
        assert_eq!(loaded.storage.secondary_path(), dir.path().join("data/GalleryPixDB.db"));
    }
}
