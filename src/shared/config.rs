//! Application configuration. Storage location and backend, analytics window, batch sizing.

use serde::Deserialize;

/// Default number of records classified per blocking task.
pub const DEFAULT_SEGMENTATION_CHUNK_SIZE: usize = 512;

/// Default trailing window (months) for segment growth.
pub const DEFAULT_GROWTH_WINDOW_MONTHS: u32 = crate::domain::analytics::DEFAULT_GROWTH_WINDOW_MONTHS;

/// Which customer store to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// libsql database at `{data_dir}/customers.db`.
    #[default]
    Sqlite,
    /// Pretty-printed JSON at `{data_dir}/customers.json`.
    Json,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory holding the customer store. Read from BANKSEG_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Store backend: "sqlite" or "json". Read from BANKSEG_STORAGE.
    #[serde(default)]
    pub storage: Option<StorageBackend>,

    /// Months covered by segment growth (default 6). Read from BANKSEG_GROWTH_WINDOW_MONTHS.
    #[serde(default)]
    pub growth_window_months: Option<u32>,

    /// Records per classification task (default 512). Read from BANKSEG_SEGMENTATION_CHUNK_SIZE.
    #[serde(default)]
    pub segmentation_chunk_size: Option<usize>,

    /// CSV imported at start-up when the store is empty. Read from BANKSEG_IMPORT_PATH.
    #[serde(default)]
    pub import_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("BANKSEG_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        // Environment wins over the file.
        c = c.add_source(config::Environment::with_prefix("BANKSEG").try_parsing(true));
        c.build()?.try_deserialize()
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    pub fn storage_or_default(&self) -> StorageBackend {
        self.storage.unwrap_or_default()
    }

    /// Returns growth window months. Defaults to 6 if unset.
    pub fn growth_window_months_or_default(&self) -> u32 {
        self.growth_window_months
            .unwrap_or(DEFAULT_GROWTH_WINDOW_MONTHS)
    }

    /// Returns classification chunk size. Defaults to DEFAULT_SEGMENTATION_CHUNK_SIZE if unset or zero.
    pub fn segmentation_chunk_size_or_default(&self) -> usize {
        self.segmentation_chunk_size
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SEGMENTATION_CHUNK_SIZE)
    }
}
