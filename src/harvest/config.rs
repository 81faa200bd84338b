/// Default configuration constants
pub mod defaults {
    /// Default percentage of outstanding pages fetched per run
    pub const SUBSET_PERCENTAGE: u64 = 10;

    /// Default seconds to let a review page finish rendering before capture
    pub const WAIT_SECONDS: u64 = 30;

    /// Default politeness delay between successive fetches in milliseconds
    pub const PAGE_DELAY_MS: u64 = 2000;

    /// Default reviews shown per page when a catalog entry does not say
    pub const REVIEWS_PER_PAGE: u64 = 5;

    /// Default path of the flat-file URL ledger
    pub const FILE_STORE_PATH: &str = "urls.json";

    /// Default path of the SQLite URL ledger
    pub const DB_STORE_PATH: &str = "urls.db";

    /// Default directory for page text and script artifacts
    pub const DATA_DIR: &str = "output/pages";

    /// Default catalog file listing the product entries to harvest
    pub const CATALOG_FILE: &str = "input/catalog.json";
}

/// Which URL ledger backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Flat JSON file mapping URL to fetch time
    File,

    /// Single-table SQLite database
    Db,
}

impl StorageKind {
    /// Parse a storage selector argument ("file" or "db")
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "file" | "json" => Some(StorageKind::File),
            "db" | "sqlite" => Some(StorageKind::Db),
            _ => None,
        }
    }

    /// Name used in log output and error context
    pub fn name(&self) -> &'static str {
        match self {
            StorageKind::File => "file",
            StorageKind::Db => "db",
        }
    }
}

/// Configuration for one harvest run
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Which ledger backend to open at startup
    pub storage: StorageKind,

    /// Percentage (0-100) of not-yet-fetched pages taken per run
    pub subset_percentage: u64,

    /// Seconds the generated script waits for the page to render
    pub wait_seconds: u64,

    /// Politeness delay between successive fetch dispatches in milliseconds
    pub page_delay_ms: u64,

    /// Skip invoking the executor and updating the ledger
    pub dry_run: bool,

    /// Directory where page text and script artifacts are written
    pub data_dir: String,

    /// Path of the flat-file ledger (file backend)
    pub file_store_path: String,

    /// Path of the SQLite ledger (db backend)
    pub db_store_path: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        use defaults::*;

        Self {
            storage: StorageKind::File,
            subset_percentage: SUBSET_PERCENTAGE,
            wait_seconds: WAIT_SECONDS,
            page_delay_ms: PAGE_DELAY_MS,
            dry_run: false,
            data_dir: DATA_DIR.to_string(),
            file_store_path: FILE_STORE_PATH.to_string(),
            db_store_path: DB_STORE_PATH.to_string(),
        }
    }
}

impl HarvestConfig {
    /// Create a builder for more granular configuration
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder::default()
    }
}

/// Builder for HarvestConfig to allow for more granular configuration
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl Default for HarvestConfigBuilder {
    fn default() -> Self {
        Self {
            config: HarvestConfig::default(),
        }
    }
}

impl HarvestConfigBuilder {
    /// Set the ledger backend
    pub fn storage(mut self, storage: StorageKind) -> Self {
        self.config.storage = storage;
        self
    }

    /// Set the subset percentage throttle, clamped to the 0-100 range
    pub fn subset_percentage(mut self, pct: u64) -> Self {
        self.config.subset_percentage = pct.min(100);
        self
    }

    /// Set the script render wait in seconds
    pub fn wait_seconds(mut self, secs: u64) -> Self {
        self.config.wait_seconds = secs;
        self
    }

    /// Set the politeness delay between fetches in milliseconds
    pub fn page_delay_ms(mut self, delay: u64) -> Self {
        self.config.page_delay_ms = delay;
        self
    }

    /// Enable or disable dry-run mode
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Set the artifact data directory
    pub fn data_dir(mut self, dir: &str) -> Self {
        self.config.data_dir = dir.to_string();
        self
    }

    /// Set the flat-file ledger path
    pub fn file_store_path(mut self, path: &str) -> Self {
        self.config.file_store_path = path.to_string();
        self
    }

    /// Set the SQLite ledger path
    pub fn db_store_path(mut self, path: &str) -> Self {
        self.config.db_store_path = path.to_string();
        self
    }

    /// Build the final HarvestConfig
    pub fn build(self) -> HarvestConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = HarvestConfig::builder()
            .storage(StorageKind::Db)
            .subset_percentage(25)
            .dry_run(true)
            .build();

        assert_eq!(config.storage, StorageKind::Db);
        assert_eq!(config.subset_percentage, 25);
        assert!(config.dry_run);
        assert_eq!(config.page_delay_ms, defaults::PAGE_DELAY_MS);
    }

    #[test]
    fn test_builder_clamps_subset_percentage() {
        let config = HarvestConfig::builder().subset_percentage(250).build();
        assert_eq!(config.subset_percentage, 100);

        let config = HarvestConfig::builder().subset_percentage(100).build();
        assert_eq!(config.subset_percentage, 100);
    }

    #[test]
    fn test_storage_kind_from_arg() {
        assert_eq!(StorageKind::from_arg("file"), Some(StorageKind::File));
        assert_eq!(StorageKind::from_arg("db"), Some(StorageKind::Db));
        assert_eq!(StorageKind::from_arg("redis"), None);
    }
}
