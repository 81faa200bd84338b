use thiserror::Error;

/// Harvest errors
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("Storage init error: {0}")]
    StorageInit(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid catalog entry: {0}")]
    InvalidCatalog(String),

    #[error("Fetch execution error: {0}")]
    FetchExecution(String),

    #[error("Artifact write error: {0}")]
    ArtifactWrite(String),
}
