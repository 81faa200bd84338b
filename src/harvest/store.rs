use crate::harvest::error::HarvestError;

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::Connection;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// In-memory snapshot of the ledger, URL to fetch time
pub type UrlIndex = HashMap<String, DateTime<Utc>>;

/// Durable ledger of already-fetched page URLs.
///
/// Backends are selected once at startup; the scheduler only sees this
/// contract. All three operations surface backend failures to the caller,
/// and a presence-check failure is never reported as "absent".
pub trait UrlStore {
    /// Record a URL with the current time. Re-saving an existing URL is a
    /// no-op, not an error and not a timestamp update.
    fn save_url(&self, url: &str) -> Result<(), HarvestError>;

    /// Return every recorded URL. A never-written store yields an empty
    /// map, not an error.
    fn load_urls(&self) -> Result<UrlIndex, HarvestError>;

    /// True iff the URL currently exists in the backing store
    fn is_url_present(&self, url: &str) -> Result<bool, HarvestError>;

    /// Backend name for log output and error context
    fn name(&self) -> &'static str;
}

/// Flat-file ledger: a pretty-printed JSON map of URL to RFC3339 time
pub struct FileStore {
    /// Path of the JSON ledger file
    path: String,
}

impl FileStore {
    /// Create a file-backed store at the given path
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }

    /// Read the full ledger; a missing or empty file is an empty map
    fn load_from_file(&self) -> Result<UrlIndex, HarvestError> {
        let contents = match fs::read_to_string(Path::new(&self.path)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(UrlIndex::new());
            }
            Err(e) => return Err(HarvestError::Io(e)),
        };

        if contents.trim().is_empty() {
            return Ok(UrlIndex::new());
        }

        let urls: UrlIndex = serde_json::from_str(&contents)?;
        Ok(urls)
    }

    fn save_to_file(&self, urls: &UrlIndex) -> Result<(), HarvestError> {
        let encoded = serde_json::to_string_pretty(urls)?;
        fs::write(Path::new(&self.path), encoded)?;
        Ok(())
    }
}

impl UrlStore for FileStore {
    fn save_url(&self, url: &str) -> Result<(), HarvestError> {
        let mut urls = self.load_from_file()?;

        if urls.contains_key(url) {
            debug!("URL already recorded, skipping: {}", url);
            return Ok(());
        }

        urls.insert(url.to_string(), Utc::now());
        self.save_to_file(&urls)
    }

    fn load_urls(&self) -> Result<UrlIndex, HarvestError> {
        self.load_from_file()
    }

    fn is_url_present(&self, url: &str) -> Result<bool, HarvestError> {
        let urls = self.load_from_file()?;
        Ok(urls.contains_key(url))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// SQLite ledger: one table keyed by URL string, schema auto-created
pub struct DbStore {
    /// Connection opened once at startup and reused for the whole run
    conn: Connection,
}

impl DbStore {
    /// Open (or create) the database and ensure the urls table exists
    pub fn open(path: &str) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)
            .map_err(|e| HarvestError::StorageInit(format!("cannot open {}: {}", path, e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS urls (
                url TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| HarvestError::StorageInit(format!("cannot migrate {}: {}", path, e)))?;

        Ok(Self { conn })
    }
}

impl UrlStore for DbStore {
    fn save_url(&self, url: &str) -> Result<(), HarvestError> {
        // INSERT OR IGNORE keeps the original timestamp on re-save
        self.conn.execute(
            "INSERT OR IGNORE INTO urls (url, created_at) VALUES (?1, ?2)",
            rusqlite::params![url, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    fn load_urls(&self) -> Result<UrlIndex, HarvestError> {
        let mut stmt = self.conn.prepare("SELECT url, created_at FROM urls")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut urls = UrlIndex::new();
        for row in rows {
            let (url, created_at) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc);
            urls.insert(url, timestamp);
        }

        Ok(urls)
    }

    fn is_url_present(&self, url: &str) -> Result<bool, HarvestError> {
        let present: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM urls WHERE url = ?1)",
            rusqlite::params![url],
            |row| row.get(0),
        )?;

        Ok(present)
    }

    fn name(&self) -> &'static str {
        "db"
    }
}
