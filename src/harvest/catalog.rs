use crate::harvest::config::defaults;
use crate::harvest::error::HarvestError;

use log::debug;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

fn default_reviews_per_page() -> u64 {
    defaults::REVIEWS_PER_PAGE
}

/// Static description of one product line's review pagination.
///
/// Immutable once loaded; pagination math and URL resolution derive
/// everything else from these four fields.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    /// Product model name, used to name per-page artifacts
    pub model: String,

    /// Review page base URL (scheme + host + path, no query)
    pub base_url: String,

    /// Total number of reviews the product currently has
    #[serde(default)]
    pub review_count: u64,

    /// Reviews shown per page on the review widget
    #[serde(default = "default_reviews_per_page")]
    pub reviews_per_page: u64,
}

impl CatalogEntry {
    /// Create a validated catalog entry
    pub fn new(
        model: &str,
        base_url: &str,
        review_count: u64,
        reviews_per_page: u64,
    ) -> Result<Self, HarvestError> {
        let entry = Self {
            model: model.to_string(),
            base_url: base_url.to_string(),
            review_count,
            reviews_per_page,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Reject entries that would break pagination math or URL resolution
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.reviews_per_page == 0 {
            return Err(HarvestError::InvalidCatalog(format!(
                "{}: reviews_per_page must be positive",
                self.model
            )));
        }

        if self.model.trim().is_empty() {
            return Err(HarvestError::InvalidCatalog(
                "catalog entry has an empty model name".to_string(),
            ));
        }

        Url::parse(&self.base_url).map_err(|e| {
            HarvestError::InvalidCatalog(format!("{}: bad base URL {}: {}", self.model, self.base_url, e))
        })?;

        Ok(())
    }

    /// Number of review pages this entry spans.
    ///
    /// An exact multiple of reviews_per_page yields the quotient, not
    /// quotient + 1; getting this wrong silently drops or duplicates
    /// the last page.
    pub fn total_page_count(&self) -> u64 {
        let quotient = self.review_count / self.reviews_per_page;
        let remainder = self.review_count % self.reviews_per_page;

        if remainder == 0 {
            quotient
        } else {
            quotient + 1
        }
    }

    /// Resolve the URL for a page number.
    ///
    /// Pages 0 and 1 map to the bare base URL; higher pages append the
    /// yoReviewsPage query parameter the review widget paginates on.
    pub fn page_url(&self, page_number: u64) -> Result<Url, HarvestError> {
        let mut url = Url::parse(&self.base_url)?;

        if page_number > 1 {
            url.set_query(Some(&format!("yoReviewsPage={}", page_number)));
        }

        Ok(url)
    }

    /// Build the immutable page reference handed to the scheduler
    pub fn page_reference(&self, page_number: u64) -> Result<PageReference, HarvestError> {
        Ok(PageReference {
            model: self.model.clone(),
            page_number,
            url: self.page_url(page_number)?,
        })
    }
}

/// One resolved review page, constructed once per enumeration pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReference {
    /// Owning catalog entry's model name
    pub model: String,

    /// 1-based page number within the entry's review pages
    pub page_number: u64,

    /// Fully resolved page URL
    pub url: Url,
}

/// Load and validate catalog entries from a JSON file
pub fn load_catalog(path: &str) -> Result<Vec<CatalogEntry>, HarvestError> {
    let file = File::open(Path::new(path)).map_err(|e| {
        HarvestError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("catalog file not found: {} - {}", path, e),
        ))
    })?;

    let entries: Vec<CatalogEntry> = serde_json::from_reader(BufReader::new(file))?;

    for entry in &entries {
        entry.validate()?;
        debug!(
            "catalog entry {}: {} reviews, {} per page, {} pages",
            entry.model,
            entry.review_count,
            entry.reviews_per_page,
            entry.total_page_count()
        );
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn entry(review_count: u64, reviews_per_page: u64) -> CatalogEntry {
        CatalogEntry::new(
            "hero11",
            "https://example.com/shop/cameras/hero11.html",
            review_count,
            reviews_per_page,
        )
        .unwrap()
    }

    #[test]
    fn test_total_page_count_exact_multiple() {
        assert_eq!(entry(25, 5).total_page_count(), 5);
    }

    #[test]
    fn test_total_page_count_with_remainder() {
        assert_eq!(entry(26, 5).total_page_count(), 6);
    }

    #[test]
    fn test_total_page_count_hero11() {
        // 1358 / 5 = 271 remainder 3
        assert_eq!(entry(1358, 5).total_page_count(), 272);
    }

    #[test]
    fn test_total_page_count_zero_reviews() {
        assert_eq!(entry(0, 5).total_page_count(), 0);
    }

    #[test]
    fn test_zero_reviews_per_page_rejected() {
        let result = CatalogEntry::new("hero11", "https://example.com/", 10, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let result = CatalogEntry::new("hero11", "not a url", 10, 5);
        assert!(result.is_err());
    }

    #[test]
    fn test_page_one_has_no_query() {
        let url = entry(25, 5).page_url(1).unwrap();
        assert_eq!(url.as_str(), "https://example.com/shop/cameras/hero11.html");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_page_zero_maps_to_base_url() {
        let url = entry(25, 5).page_url(0).unwrap();
        assert!(url.query().is_none());
    }

    #[test]
    fn test_page_two_appends_query() {
        let url = entry(25, 5).page_url(2).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/shop/cameras/hero11.html?yoReviewsPage=2"
        );
    }

    #[test]
    fn test_load_catalog() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let mut file = temp_file.reopen().unwrap();
            write!(
                file,
                r#"[{{"model": "hero11", "base_url": "https://example.com/h11.html", "review_count": 1358}}]"#
            )
            .unwrap();
        }

        let entries = load_catalog(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reviews_per_page, defaults::REVIEWS_PER_PAGE);
        assert_eq!(entries[0].total_page_count(), 272);
    }

    #[test]
    fn test_load_catalog_rejects_invalid_entry() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let mut file = temp_file.reopen().unwrap();
            write!(
                file,
                r#"[{{"model": "hero11", "base_url": "https://example.com/", "reviews_per_page": 0}}]"#
            )
            .unwrap();
        }

        assert!(load_catalog(temp_file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_load_catalog_file_not_found() {
        assert!(load_catalog("/path/does/not/exist.json").is_err());
    }
}
