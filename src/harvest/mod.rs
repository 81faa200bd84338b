pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod scheduler;
pub mod store;

pub use catalog::CatalogEntry;
pub use catalog::PageReference;
pub use config::{HarvestConfig, StorageKind};
pub use error::HarvestError;
pub use scheduler::{Harvester, RunReport};
pub use store::UrlStore;
