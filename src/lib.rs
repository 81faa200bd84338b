//! Review Crawler - a review page harvesting library
//!
//! This library resolves the review pages of product catalog entries,
//! deduplicates them against a durable URL ledger, and fetches a throttled
//! subset per run through an external UI-automation executor.

pub mod harvest;
