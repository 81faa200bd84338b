use anyhow::Result;
use env_logger::Env;
use log::{error, info};
use std::env;
use std::time::Instant;

use review_crawler::harvest::catalog::load_catalog;
use review_crawler::harvest::config::defaults;
use review_crawler::harvest::executor::OsaScriptFetcher;
use review_crawler::harvest::store::{DbStore, FileStore, UrlStore};
use review_crawler::harvest::{Harvester, HarvestConfig, StorageKind};

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Get command line arguments; flag tokens first, then positionals
    let mut args: Vec<String> = env::args().collect();
    let dry_run = args.iter().any(|a| a == "--dry-run");
    args.retain(|a| a != "--dry-run");

    if args.len() < 2 {
        println!("Usage:");
        println!(
            "  {} run [catalog_file] [storage] [subset_pct] [wait_secs] [--dry-run]",
            args[0]
        );
        println!(
            "  - catalog_file: JSON list of catalog entries (default: {})",
            defaults::CATALOG_FILE
        );
        println!("  - storage: URL ledger backend, 'file' or 'db' (default: file)");
        println!(
            "  - subset_pct: percentage of outstanding pages fetched per run (default: {})",
            defaults::SUBSET_PERCENTAGE
        );
        println!(
            "  - wait_secs: seconds the generated script waits for the page to render (default: {})",
            defaults::WAIT_SECONDS
        );
        println!("  - --dry-run: resolve and throttle pages but skip the executor");
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "run" => {
            let catalog_file = args
                .get(2)
                .map(|s| s.as_str())
                .unwrap_or(defaults::CATALOG_FILE);

            let storage = args
                .get(3)
                .and_then(|s| StorageKind::from_arg(s))
                .unwrap_or(StorageKind::File);
            let subset_pct = args
                .get(4)
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::SUBSET_PERCENTAGE);
            let wait_secs = args
                .get(5)
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::WAIT_SECONDS);

            // Create config using builder
            let config = HarvestConfig::builder()
                .storage(storage)
                .subset_percentage(subset_pct)
                .wait_seconds(wait_secs)
                .dry_run(dry_run)
                .build();

            let entries = load_catalog(catalog_file)?;
            info!("loaded {} catalog entries from {}", entries.len(), catalog_file);

            // Open the ledger once; it is reused for the whole run
            let store: Box<dyn UrlStore> = match config.storage {
                StorageKind::File => Box::new(FileStore::new(&config.file_store_path)),
                StorageKind::Db => Box::new(DbStore::open(&config.db_store_path)?),
            };

            let fetcher = OsaScriptFetcher::new(&config.data_dir, config.wait_seconds);
            let harvester = Harvester::new(config.clone(), store.as_ref(), &fetcher);

            info!(
                "starting harvest: {} backend, {}% subset, {}s wait{}",
                storage.name(),
                subset_pct,
                wait_secs,
                if dry_run { ", dry run" } else { "" }
            );
            let start = Instant::now();

            // A failed entry aborts only its own batch, not the whole run
            for entry in &entries {
                match harvester.run(entry) {
                    Ok(report) => info!("{}", serde_json::to_string(&report)?),
                    Err(e) => error!("failed harvesting {}: {}", entry.model, e),
                }
            }

            let duration = start.elapsed();
            info!("harvest completed in {:?}", duration);
        }
        _ => {
            println!("Unknown command: {}", command);
            println!("Use the 'run' command");
        }
    }

    Ok(())
}
