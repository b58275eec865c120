// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use mercato::application::MarketService;
use mercato::domain::{IdGen, Identity, ListingDraft};
use mercato::storage::Repository;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(MarketService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = MarketService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Deterministic id source so tests can assert on issued ids
#[derive(Default)]
pub struct SeqIds(AtomicU64);

impl IdGen for SeqIds {
    fn next_id(&self) -> String {
        format!("id-{:04}", self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// Helper to create a test service whose ids are id-0000, id-0001, ...
pub async fn test_service_with_seq_ids() -> Result<(MarketService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_str().unwrap());
    let repo = Repository::init(&db_url).await?;
    let service = MarketService::with_ids(repo, Box::new(SeqIds::default()));
    Ok((service, temp_dir))
}

pub fn alice() -> Identity {
    Identity::new("alice")
}

pub fn bob() -> Identity {
    Identity::new("bob")
}

pub fn carol() -> Identity {
    Identity::new("carol")
}

/// A complete draft offering `item` at `price` credits
pub fn draft(item: &str, price: i64) -> ListingDraft {
    ListingDraft {
        name: format!("{} & Co", item),
        continent: "Europe".into(),
        country: "Italy".into(),
        location: "Rome".into(),
        zipcode: "00100".into(),
        product_label: "general".into(),
        description: format!("A fine {}", item),
        item_name: item.into(),
        price,
    }
}
