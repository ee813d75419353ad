use super::{ListingRepository, MarketContracts, RepositoryError};
use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc};
use steptract_types::{compare_token_ids, ListingRecord, NewListing, Sale};
use tokio::sync::RwLock;

/// Records held in process memory. Writes take one lock, so a batch is
/// applied atomically.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    records: Arc<RwLock<HashMap<String, ListingRecord>>>,
    contracts: MarketContracts,
}

impl MemoryRepository {
    /// An empty repository.
    pub fn new(contracts: MarketContracts) -> Self {
        Self { records: Default::default(), contracts }
    }

    /// A repository seeded with `records`, e.g. the collection's unlisted
    /// tokens and their metadata.
    pub fn with_records(
        contracts: MarketContracts,
        records: impl IntoIterator<Item = ListingRecord>,
    ) -> Self {
        let records = records.into_iter().map(|r| (r.tokenid.clone(), r)).collect();
        Self { records: Arc::new(RwLock::new(records)), contracts }
    }
}

impl ListingRepository for MemoryRepository {
    async fn all(&self) -> Result<Vec<ListingRecord>, RepositoryError> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| compare_token_ids(&a.tokenid, &b.tokenid));
        Ok(records)
    }

    async fn upsert(
        &self,
        listings: Vec<NewListing>,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        for listing in &listings {
            let record = records
                .entry(listing.tokenid.clone())
                .or_insert_with(|| ListingRecord::new(listing.tokenid.clone()));
            record.apply_listing(listing, at);
            self.contracts.apply(record);
        }
        Ok(())
    }

    async fn mark_sold(&self, sale: Sale, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        let record =
            records.get_mut(&sale.tokenid).ok_or(RepositoryError::NotFound(sale.tokenid))?;
        record.apply_sale(sale.buyer_address, at);
        Ok(())
    }
}
