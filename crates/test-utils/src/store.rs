//! An in-memory [`ListingStore`].
use chrono::Utc;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};
use steptract_orders::ListingStore;
use steptract_types::{ListingRecord, NewListing, Sale};

/// Error returned by [`MockListingStore`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum MockStoreError {
    /// A failure scripted by the test.
    #[error("{0}")]
    Scripted(String),
    /// The sale named a token with no record.
    #[error("token {0} not found")]
    NotFound(String),
}

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<String, ListingRecord>,
    fetch_error: Option<String>,
    hang_fetches: bool,
    upsert_error: Option<String>,
    sale_error: Option<String>,
    upserts: Vec<Vec<NewListing>>,
    sales: Vec<Sale>,
}

/// A [`ListingStore`] backed by a map, applying writes the way the
/// marketplace API does.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockListingStore {
    state: Arc<Mutex<State>>,
}

impl MockListingStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding `records`.
    pub fn with_records(records: impl IntoIterator<Item = ListingRecord>) -> Self {
        let store = Self::new();
        store.with_state(|s| {
            s.records.extend(records.into_iter().map(|r| (r.tokenid.clone(), r)));
        });
        store
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    /// Fail every fetch with `message`.
    pub fn failing_fetches(self, message: &str) -> Self {
        self.with_state(|s| s.fetch_error = Some(message.to_owned()));
        self
    }

    /// Never answer a fetch.
    pub fn hanging_fetches(self) -> Self {
        self.with_state(|s| s.hang_fetches = true);
        self
    }

    /// Fail every listing write with `message`.
    pub fn failing_upserts(self, message: &str) -> Self {
        self.with_state(|s| s.upsert_error = Some(message.to_owned()));
        self
    }

    /// Fail every sale write with `message`.
    pub fn failing_sales(self, message: &str) -> Self {
        self.with_state(|s| s.sale_error = Some(message.to_owned()));
        self
    }

    /// The record for `token_id`.
    pub fn record(&self, token_id: &str) -> Option<ListingRecord> {
        self.with_state(|s| s.records.get(token_id).cloned())
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: ListingRecord) {
        self.with_state(|s| s.records.insert(record.tokenid.clone(), record));
    }

    /// Every successful listing batch, in order.
    pub fn upserts(&self) -> Vec<Vec<NewListing>> {
        self.with_state(|s| s.upserts.clone())
    }

    /// Every successful sale, in order.
    pub fn sales(&self) -> Vec<Sale> {
        self.with_state(|s| s.sales.clone())
    }
}

impl ListingStore for MockListingStore {
    type Error = MockStoreError;

    async fn fetch_listings(&self) -> Result<Vec<ListingRecord>, Self::Error> {
        if self.with_state(|s| s.hang_fetches) {
            core::future::pending::<()>().await;
        }
        self.with_state(|s| match &s.fetch_error {
            Some(message) => Err(MockStoreError::Scripted(message.clone())),
            None => Ok(s.records.values().cloned().collect()),
        })
    }

    async fn upsert_listings(&self, listings: Vec<NewListing>) -> Result<(), Self::Error> {
        self.with_state(|s| {
            if let Some(message) = &s.upsert_error {
                return Err(MockStoreError::Scripted(message.clone()));
            }
            let now = Utc::now();
            for listing in &listings {
                s.records
                    .entry(listing.tokenid.clone())
                    .or_insert_with(|| ListingRecord::new(listing.tokenid.clone()))
                    .apply_listing(listing, now);
            }
            s.upserts.push(listings);
            Ok(())
        })
    }

    async fn record_sale(&self, sale: Sale) -> Result<(), Self::Error> {
        self.with_state(|s| {
            if let Some(message) = &s.sale_error {
                return Err(MockStoreError::Scripted(message.clone()));
            }
            let record = s
                .records
                .get_mut(&sale.tokenid)
                .ok_or_else(|| MockStoreError::NotFound(sale.tokenid.clone()))?;
            record.apply_sale(sale.buyer_address, Utc::now());
            s.sales.push(sale);
            Ok(())
        })
    }
}
