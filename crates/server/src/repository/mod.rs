use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use core::future::Future;
use steptract_types::{ListingRecord, NewListing, Sale};

mod memory;
pub use memory::MemoryRepository;

mod postgrest;
pub use postgrest::PostgrestRepository;

/// Errors returned by a [`ListingRepository`].
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No record exists for the token.
    #[error("No record for token {0}")]
    NotFound(String),
    /// The backing store rejected the request.
    #[error("store returned {status}: {message}")]
    Store {
        /// The HTTP status returned by the store.
        status: u16,
        /// The store's error message.
        message: String,
    },
    /// The backing store could not be reached.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// A URL could not be built.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Contract addresses stamped onto every listing written by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarketContracts {
    /// The collection contract.
    pub nft_contract: Option<Address>,
    /// The Seaport contract.
    pub marketplace_contract: Option<Address>,
}

impl MarketContracts {
    /// Stamp the addresses onto `record`, keeping any it already has when
    /// none is configured.
    pub(crate) fn apply(&self, record: &mut ListingRecord) {
        record.nft_contract = self.nft_contract.or(record.nft_contract);
        record.marketplace_contract = self.marketplace_contract.or(record.marketplace_contract);
    }
}

/// Storage for listing records, one per token id.
pub trait ListingRepository: Send + Sync + 'static {
    /// Every record, ordered by token id.
    fn all(&self) -> impl Future<Output = Result<Vec<ListingRecord>, RepositoryError>> + Send;

    /// Write `listings` as active listings at `at`. Either every listing is
    /// written or none is. Display metadata of existing records is kept.
    fn upsert(
        &self,
        listings: Vec<NewListing>,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Clear the listing for the sold token and record its buyer. Fails with
    /// [`RepositoryError::NotFound`] when no record exists.
    fn mark_sold(
        &self,
        sale: Sale,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
