use crate::{
    FulfillmentOptions, Fulfiller, ListingOptions, ListingStore, Lister, MarketSnapshot,
    SettlementChain, SnapshotDiff, SnapshotError,
};
use alloy::primitives::Address;
use steptract_constants::MarketConstants;
use steptract_types::TypedDataSigner;
use tracing::{info, instrument};

type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Errors returned when opening a [`MarketSession`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The signer has no account.
    #[error("wallet not connected")]
    WalletNotConnected,
    /// The chain is not the one the marketplace is deployed on.
    #[error("wallet is on chain {actual}, expected {expected}")]
    WrongChain {
        /// The marketplace chain.
        expected: u64,
        /// The connected chain.
        actual: u64,
    },
    /// The chain could not be queried.
    #[error("failed to query chain: {0}")]
    Chain(#[source] BoxError),
}

/// A connected account on the marketplace chain.
///
/// The session holds the account's signer, the chain, and the listing
/// store, and lends them to [`Lister`] and [`Fulfiller`] instances for
/// each workflow. Dropping the session disconnects it.
#[derive(Debug)]
pub struct MarketSession<Sign, Chain, Store> {
    account: Address,
    signer: Sign,
    chain: Chain,
    store: Store,
    constants: MarketConstants,
    listing: ListingOptions,
    fulfillment: FulfillmentOptions,
}

impl<Sign, Chain, Store> MarketSession<Sign, Chain, Store>
where
    Sign: TypedDataSigner,
    Chain: SettlementChain,
{
    /// Open a session for the signer's account, checking that `chain` is
    /// the marketplace chain.
    #[instrument(skip_all, fields(expected = constants.chain_id()))]
    pub async fn connect(
        signer: Sign,
        chain: Chain,
        store: Store,
        constants: MarketConstants,
    ) -> Result<Self, SessionError> {
        let account = signer.address();
        if account.is_zero() {
            return Err(SessionError::WalletNotConnected);
        }

        let actual = chain.chain_id().await.map_err(|error| SessionError::Chain(Box::new(error)))?;
        if actual != constants.chain_id() {
            return Err(SessionError::WrongChain { expected: constants.chain_id(), actual });
        }

        info!(%account, chain_id = actual, "session connected");
        Ok(Self {
            account,
            signer,
            chain,
            store,
            constants,
            listing: ListingOptions::default(),
            fulfillment: FulfillmentOptions::default(),
        })
    }
}

impl<Sign, Chain, Store> MarketSession<Sign, Chain, Store> {
    /// Set the options used by [`Self::lister`].
    pub const fn with_listing_options(mut self, options: ListingOptions) -> Self {
        self.listing = options;
        self
    }

    /// Set the options used by [`Self::fulfiller`].
    pub const fn with_fulfillment_options(mut self, options: FulfillmentOptions) -> Self {
        self.fulfillment = options;
        self
    }

    /// The connected account.
    pub const fn account(&self) -> Address {
        self.account
    }

    /// Get a reference to the signer.
    pub const fn signer(&self) -> &Sign {
        &self.signer
    }

    /// Get a reference to the chain.
    pub const fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Get a reference to the store.
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Get a reference to the marketplace constants.
    pub const fn constants(&self) -> &MarketConstants {
        &self.constants
    }
}

impl<Sign, Chain, Store> MarketSession<Sign, Chain, Store>
where
    Sign: TypedDataSigner + Sync,
    Chain: SettlementChain + Sync,
    Store: ListingStore + Sync,
{
    /// A lister selling as the session account.
    pub fn lister(&self) -> Lister<&Sign, &Chain, &Store> {
        Lister::new(&self.signer, &self.chain, &self.store, self.constants.clone(), self.listing)
    }

    /// Refresh `snapshot` from the session's store, bounded by the listing
    /// options' network timeout.
    pub async fn refresh(
        &self,
        snapshot: &mut MarketSnapshot,
    ) -> Result<SnapshotDiff, SnapshotError> {
        snapshot.refresh_from(&self.store, self.listing.network_timeout()).await
    }

    /// A fulfiller buying as the session account.
    pub fn fulfiller(&self) -> Fulfiller<&Chain, &Store> {
        Fulfiller::new(
            self.account,
            &self.chain,
            &self.store,
            self.constants.clone(),
            self.fulfillment,
        )
    }
}
