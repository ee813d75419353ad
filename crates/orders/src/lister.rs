use crate::{unix_now, ListingOptions, ListingStore, SettlementChain};
use alloy::primitives::{utils::parse_ether, Address, TxHash, U256};
use core::{fmt, future::Future, str::FromStr, time::Duration};
use rust_decimal::Decimal;
use std::collections::HashSet;
use steptract_constants::MarketConstants;
use steptract_types::{
    NewListing, OrderParameters, SeaportOrder, SeaportSigner, SigningError, TypedDataSigner,
};
use tracing::{debug, instrument, warn};

type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Errors returned by [`Lister`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ListingError {
    /// No account is connected.
    #[error("wallet not connected")]
    WalletNotConnected,
    /// No token ids were given.
    #[error("no tokens to list")]
    NoTokens,
    /// A token id is not an unsigned integer.
    #[error("invalid token id: {0:?}")]
    InvalidTokenId(String),
    /// The price is not a positive amount of the native currency.
    #[error("invalid price: {0:?}")]
    InvalidPrice(String),
    /// Reading the collection approval failed.
    #[error("failed to check collection approval: {0}")]
    PermissionCheckFailed(#[source] BoxError),
    /// Granting the collection approval failed.
    #[error("failed to grant collection approval: {0}")]
    PermissionGrantFailed(#[source] BoxError),
    /// The approval transaction was mined but reverted.
    #[error("approval transaction {0} reverted")]
    PermissionReverted(TxHash),
    /// Reading the Seaport counter failed.
    #[error("failed to read the seaport counter: {0}")]
    Counter(#[source] BoxError),
    /// Signing the batch failed. Nothing was persisted.
    #[error("failed to sign orders: {0}")]
    SigningFailed(#[source] SigningError),
    /// The listings could not be written. The signed orders are valid but
    /// not discoverable.
    #[error("failed to persist listings for tokens {token_ids:?}: {source}")]
    PersistenceFailed {
        /// Token ids that were not persisted.
        token_ids: Vec<String>,
        /// The underlying store error.
        #[source]
        source: BoxError,
    },
    /// A network call did not complete in time.
    #[error("timed out ({0})")]
    Timeout(ListingStage),
}

impl From<SigningError> for ListingError {
    fn from(error: SigningError) -> Self {
        match error {
            SigningError::NotConnected => Self::WalletNotConnected,
            other => Self::SigningFailed(other),
        }
    }
}

impl ListingError {
    /// True if the account holder declined to sign.
    pub const fn is_user_rejection(&self) -> bool {
        matches!(self, Self::SigningFailed(error) if error.is_user_rejection())
    }
}

/// Progress of a listing workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStage {
    /// Nothing started.
    Idle,
    /// Reading `isApprovedForAll`.
    CheckingPermission,
    /// Waiting for `setApprovalForAll` to be mined.
    RequestingPermission,
    /// Building one order per token.
    BuildingOrders,
    /// Waiting for the batch signature.
    AwaitingSignatures,
    /// Writing the signed orders to the store.
    Persisting,
    /// Every order is signed and persisted.
    Done,
    /// The workflow stopped with an error.
    Failed,
}

impl fmt::Display for ListingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::CheckingPermission => "checking permission",
            Self::RequestingPermission => "requesting permission",
            Self::BuildingOrders => "building orders",
            Self::AwaitingSignatures => "awaiting signatures",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Lists tokens for sale through Seaport.
///
/// `Lister` is generic over:
/// - `Sign`: A [`TypedDataSigner`] for the seller's account
/// - `Chain`: A [`SettlementChain`] for approvals and the Seaport counter
/// - `Store`: A [`ListingStore`] the signed orders are written to
#[derive(Debug, Clone)]
pub struct Lister<Sign, Chain, Store> {
    signer: SeaportSigner<Sign>,
    chain: Chain,
    store: Store,
    constants: MarketConstants,
    options: ListingOptions,
}

impl<Sign, Chain, Store> Lister<Sign, Chain, Store> {
    /// Create a new lister instance.
    pub fn new(
        signer: Sign,
        chain: Chain,
        store: Store,
        constants: MarketConstants,
        options: ListingOptions,
    ) -> Self {
        let signer = SeaportSigner::for_market(signer, &constants);
        Self { signer, chain, store, constants, options }
    }

    /// Get a reference to the order signer.
    pub const fn signer(&self) -> &SeaportSigner<Sign> {
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

    /// Get a reference to the listing options.
    pub const fn options(&self) -> &ListingOptions {
        &self.options
    }
}

impl<Sign, Chain, Store> Lister<Sign, Chain, Store>
where
    Sign: TypedDataSigner,
{
    /// The seller's address.
    pub fn seller(&self) -> Address {
        self.signer.address()
    }

    /// Build one unsigned order per token for `price` wei, valid from `now`
    /// for the configured window.
    pub fn build_orders(
        &self,
        token_ids: &[U256],
        price: U256,
        counter: U256,
        now: u64,
    ) -> Vec<OrderParameters> {
        let (seller, collection) = (self.seller(), self.constants.collection());
        let (start, end) = self.options.window(now);
        token_ids
            .iter()
            .map(|token_id| {
                OrderParameters::native_listing(seller, collection, *token_id, price)
                    .with_window(start, end)
                    .with_salt(U256::from_be_bytes(rand::random::<[u8; 32]>()))
                    .with_conduit_key(self.constants.conduit_key())
                    .with_counter(counter)
            })
            .collect()
    }
}

impl<Sign, Chain, Store> Lister<Sign, Chain, Store>
where
    Sign: TypedDataSigner,
    Chain: SettlementChain,
{
    /// Make sure Seaport may transfer the seller's tokens, sending
    /// `setApprovalForAll` if it may not.
    ///
    /// Returns the hash of the approval transaction, if one was sent.
    #[instrument(skip_all, fields(seller = %self.seller()))]
    pub async fn ensure_approval(&self) -> Result<Option<TxHash>, ListingError> {
        let (collection, seller, seaport) =
            (self.constants.collection(), self.seller(), self.constants.seaport());

        debug!(stage = %ListingStage::CheckingPermission);
        let approved = bounded(
            self.options.network_timeout(),
            ListingStage::CheckingPermission,
            self.chain.is_approved_for_all(collection, seller, seaport),
        )
        .await?
        .map_err(|error| ListingError::PermissionCheckFailed(Box::new(error)))?;
        if approved {
            return Ok(None);
        }

        debug!(stage = %ListingStage::RequestingPermission);
        let receipt = bounded(
            self.options.confirmation_timeout(),
            ListingStage::RequestingPermission,
            self.chain.set_approval_for_all(collection, seller, seaport),
        )
        .await?
        .map_err(|error| ListingError::PermissionGrantFailed(Box::new(error)))?;
        if !receipt.success {
            return Err(ListingError::PermissionReverted(receipt.tx_hash));
        }

        debug!(tx_hash = %receipt.tx_hash, "collection approval granted");
        Ok(Some(receipt.tx_hash))
    }

    async fn seller_counter(&self) -> Result<U256, ListingError> {
        bounded(
            self.options.network_timeout(),
            ListingStage::BuildingOrders,
            self.chain.counter(self.constants.seaport(), self.seller()),
        )
        .await?
        .map_err(|error| ListingError::Counter(Box::new(error)))
    }
}

impl<Sign, Chain, Store> Lister<Sign, Chain, Store>
where
    Sign: TypedDataSigner,
    Chain: SettlementChain,
    Store: ListingStore,
{
    /// List `token_ids` for `price`, a decimal amount of the native
    /// currency.
    ///
    /// All orders are signed with one signature request. Nothing is
    /// persisted unless every order is signed, and the signed orders are
    /// persisted in a single batch.
    #[instrument(skip_all, fields(token_count = token_ids.len(), %price))]
    pub async fn list<T: AsRef<str>>(
        &self,
        token_ids: &[T],
        price: &str,
    ) -> Result<Vec<SeaportOrder>, ListingError> {
        let result = self.list_inner(token_ids, price).await;
        match &result {
            Ok(orders) => debug!(stage = %ListingStage::Done, listed = orders.len()),
            Err(error) => warn!(stage = %ListingStage::Failed, %error, "listing failed"),
        }
        result
    }

    async fn list_inner<T: AsRef<str>>(
        &self,
        token_ids: &[T],
        price: &str,
    ) -> Result<Vec<SeaportOrder>, ListingError> {
        debug!(stage = %ListingStage::Idle);
        if self.seller().is_zero() {
            return Err(ListingError::WalletNotConnected);
        }
        let token_ids = parse_token_ids(token_ids)?;
        let (price, wei) = parse_price(price)?;

        self.ensure_approval().await?;

        debug!(stage = %ListingStage::BuildingOrders);
        let counter = self.seller_counter().await?;
        let orders = self.build_orders(&token_ids, wei, counter, unix_now());

        debug!(stage = %ListingStage::AwaitingSignatures, orders = orders.len());
        let signed = self.signer.sign_orders(orders).await?;

        debug!(stage = %ListingStage::Persisting);
        self.persist(&signed, price).await?;
        Ok(signed)
    }

    /// Write signed orders to the store as one batch, listed at `price`.
    #[instrument(skip_all, fields(order_count = orders.len()))]
    pub async fn persist(
        &self,
        orders: &[SeaportOrder],
        price: Decimal,
    ) -> Result<(), ListingError> {
        let token_ids: Vec<String> = orders
            .iter()
            .map(|order| {
                order.parameters.offered_token().map(|(_, id)| id).unwrap_or_default().to_string()
            })
            .collect();

        let listings = orders
            .iter()
            .zip(&token_ids)
            .map(|(order, token_id)| NewListing::from_order(order, token_id.as_str(), price))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| ListingError::PersistenceFailed {
                token_ids: token_ids.clone(),
                source: Box::new(error),
            })?;

        let written = tokio::time::timeout(
            self.options.network_timeout(),
            self.store.upsert_listings(listings),
        )
        .await;
        let source: BoxError = match written {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(error)) => Box::new(error),
            Err(elapsed) => Box::new(elapsed),
        };

        warn!(?token_ids, %source, "signed orders were not persisted");
        Err(ListingError::PersistenceFailed { token_ids, source })
    }
}

/// Run `fut`, failing with [`ListingError::Timeout`] after `limit`.
async fn bounded<F: Future>(
    limit: Duration,
    stage: ListingStage,
    fut: F,
) -> Result<F::Output, ListingError> {
    tokio::time::timeout(limit, fut).await.map_err(|_| ListingError::Timeout(stage))
}

/// Parse token ids as unsigned integers, dropping repeats.
fn parse_token_ids<T: AsRef<str>>(token_ids: &[T]) -> Result<Vec<U256>, ListingError> {
    if token_ids.is_empty() {
        return Err(ListingError::NoTokens);
    }

    let mut seen = HashSet::with_capacity(token_ids.len());
    let mut parsed = Vec::with_capacity(token_ids.len());
    for raw in token_ids {
        let raw = raw.as_ref().trim();
        let id = U256::from_str(raw).map_err(|_| ListingError::InvalidTokenId(raw.to_owned()))?;
        if seen.insert(id) {
            parsed.push(id);
        }
    }
    Ok(parsed)
}

/// Parse a positive decimal price into its stored form and its wei amount.
fn parse_price(price: &str) -> Result<(Decimal, U256), ListingError> {
    let trimmed = price.trim();
    let invalid = || ListingError::InvalidPrice(price.to_owned());

    let decimal = Decimal::from_str(trimmed).map_err(|_| invalid())?;
    if decimal <= Decimal::ZERO {
        return Err(invalid());
    }
    let wei = parse_ether(trimmed).map_err(|_| invalid())?;
    if wei.is_zero() {
        return Err(invalid());
    }
    Ok((decimal.normalize(), wei))
}
