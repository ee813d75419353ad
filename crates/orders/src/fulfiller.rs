use crate::{unix_now, FulfillmentOptions, ListingStore, SettlementChain, SettlementReceipt};
use alloy::{
    network::TransactionBuilder,
    primitives::{Address, TxHash, B256, U256},
    rpc::types::TransactionRequest,
};
use core::{fmt, future::Future, time::Duration};
use steptract_constants::MarketConstants;
use steptract_types::{CodecError, ListingRecord, OrderWindow, Sale, SeaportOrder};
use tracing::{debug, error, instrument, warn};

type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Why a settlement transaction reverted, read from the failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
    /// The order signature does not verify. The listing is stale or the
    /// stored copy was altered.
    InvalidSignature,
    /// A zone or contract offerer refused the fill.
    PolicyRejected,
    /// The transaction value does not cover the consideration.
    ValueMismatch,
    /// The order was cancelled, already filled, or is outside its window.
    OrderUnavailable,
    /// Anything else, with the raw message.
    Other(String),
}

/// Seaport errors for a signature that does not verify.
const SIGNATURE_ERRORS: &[&str] = &["BadSignatureV", "InvalidSigner", "InvalidSignature"];

/// Seaport errors raised when a zone or contract offerer refuses a fill.
const POLICY_ERRORS: &[&str] = &["InvalidRestrictedOrder", "InvalidContractOrder"];

/// Seaport errors for a payment that does not match the consideration.
const VALUE_ERRORS: &[&str] = &["InsufficientNativeTokensSupplied", "InvalidMsgValue"];

/// Seaport errors for an order that can no longer be filled.
const UNAVAILABLE_ERRORS: &[&str] =
    &["OrderAlreadyFilled", "OrderIsCancelled", "OrderPartiallyFilled", "InvalidTime"];

impl RevertReason {
    /// Classify a failure message by the Seaport error it names.
    ///
    /// Error names are matched as whole words, so the decoded revert from
    /// an RPC node and a wallet's rendering of it both classify. Any other
    /// text is [`RevertReason::Other`].
    pub fn from_message(message: &str) -> Self {
        let names = |errors: &[&str]| {
            message
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|word| errors.iter().any(|error| word.eq_ignore_ascii_case(error)))
        };

        if names(SIGNATURE_ERRORS) || message.to_lowercase().contains("invalid signature") {
            Self::InvalidSignature
        } else if names(POLICY_ERRORS) {
            Self::PolicyRejected
        } else if names(VALUE_ERRORS) {
            Self::ValueMismatch
        } else if names(UNAVAILABLE_ERRORS) {
            Self::OrderUnavailable
        } else {
            Self::Other(message.to_owned())
        }
    }
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSignature => f.write_str("the listing signature is invalid"),
            Self::PolicyRejected => f.write_str("the order's zone rejected the fill"),
            Self::ValueMismatch => f.write_str("the payment does not match the price"),
            Self::OrderUnavailable => f.write_str("the order is no longer available"),
            Self::Other(message) => f.write_str(message),
        }
    }
}

/// Errors returned by [`Fulfiller`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FulfillmentError {
    /// The buyer is the seller of record.
    #[error("cannot buy your own listing")]
    SelfTrade,
    /// The token has no active listing.
    #[error("token {0} is not listed")]
    NotListed(String),
    /// The stored order could not be normalized.
    #[error("stored order is malformed: {0}")]
    MalformedOrder(#[from] CodecError),
    /// The order's end time has passed.
    #[error("order expired at {end_time}")]
    OrderExpired {
        /// The order's end time.
        end_time: U256,
    },
    /// The stored order hash does not match the hash of the stored order.
    #[error("stored order hash {stored:?} does not match computed hash {computed}")]
    OrderIntegrityMismatch {
        /// Hash stored with the listing.
        stored: Option<B256>,
        /// Hash of the normalized order.
        computed: B256,
    },
    /// The buyer cannot pay the price plus gas.
    #[error("insufficient funds for price and gas")]
    InsufficientFunds,
    /// The buyer declined the transaction.
    #[error("transaction rejected by the user")]
    UserRejected,
    /// The settlement transaction reverted.
    #[error("settlement reverted: {0}")]
    SettlementReverted(RevertReason),
    /// The transaction could not be submitted.
    #[error("failed to submit transaction: {0}")]
    Submission(#[source] BoxError),
    /// Reading the listing store failed.
    #[error("failed to read listings: {0}")]
    Store(#[source] BoxError),
    /// The sale settled but the store was not updated.
    #[error("purchase {tx_hash} confirmed but the listing was not updated: {source}")]
    PersistenceFailed {
        /// The settlement transaction.
        tx_hash: TxHash,
        /// The underlying store error.
        #[source]
        source: BoxError,
    },
    /// A network call did not complete in time.
    #[error("timed out ({0})")]
    Timeout(FulfillmentStage),
}

impl FulfillmentError {
    /// Classify a failure to submit or execute the settlement transaction.
    pub fn from_chain_error<E>(error: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        let message = error.to_string();
        let lower = message.to_lowercase();

        if lower.contains("user rejected")
            || lower.contains("user denied")
            || lower.contains("rejected the request")
        {
            return Self::UserRejected;
        }
        if lower.contains("insufficient funds") {
            return Self::InsufficientFunds;
        }
        match RevertReason::from_message(&message) {
            RevertReason::Other(_) if !lower.contains("revert") => {
                Self::Submission(Box::new(error))
            }
            reason => Self::SettlementReverted(reason),
        }
    }
}

/// Progress of a fulfillment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentStage {
    /// Nothing started.
    Idle,
    /// Checking the listing and its stored order.
    Validating,
    /// Computing the payment and the gas limit.
    EstimatingCost,
    /// Waiting for the buyer to approve the transaction.
    AwaitingConfirmation,
    /// Waiting for the transaction to be mined.
    Submitted,
    /// Mined and recorded.
    Confirmed,
    /// The workflow stopped with an error.
    Failed,
}

impl fmt::Display for FulfillmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::EstimatingCost => "estimating cost",
            Self::AwaitingConfirmation => "awaiting confirmation",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        })
    }
}

/// `estimate × percent / 100`, rounded up.
pub const fn apply_gas_margin(estimate: u64, percent: u64) -> u64 {
    estimate.saturating_mul(percent).div_ceil(100)
}

/// Buys listed tokens through Seaport.
///
/// `Fulfiller` is generic over:
/// - `Chain`: A [`SettlementChain`] that sends transactions for the buyer
/// - `Store`: A [`ListingStore`] holding the listings and recording sales
#[derive(Debug, Clone)]
pub struct Fulfiller<Chain, Store> {
    buyer: Address,
    chain: Chain,
    store: Store,
    constants: MarketConstants,
    options: FulfillmentOptions,
}

impl<Chain, Store> Fulfiller<Chain, Store> {
    /// Create a new fulfiller instance.
    pub const fn new(
        buyer: Address,
        chain: Chain,
        store: Store,
        constants: MarketConstants,
        options: FulfillmentOptions,
    ) -> Self {
        Self { buyer, chain, store, constants, options }
    }

    /// The buying account.
    pub const fn buyer(&self) -> Address {
        self.buyer
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

    /// Get a reference to the fulfillment options.
    pub const fn options(&self) -> &FulfillmentOptions {
        &self.options
    }

    /// Check that `record` can be bought by this buyer at `now`, and return
    /// its normalized order.
    ///
    /// An order whose window has not started only logs a warning, since the
    /// local clock may trail the chain. A stored hash that does not match
    /// the normalized order is always rejected.
    pub fn validate(
        &self,
        record: &ListingRecord,
        now: u64,
    ) -> Result<SeaportOrder, FulfillmentError> {
        if record.seller_address == Some(self.buyer) {
            return Err(FulfillmentError::SelfTrade);
        }
        if !record.is_listed() {
            return Err(FulfillmentError::NotListed(record.tokenid.clone()));
        }
        let order = record
            .order()
            .ok_or_else(|| FulfillmentError::NotListed(record.tokenid.clone()))??;

        match order.parameters.window_at(now) {
            OrderWindow::Expired => {
                return Err(FulfillmentError::OrderExpired { end_time: order.parameters.end_time })
            }
            OrderWindow::NotStarted => warn!(
                start_time = %order.parameters.start_time,
                now,
                "order window has not started"
            ),
            OrderWindow::Active => {}
        }

        let computed = order.hash();
        if record.order_hash != Some(computed) {
            return Err(FulfillmentError::OrderIntegrityMismatch {
                stored: record.order_hash,
                computed,
            });
        }

        Ok(order)
    }

    /// The `fulfillOrder` transaction for `order` at `now`, paying the
    /// larger of the start amounts and the amounts Seaport will require at
    /// `now`.
    pub fn transaction(&self, order: &SeaportOrder, now: u64) -> TransactionRequest {
        let tx = order.to_fulfill_tx(self.constants.seaport(), order.parameters.conduit_key);
        let value = TransactionBuilder::value(&tx).unwrap_or_default().max(order.parameters.native_total_at(now));
        tx.with_from(self.buyer).with_value(value)
    }
}

impl<Chain, Store> Fulfiller<Chain, Store>
where
    Chain: SettlementChain,
{
    /// The gas limit for `tx`: the estimate plus the configured margin, or
    /// the fallback limit if estimation fails.
    #[instrument(skip_all)]
    pub async fn gas_limit(&self, tx: &TransactionRequest) -> u64 {
        let fallback = self.options.fallback_gas_limit();
        let timeout = self.options.network_timeout();
        let estimate = tokio::time::timeout(timeout, self.chain.estimate_gas(tx.clone())).await;
        match estimate {
            Ok(Ok(gas)) => apply_gas_margin(gas, self.options.gas_multiplier_percent()),
            Ok(Err(error)) => {
                warn!(%error, fallback, "gas estimation failed");
                fallback
            }
            Err(_) => {
                warn!(fallback, "gas estimation timed out");
                fallback
            }
        }
    }

    /// Send `tx` and wait for it to be mined.
    async fn settle(&self, tx: TransactionRequest) -> Result<SettlementReceipt, FulfillmentError> {
        debug!(stage = %FulfillmentStage::AwaitingConfirmation);
        let tx_hash =
            self.chain.send_transaction(tx).await.map_err(FulfillmentError::from_chain_error)?;

        debug!(stage = %FulfillmentStage::Submitted, %tx_hash);
        let receipt = bounded(
            self.options.confirmation_timeout(),
            FulfillmentStage::Submitted,
            self.chain.wait_for_receipt(tx_hash),
        )
        .await?
        .map_err(FulfillmentError::from_chain_error)?;

        if !receipt.success {
            return Err(FulfillmentError::SettlementReverted(RevertReason::Other(format!(
                "transaction {} reverted",
                receipt.tx_hash
            ))));
        }
        Ok(receipt)
    }
}

impl<Chain, Store> Fulfiller<Chain, Store>
where
    Chain: SettlementChain,
    Store: ListingStore,
{
    /// Buy the token listed in `record`.
    ///
    /// The store is only updated after the transaction is mined. If that
    /// update fails, the error carries the transaction hash.
    #[instrument(skip_all, fields(tokenid = %record.tokenid, buyer = %self.buyer))]
    pub async fn fulfill(
        &self,
        record: &ListingRecord,
    ) -> Result<SettlementReceipt, FulfillmentError> {
        let result = self.fulfill_inner(record).await;
        if let Err(error) = &result {
            warn!(stage = %FulfillmentStage::Failed, %error, "fulfillment failed");
        }
        result
    }

    /// Fetch the listing for `tokenid` from the store and buy it.
    #[instrument(skip_all, fields(%tokenid))]
    pub async fn fulfill_token(
        &self,
        tokenid: &str,
    ) -> Result<SettlementReceipt, FulfillmentError> {
        let records = bounded(
            self.options.network_timeout(),
            FulfillmentStage::Validating,
            self.store.fetch_listings(),
        )
        .await?
        .map_err(|error| FulfillmentError::Store(Box::new(error)))?;

        let record = records
            .into_iter()
            .find(|record| record.tokenid == tokenid)
            .ok_or_else(|| FulfillmentError::NotListed(tokenid.to_owned()))?;
        self.fulfill(&record).await
    }

    async fn fulfill_inner(
        &self,
        record: &ListingRecord,
    ) -> Result<SettlementReceipt, FulfillmentError> {
        let now = unix_now();

        debug!(stage = %FulfillmentStage::Validating);
        let order = self.validate(record, now)?;

        debug!(stage = %FulfillmentStage::EstimatingCost);
        let tx = self.transaction(&order, now);
        let gas_limit = self.gas_limit(&tx).await;
        debug!(value = ?TransactionBuilder::value(&tx), gas_limit, "settlement priced");

        let receipt = self.settle(tx.with_gas_limit(gas_limit)).await?;

        let sale = Sale { tokenid: record.tokenid.clone(), buyer_address: self.buyer };
        let recorded =
            tokio::time::timeout(self.options.network_timeout(), self.store.record_sale(sale))
                .await;
        let source: BoxError = match recorded {
            Ok(Ok(())) => {
                debug!(stage = %FulfillmentStage::Confirmed, tx_hash = %receipt.tx_hash);
                return Ok(receipt);
            }
            Ok(Err(error)) => Box::new(error),
            Err(elapsed) => Box::new(elapsed),
        };

        error!(tx_hash = %receipt.tx_hash, %source, "sale confirmed on chain but not recorded");
        Err(FulfillmentError::PersistenceFailed { tx_hash: receipt.tx_hash, source })
    }
}

/// Run `fut`, failing with [`FulfillmentError::Timeout`] after `limit`.
async fn bounded<F: Future>(
    limit: Duration,
    stage: FulfillmentStage,
    fut: F,
) -> Result<F::Output, FulfillmentError> {
    tokio::time::timeout(limit, fut).await.map_err(|_| FulfillmentError::Timeout(stage))
}
