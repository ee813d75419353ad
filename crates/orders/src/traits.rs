use alloy::{
    primitives::{Address, TxHash, U256},
    rpc::types::TransactionRequest,
};
use core::future::Future;
use steptract_types::{ListingRecord, NewListing, Sale};

/// The off-chain listing store.
///
/// Implementors hold one [`ListingRecord`] per token id. Writes are last
/// write wins; there is no version check between a read and a write.
pub trait ListingStore {
    /// The error type returned by store operations.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Fetch every listing record.
    fn fetch_listings(
        &self,
    ) -> impl Future<Output = Result<Vec<ListingRecord>, Self::Error>> + Send;

    /// Upsert a batch of listings. Either every listing is written or none
    /// is.
    fn upsert_listings(
        &self,
        listings: Vec<NewListing>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Mark a token as sold to a new owner.
    fn record_sale(&self, sale: Sale) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<T> ListingStore for &T
where
    T: ListingStore + Sync,
{
    type Error = T::Error;

    fn fetch_listings(
        &self,
    ) -> impl Future<Output = Result<Vec<ListingRecord>, Self::Error>> + Send {
        (**self).fetch_listings()
    }

    fn upsert_listings(
        &self,
        listings: Vec<NewListing>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).upsert_listings(listings)
    }

    fn record_sale(&self, sale: Sale) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).record_sale(sale)
    }
}

/// The outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementReceipt {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Block the transaction was included in, if reported.
    pub block_number: Option<u64>,
    /// Gas consumed.
    pub gas_used: u64,
    /// False if execution reverted.
    pub success: bool,
}

/// The chain Seaport orders settle on.
///
/// Transactions are sent from the account named in the request (or, for
/// approvals, from `owner`). Implementors sign with whatever wallet backs
/// that account.
pub trait SettlementChain {
    /// The error type returned by chain operations.
    type Error: core::error::Error + Send + Sync + 'static;

    /// The id of the connected chain.
    fn chain_id(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// `isApprovedForAll(owner, operator)` on an ERC-721 collection.
    fn is_approved_for_all(
        &self,
        collection: Address,
        owner: Address,
        operator: Address,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Send `setApprovalForAll(operator, true)` from `owner` and wait for it
    /// to be mined.
    fn set_approval_for_all(
        &self,
        collection: Address,
        owner: Address,
        operator: Address,
    ) -> impl Future<Output = Result<SettlementReceipt, Self::Error>> + Send;

    /// The Seaport counter of `offerer`.
    fn counter(
        &self,
        seaport: Address,
        offerer: Address,
    ) -> impl Future<Output = Result<U256, Self::Error>> + Send;

    /// Estimate the gas used by `tx`.
    fn estimate_gas(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// Send `tx`, returning its hash once the network has accepted it.
    fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = Result<TxHash, Self::Error>> + Send;

    /// Wait for a sent transaction to be mined.
    fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<SettlementReceipt, Self::Error>> + Send;
}

impl<T> SettlementChain for &T
where
    T: SettlementChain + Sync,
{
    type Error = T::Error;

    fn chain_id(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send {
        (**self).chain_id()
    }

    fn is_approved_for_all(
        &self,
        collection: Address,
        owner: Address,
        operator: Address,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        (**self).is_approved_for_all(collection, owner, operator)
    }

    fn set_approval_for_all(
        &self,
        collection: Address,
        owner: Address,
        operator: Address,
    ) -> impl Future<Output = Result<SettlementReceipt, Self::Error>> + Send {
        (**self).set_approval_for_all(collection, owner, operator)
    }

    fn counter(
        &self,
        seaport: Address,
        offerer: Address,
    ) -> impl Future<Output = Result<U256, Self::Error>> + Send {
        (**self).counter(seaport, offerer)
    }

    fn estimate_gas(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send {
        (**self).estimate_gas(tx)
    }

    fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = Result<TxHash, Self::Error>> + Send {
        (**self).send_transaction(tx)
    }

    fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<SettlementReceipt, Self::Error>> + Send {
        (**self).wait_for_receipt(tx_hash)
    }
}
