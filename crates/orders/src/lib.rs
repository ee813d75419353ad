//! Steptract Orders Library
//!
//! Workflows for listing tokens for sale and buying listed tokens through
//! Seaport, reconciled against the off-chain listing store.
//!
//! - [`Lister`] checks and grants the Seaport approval, builds one order per
//!   token, signs the batch with a single signature, and persists the signed
//!   orders atomically.
//! - [`Fulfiller`] validates a stored order, prices and estimates the
//!   `fulfillOrder` transaction, submits it, and records the sale once it
//!   confirms.
//! - [`MarketSession`] binds an account, a chain, and a store, and hands out
//!   both workflows.
//! - [`MarketSnapshot`] keeps the last fetched listing records and reports
//!   what changed on refresh.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod fulfiller;
pub use fulfiller::{apply_gas_margin, FulfillmentError, FulfillmentStage, Fulfiller, RevertReason};

mod impls;
pub use impls::{AlloyChain, AlloyChainError, WalletTypedDataSigner};

mod lister;
pub use lister::{ListingError, ListingStage, Lister};

mod options;
pub use options::{FulfillmentOptions, ListingOptions};

mod session;
pub use session::{MarketSession, SessionError};

mod snapshot;
pub use snapshot::{MarketSnapshot, SnapshotDiff, SnapshotError};

mod traits;
pub use traits::{ListingStore, SettlementChain, SettlementReceipt};

/// Current unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}
