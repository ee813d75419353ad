//! Order model, codec, and signing for the steptract marketplace.
//!
//! [`SeaportOrder`] is the canonical in-memory form of a Seaport 1.5 order.
//! Stored orders of any vintage are brought into that form by
//! [`normalize`], and [`SeaportSigner`] produces signed orders from
//! [`OrderParameters`], either one at a time or as a single bulk signature
//! over a batch.

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
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod codec;
pub use codec::{normalize, CodecError};

mod decimal;

mod listing;
pub use listing::{compare_token_ids, ListingAction, ListingRecord, NewListing, Sale};

mod order;
pub use order::{
    locate_amount, ConsiderationItem, OfferItem, OrderParameters, OrderWindow, SeaportOrder,
};

mod signing;
pub use signing::{
    order_hash, recover_signer, seaport_domain, BulkOrderTree, LocalTypedDataSigner,
    SeaportSigner, SigningError, TypedDataPayload, TypedDataSigner, TypedField, MAX_BULK_HEIGHT,
};
