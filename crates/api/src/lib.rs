//! Client and wire types for the steptract listing backend.
//!
//! The backend is a thin persistence layer over listing records. Signed
//! orders are produced and settled client side; the backend only stores
//! what the client reports.

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

/// The [`MarketApi`] client.
pub mod client;
pub use client::MarketApi;

mod error;
pub use error::ApiError;

/// Request and response bodies of the listing backend.
pub mod types;
