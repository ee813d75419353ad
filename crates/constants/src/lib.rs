//! Steptract marketplace constants.
//!
//! This crate contains the chain parameters and contract addresses the
//! marketplace runs against: the Seaport settlement contract, the NFT
//! collection, and the conduit key used to route transfers.

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

mod chains;
pub use chains::apechain;
pub use chains::test_utils;

mod types;
pub use types::{env, ChainParams, ConfigError, KnownChains, MarketConstants, ParseChainError};

use alloy::primitives::{address, Address, B256};

/// Canonical Seaport 1.5 deployment address. Identical on every chain that
/// uses the deterministic deployer.
pub const SEAPORT_V1_5_ADDRESS: Address = address!("0x0000000000000068F116a894984e2DB1123eB395");

/// EIP-712 domain name of the Seaport contract.
pub const SEAPORT_NAME: &str = "Seaport";

/// EIP-712 domain version of the Seaport 1.5 contract.
pub const SEAPORT_VERSION: &str = "1.5";

/// Conduit key selecting no conduit. Transfers are pulled by Seaport itself,
/// so approvals are granted to the Seaport address.
pub const NO_CONDUIT_KEY: B256 = B256::ZERO;
