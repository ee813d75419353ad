//! Constants for ApeChain mainnet.

use crate::{ChainParams, MarketConstants, NO_CONDUIT_KEY, SEAPORT_V1_5_ADDRESS};
use alloy::primitives::{address, Address};
use std::borrow::Cow;

/// Chain ID for ApeChain mainnet.
pub const CHAIN_ID: u64 = 33139;
/// Human readable chain name.
pub const CHAIN_NAME: &str = "ApeChain Mainnet";
/// Symbol of the native currency.
pub const NATIVE_SYMBOL: &str = "APE";
/// Decimals of the native currency.
pub const NATIVE_DECIMALS: u8 = 18;
/// Public RPC endpoint.
pub const RPC_URL: &str = "https://rpc.apechain.com";
/// Block explorer.
pub const EXPLORER_URL: &str = "https://apescan.io";

/// The Steptract collection contract.
pub const COLLECTION: Address = address!("0x54a88333F6e7540eA982261301309048aC431eD5");

/// Chain parameters for ApeChain mainnet.
pub const APECHAIN_PARAMS: ChainParams = ChainParams::new(
    CHAIN_ID,
    Cow::Borrowed(CHAIN_NAME),
    Cow::Borrowed(NATIVE_SYMBOL),
    NATIVE_DECIMALS,
    Cow::Borrowed(RPC_URL),
    Cow::Borrowed(EXPLORER_URL),
);

/// Marketplace constants for ApeChain mainnet.
pub const APECHAIN_MARKET: MarketConstants =
    MarketConstants::new(APECHAIN_PARAMS, SEAPORT_V1_5_ADDRESS, COLLECTION, NO_CONDUIT_KEY);
