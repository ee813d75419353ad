//! Constants for local test chains.

use crate::{ChainParams, MarketConstants, NO_CONDUIT_KEY};
use alloy::primitives::Address;
use std::borrow::Cow;

/// Test chain id.
pub const TEST_CHAIN_ID: u64 = 31337;
/// Test address for the Seaport contract.
pub const TEST_SEAPORT: Address = Address::repeat_byte(0x5e);
/// Test address for the NFT collection.
pub const TEST_COLLECTION: Address = Address::repeat_byte(0xc0);

/// Chain parameters for the local test chain.
pub const TEST_PARAMS: ChainParams = ChainParams::new(
    TEST_CHAIN_ID,
    Cow::Borrowed("Test Chain"),
    Cow::Borrowed("ETH"),
    18,
    Cow::Borrowed("http://localhost:8545"),
    Cow::Borrowed("http://localhost:4000"),
);

/// Marketplace constants for tests.
pub const TEST_MARKET: MarketConstants =
    MarketConstants::new(TEST_PARAMS, TEST_SEAPORT, TEST_COLLECTION, NO_CONDUIT_KEY);
