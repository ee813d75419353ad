/// ApeChain mainnet constants.
pub mod apechain;

/// Test utilities for chains.
pub mod test_utils;
