use core::fmt;
use std::str::FromStr;

/// Error returned when a `MARKET_CHAIN` value names no preset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown market chain {0:?}, expected one of: apechain, test, or a preset chain id")]
pub struct ParseChainError(pub String);

/// Chains with a hard-coded marketplace preset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KnownChains {
    /// ApeChain mainnet.
    ApeChain,
    /// Local test chain.
    Test,
}

impl KnownChains {
    /// The preset's chain id.
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::ApeChain => crate::chains::apechain::CHAIN_ID,
            Self::Test => crate::chains::test_utils::TEST_CHAIN_ID,
        }
    }

    /// The preset for `chain_id`, if there is one.
    pub const fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            crate::chains::apechain::CHAIN_ID => Some(Self::ApeChain),
            crate::chains::test_utils::TEST_CHAIN_ID => Some(Self::Test),
            _ => None,
        }
    }
}

impl fmt::Display for KnownChains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ApeChain => "apechain",
            Self::Test => "test",
        })
    }
}

/// Accepts a preset name, case-insensitively, or a preset's decimal chain
/// id.
impl FromStr for KnownChains {
    type Err = ParseChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "apechain" | "ape" => Ok(Self::ApeChain),
            "test" | "local" => Ok(Self::Test),
            other => other
                .parse::<u64>()
                .ok()
                .and_then(Self::from_chain_id)
                .ok_or_else(|| ParseChainError(s.trim().to_owned())),
        }
    }
}
