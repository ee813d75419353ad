mod error;
pub use error::ConfigError;

mod chains;
pub use chains::{KnownChains, ParseChainError};

pub mod env;

use alloy::primitives::{Address, B256};
use std::borrow::Cow;

/// Parameters of the chain the marketplace is deployed on.
///
/// These double as the parameters of a `wallet_addEthereumChain` request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ChainParams {
    chain_id: u64,
    name: Cow<'static, str>,
    native_symbol: Cow<'static, str>,
    native_decimals: u8,
    rpc_url: Cow<'static, str>,
    explorer_url: Cow<'static, str>,
}

impl ChainParams {
    /// Create a new set of chain parameters.
    pub const fn new(
        chain_id: u64,
        name: Cow<'static, str>,
        native_symbol: Cow<'static, str>,
        native_decimals: u8,
        rpc_url: Cow<'static, str>,
        explorer_url: Cow<'static, str>,
    ) -> Self {
        Self { chain_id, name, native_symbol, native_decimals, rpc_url, explorer_url }
    }

    /// Get the chain id.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Get the chain name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the native currency symbol.
    pub fn native_symbol(&self) -> &str {
        &self.native_symbol
    }

    /// Get the native currency decimals.
    pub const fn native_decimals(&self) -> u8 {
        self.native_decimals
    }

    /// Get the RPC URL.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Get the block explorer URL.
    pub fn explorer_url(&self) -> &str {
        &self.explorer_url
    }

    /// The chain id as a `0x`-prefixed hex quantity.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Set the chain id.
    pub const fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Set the RPC URL.
    pub fn with_rpc_url(mut self, rpc_url: impl Into<Cow<'static, str>>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }
}

/// Marketplace constants.
///
/// Everything a session needs to know about where orders settle: the chain,
/// the Seaport contract that verifies and executes them, the collection being
/// traded, and the conduit key placed in every order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct MarketConstants {
    chain: ChainParams,
    seaport: Address,
    collection: Address,
    conduit_key: B256,
}

impl MarketConstants {
    /// Create a new set of constants.
    pub const fn new(
        chain: ChainParams,
        seaport: Address,
        collection: Address,
        conduit_key: B256,
    ) -> Self {
        Self { chain, seaport, collection, conduit_key }
    }

    /// Get the hard-coded ApeChain mainnet constants.
    pub const fn apechain() -> Self {
        crate::chains::apechain::APECHAIN_MARKET
    }

    /// Get the hard-coded local test constants.
    pub const fn test() -> Self {
        crate::chains::test_utils::TEST_MARKET
    }

    /// Get the constants for a known chain.
    pub const fn known(chain: KnownChains) -> Self {
        match chain {
            KnownChains::ApeChain => Self::apechain(),
            KnownChains::Test => Self::test(),
        }
    }

    /// Load constants from the environment.
    ///
    /// `MARKET_CHAIN` selects the preset (default `apechain`). `CHAIN_ID`,
    /// `RPC_URL`, `SEAPORT_CONTRACT_ADDRESS`, `NFT_CONTRACT_ADDRESS` and
    /// `CONDUIT_KEY` override individual fields of the preset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let preset = match env::load_string_opt("MARKET_CHAIN") {
            Some(name) => name.parse::<KnownChains>()?,
            None => KnownChains::ApeChain,
        };
        let mut constants = Self::known(preset);

        if let Some(chain_id) = env::load_u64_opt("CHAIN_ID")? {
            constants.chain = constants.chain.with_chain_id(chain_id);
        }
        if let Some(rpc_url) = env::load_string_opt("RPC_URL") {
            constants.chain = constants.chain.with_rpc_url(rpc_url);
        }
        if let Some(seaport) = env::load_address_opt("SEAPORT_CONTRACT_ADDRESS")? {
            constants.seaport = seaport;
        }
        if let Some(collection) = env::load_address_opt("NFT_CONTRACT_ADDRESS")? {
            constants.collection = collection;
        }
        if let Some(conduit_key) = env::load_b256_opt("CONDUIT_KEY")? {
            constants.conduit_key = conduit_key;
        }

        Ok(constants)
    }

    /// Get the chain parameters.
    pub const fn chain(&self) -> &ChainParams {
        &self.chain
    }

    /// Get the chain id.
    pub const fn chain_id(&self) -> u64 {
        self.chain.chain_id()
    }

    /// Get the Seaport contract address.
    pub const fn seaport(&self) -> Address {
        self.seaport
    }

    /// Get the NFT collection address.
    pub const fn collection(&self) -> Address {
        self.collection
    }

    /// Get the conduit key placed in orders.
    pub const fn conduit_key(&self) -> B256 {
        self.conduit_key
    }

    /// Set the Seaport contract address.
    pub const fn with_seaport(mut self, seaport: Address) -> Self {
        self.seaport = seaport;
        self
    }

    /// Set the NFT collection address.
    pub const fn with_collection(mut self, collection: Address) -> Self {
        self.collection = collection;
        self
    }

    /// Set the conduit key.
    pub const fn with_conduit_key(mut self, conduit_key: B256) -> Self {
        self.conduit_key = conduit_key;
        self
    }
}
