mod provider;
pub use provider::{AlloyChain, AlloyChainError};

mod api;

mod wallet;
pub use wallet::WalletTypedDataSigner;
