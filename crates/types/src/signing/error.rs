use super::MAX_BULK_HEIGHT;
use alloy::primitives::Address;

/// An error that can occur when signing or verifying an order.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// The account holder declined the signature request.
    #[error("signature request rejected by the user")]
    UserRejected,
    /// The wallet has no connected account.
    #[error("no account is connected")]
    NotConnected,
    /// Nothing to sign.
    #[error("no orders to sign")]
    NoOrders,
    /// The batch does not fit in a bulk order tree.
    #[error("{0} orders exceed the bulk order limit of {max}", max = 1usize << MAX_BULK_HEIGHT)]
    TooManyOrders(usize),
    /// The order names a different offerer than the signing account.
    #[error("order offerer {offerer} does not match signer {signer}")]
    OffererMismatch {
        /// Offerer named in the order.
        offerer: Address,
        /// Address of the signing account.
        signer: Address,
    },
    /// The payload declares `EIP712Domain` to a backend that derives it
    /// itself.
    #[error("typed data declares EIP712Domain but the signer injects it")]
    DuplicateDomainType,
    /// The signature has neither the single-order nor the bulk-order length.
    #[error("signature of {0} bytes is neither a single nor a bulk order signature")]
    MalformedSignature(usize),
    /// The signature bytes could not be decoded or recovered.
    #[error(transparent)]
    Signature(#[from] alloy::primitives::SignatureError),
    /// Error from a local signer.
    #[error(transparent)]
    Signer(#[from] alloy::signers::Error),
    /// Error from a wallet provider.
    #[error("wallet error: {0}")]
    Wallet(String),
}

impl SigningError {
    /// True if the account holder declined to sign.
    pub const fn is_user_rejection(&self) -> bool {
        matches!(self, Self::UserRejected)
    }
}
