use alloy::{
    primitives::Address,
    signers::{k256::ecdsa::SigningKey, local::PrivateKeySigner},
};
use std::sync::LazyLock;
use steptract_types::LocalTypedDataSigner;

/// Test signers used in tests.
pub static TEST_SIGNERS: LazyLock<[PrivateKeySigner; 4]> = LazyLock::new(|| {
    [
        PrivateKeySigner::from(SigningKey::from_slice(&[1u8; 32]).unwrap()),
        PrivateKeySigner::from(SigningKey::from_slice(&[2u8; 32]).unwrap()),
        PrivateKeySigner::from(SigningKey::from_slice(&[3u8; 32]).unwrap()),
        PrivateKeySigner::from(SigningKey::from_slice(&[4u8; 32]).unwrap()),
    ]
});

/// Test users used in tests. Addresses corresponding to [`TEST_SIGNERS`].
pub static TEST_USERS: LazyLock<[Address; 4]> =
    LazyLock::new(|| TEST_SIGNERS.each_ref().map(|s| s.address()));

/// A typed-data signer for the test signer at `index`.
pub fn test_typed_signer(index: usize) -> LocalTypedDataSigner<PrivateKeySigner> {
    LocalTypedDataSigner::new(TEST_SIGNERS[index].clone())
}
