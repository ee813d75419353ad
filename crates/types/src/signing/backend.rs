use super::{SigningError, TypedDataPayload};
use alloy::{
    primitives::{Address, Signature},
    signers::Signer,
};
use std::future::Future;

/// A backend capable of signing EIP-712 payloads for one account.
///
/// Backends differ in whether they derive the `EIP712Domain` type from the
/// domain themselves. [`TypedDataPayload::reconcile`] uses
/// [`TypedDataSigner::injects_domain_type`] to shape the payload before it
/// is handed over.
pub trait TypedDataSigner {
    /// The signing account.
    fn address(&self) -> Address;

    /// True if the backend adds `EIP712Domain` to the type set itself.
    fn injects_domain_type(&self) -> bool;

    /// Sign a reconciled payload.
    fn sign_typed_data(
        &self,
        payload: &TypedDataPayload,
    ) -> impl Future<Output = Result<Signature, SigningError>> + Send;
}

impl<T> TypedDataSigner for &T
where
    T: TypedDataSigner + Sync,
{
    fn address(&self) -> Address {
        (**self).address()
    }

    fn injects_domain_type(&self) -> bool {
        (**self).injects_domain_type()
    }

    fn sign_typed_data(
        &self,
        payload: &TypedDataPayload,
    ) -> impl Future<Output = Result<Signature, SigningError>> + Send {
        (**self).sign_typed_data(payload)
    }
}

/// Signs with a local key. The digest is computed from the ABI types, so
/// the domain type never needs to be declared.
#[derive(Debug, Clone)]
pub struct LocalTypedDataSigner<S> {
    signer: S,
}

impl<S> LocalTypedDataSigner<S> {
    /// Wrap an alloy signer.
    pub const fn new(signer: S) -> Self {
        Self { signer }
    }

    /// The wrapped signer.
    pub const fn inner(&self) -> &S {
        &self.signer
    }
}

impl<S> TypedDataSigner for LocalTypedDataSigner<S>
where
    S: Signer + Send + Sync,
{
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn injects_domain_type(&self) -> bool {
        true
    }

    async fn sign_typed_data(&self, payload: &TypedDataPayload) -> Result<Signature, SigningError> {
        if payload.has_domain_type() {
            return Err(SigningError::DuplicateDomainType);
        }
        Ok(self.signer.sign_hash(&payload.signing_hash()).await?)
    }
}
