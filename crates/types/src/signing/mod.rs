mod backend;
pub use backend::{LocalTypedDataSigner, TypedDataSigner};

mod bulk;
pub use bulk::{BulkOrderTree, MAX_BULK_HEIGHT};

mod error;
pub use error::SigningError;

mod payload;
pub use payload::{TypedDataPayload, TypedField};

mod signer;
pub use signer::SeaportSigner;

use crate::{OrderParameters, SeaportOrder};
use alloy::{
    primitives::{Address, Signature, B256, U256},
    sol_types::{Eip712Domain, SolStruct},
};
use steptract_constants::{SEAPORT_NAME, SEAPORT_VERSION};

/// The EIP-712 domain of a Seaport 1.5 deployment.
pub fn seaport_domain(chain_id: u64, seaport: Address) -> Eip712Domain {
    Eip712Domain {
        name: Some(SEAPORT_NAME.into()),
        version: Some(SEAPORT_VERSION.into()),
        chain_id: Some(U256::from(chain_id)),
        verifying_contract: Some(seaport),
        salt: None,
    }
}

/// The Seaport order hash of `parameters` under `counter`.
///
/// The `counter` carried by `parameters` is ignored. This is the value
/// `getOrderHash` returns and the value stored alongside listings.
pub fn order_hash(parameters: &OrderParameters, counter: U256) -> B256 {
    let mut components = parameters.to_components();
    components.counter = counter;
    components.eip712_hash_struct()
}

/// Recover the account that signed `order`, for either a single order
/// signature or a bulk order signature with its proof.
pub fn recover_signer(
    order: &SeaportOrder,
    domain: &Eip712Domain,
) -> Result<Address, SigningError> {
    let raw = order.signature.as_ref();
    let leaf = order.hash();

    let (signature, digest) = if raw.len() == 65 {
        (raw, payload::signing_hash(domain, leaf))
    } else {
        let (signature, index, proof) =
            bulk::split_bulk_signature(raw).ok_or(SigningError::MalformedSignature(raw.len()))?;
        let root = bulk::root_from_proof(leaf, index, &proof);
        (signature, payload::signing_hash(domain, bulk::bulk_struct_hash(proof.len(), root)))
    };

    Ok(Signature::from_raw(signature)?.recover_address_from_prehash(&digest)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_fields() {
        let seaport = Address::repeat_byte(0x5e);
        let domain = seaport_domain(33139, seaport);
        assert_eq!(domain.name.as_deref(), Some("Seaport"));
        assert_eq!(domain.version.as_deref(), Some("1.5"));
        assert_eq!(domain.chain_id, Some(U256::from(33139)));
        assert_eq!(domain.verifying_contract, Some(seaport));
    }

    #[test]
    fn empty_order_hash_is_stable() {
        // the padding leaf Seaport uses for bulk order trees
        assert_eq!(order_hash(&OrderParameters::default(), U256::ZERO), bulk::empty_order_hash());
    }

    #[test]
    fn explicit_counter_wins() {
        let params = OrderParameters::default().with_counter(U256::from(5));
        assert_eq!(order_hash(&params, U256::from(5)), params.order_hash());
        assert_ne!(order_hash(&params, U256::ZERO), params.order_hash());
    }
}
