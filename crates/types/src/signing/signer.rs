use super::{seaport_domain, BulkOrderTree, SigningError, TypedDataPayload, TypedDataSigner};
use crate::{ConsiderationItem, OfferItem, OrderParameters, SeaportOrder};
use alloy::{
    primitives::{Address, Bytes, Signature},
    sol_types::{Eip712Domain, SolStruct},
};
use serde_json::{json, Value};
use steptract_constants::MarketConstants;
use steptract_seaport::OrderComponents;

/// Signs Seaport orders for one account in one Seaport domain.
///
/// A single order is signed directly over its `OrderComponents`. Two or
/// more orders are signed together as a bulk order, and each resulting
/// order carries the shared signature plus its own merkle proof.
#[derive(Debug, Clone)]
pub struct SeaportSigner<S> {
    signer: S,
    domain: Eip712Domain,
}

impl<S> SeaportSigner<S> {
    /// Create a signer for the Seaport deployment at `seaport`.
    pub fn new(signer: S, chain_id: u64, seaport: Address) -> Self {
        Self { signer, domain: seaport_domain(chain_id, seaport) }
    }

    /// Create a signer for the Seaport deployment of a market.
    pub fn for_market(signer: S, constants: &MarketConstants) -> Self {
        Self::new(signer, constants.chain_id(), constants.seaport())
    }

    /// The signing domain.
    pub const fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    /// The signing backend.
    pub const fn backend(&self) -> &S {
        &self.signer
    }

    /// Unwrap the signing backend.
    pub fn into_backend(self) -> S {
        self.signer
    }

    /// The typed-data payload for a single order.
    pub fn order_payload(&self, parameters: &OrderParameters) -> TypedDataPayload {
        TypedDataPayload::new(
            self.domain.clone(),
            &OrderComponents::eip712_encode_type(),
            order_message(parameters),
            parameters.order_hash(),
        )
    }

    /// The typed-data payload for a bulk order over `parameters`, and the
    /// tree it commits to.
    pub fn bulk_payload(
        &self,
        parameters: &[OrderParameters],
    ) -> Result<(TypedDataPayload, BulkOrderTree), SigningError> {
        let tree = BulkOrderTree::new(parameters.iter().map(OrderParameters::order_hash))?;

        let mut leaves: Vec<Value> = parameters.iter().map(order_message).collect();
        leaves.resize(tree.leaves().len(), order_message(&OrderParameters::default()));

        let payload = TypedDataPayload::new(
            self.domain.clone(),
            &BulkOrderTree::encode_type(tree.height()),
            json!({ "tree": nest_pairs(leaves) }),
            tree.struct_hash(),
        );
        Ok((payload, tree))
    }
}

impl<S: TypedDataSigner> SeaportSigner<S> {
    /// The signing account.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign one order.
    pub async fn sign_order(
        &self,
        parameters: OrderParameters,
    ) -> Result<SeaportOrder, SigningError> {
        self.check_offerer(&parameters)?;
        let signature = self.sign_payload(self.order_payload(&parameters)).await?;
        Ok(SeaportOrder::new(parameters, Bytes::copy_from_slice(&signature.as_bytes())))
    }

    /// Sign a batch with a single signature request. Either every order is
    /// signed or none is.
    pub async fn sign_orders(
        &self,
        parameters: Vec<OrderParameters>,
    ) -> Result<Vec<SeaportOrder>, SigningError> {
        if parameters.is_empty() {
            return Err(SigningError::NoOrders);
        }

        let parameters = match <[OrderParameters; 1]>::try_from(parameters) {
            Ok([single]) => return Ok(vec![self.sign_order(single).await?]),
            Err(parameters) => parameters,
        };

        parameters.iter().try_for_each(|p| self.check_offerer(p))?;
        let (payload, tree) = self.bulk_payload(&parameters)?;
        let signature = self.sign_payload(payload).await?;

        Ok(parameters
            .into_iter()
            .enumerate()
            .map(|(index, p)| SeaportOrder::new(p, tree.encode_signature(&signature, index)))
            .collect())
    }

    async fn sign_payload(&self, mut payload: TypedDataPayload) -> Result<Signature, SigningError> {
        payload.reconcile(self.signer.injects_domain_type());
        self.signer.sign_typed_data(&payload).await
    }

    fn check_offerer(&self, parameters: &OrderParameters) -> Result<(), SigningError> {
        let signer = self.address();
        if parameters.offerer != signer {
            return Err(SigningError::OffererMismatch { offerer: parameters.offerer, signer });
        }
        Ok(())
    }
}

/// The `OrderComponents` message, with integers as decimal strings.
fn order_message(parameters: &OrderParameters) -> Value {
    let offer: Vec<Value> = parameters.offer.iter().map(offer_message).collect();
    let consideration: Vec<Value> =
        parameters.consideration.iter().map(consideration_message).collect();

    json!({
        "offerer": parameters.offerer,
        "zone": parameters.zone,
        "offer": offer,
        "consideration": consideration,
        "orderType": u8::from(parameters.order_type),
        "startTime": parameters.start_time.to_string(),
        "endTime": parameters.end_time.to_string(),
        "zoneHash": parameters.zone_hash,
        "salt": parameters.salt.to_string(),
        "conduitKey": parameters.conduit_key,
        "counter": parameters.counter.to_string(),
    })
}

fn offer_message(item: &OfferItem) -> Value {
    json!({
        "itemType": u8::from(item.item_type),
        "token": item.token,
        "identifierOrCriteria": item.identifier_or_criteria.to_string(),
        "startAmount": item.start_amount.to_string(),
        "endAmount": item.end_amount.to_string(),
    })
}

fn consideration_message(item: &ConsiderationItem) -> Value {
    json!({
        "itemType": u8::from(item.item_type),
        "token": item.token,
        "identifierOrCriteria": item.identifier_or_criteria.to_string(),
        "startAmount": item.start_amount.to_string(),
        "endAmount": item.end_amount.to_string(),
        "recipient": item.recipient,
    })
}

/// Fold a power-of-two list into nested pairs: `[a, b, c, d]` becomes
/// `[[a, b], [c, d]]`.
fn nest_pairs(mut level: Vec<Value>) -> Value {
    while level.len() > 1 {
        level = level.chunks(2).map(|pair| Value::Array(pair.to_vec())).collect();
    }
    level.pop().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{recover_signer, LocalTypedDataSigner};
    use alloy::{
        primitives::{B256, U256},
        signers::{local::PrivateKeySigner, Signer},
    };
    use std::sync::atomic::{AtomicBool, Ordering};

    const CHAIN_ID: u64 = 33139;
    const SEAPORT: Address = Address::repeat_byte(0x5e);
    const COLLECTION: Address = Address::repeat_byte(0xc0);

    fn key() -> PrivateKeySigner {
        PrivateKeySigner::from_bytes(&B256::repeat_byte(7)).unwrap()
    }

    fn listing(offerer: Address, token_id: u64) -> OrderParameters {
        OrderParameters::native_listing(
            offerer,
            COLLECTION,
            U256::from(token_id),
            U256::from(10u64.pow(18)),
        )
        .with_window(1_000, 1_000 + 2_592_000)
        .with_salt(U256::from(token_id * 31))
    }

    /// A backend that wants the domain type declared, like a browser wallet.
    #[derive(Debug)]
    struct WalletLike {
        key: PrivateKeySigner,
        saw_domain_type: AtomicBool,
    }

    impl TypedDataSigner for WalletLike {
        fn address(&self) -> Address {
            self.key.address()
        }

        fn injects_domain_type(&self) -> bool {
            false
        }

        async fn sign_typed_data(
            &self,
            payload: &TypedDataPayload,
        ) -> Result<Signature, SigningError> {
            self.saw_domain_type.store(payload.has_domain_type(), Ordering::SeqCst);
            Ok(self.key.sign_hash(&payload.signing_hash()).await?)
        }
    }

    #[tokio::test]
    async fn single_order_recovers_to_offerer() {
        let signer = SeaportSigner::new(LocalTypedDataSigner::new(key()), CHAIN_ID, SEAPORT);
        let order = signer.sign_order(listing(signer.address(), 1)).await.unwrap();

        assert_eq!(order.signature.len(), 65);
        assert_eq!(recover_signer(&order, signer.domain()).unwrap(), signer.address());
    }

    #[tokio::test]
    async fn batch_of_one_is_a_plain_signature() {
        let signer = SeaportSigner::new(LocalTypedDataSigner::new(key()), CHAIN_ID, SEAPORT);
        let orders = signer.sign_orders(vec![listing(signer.address(), 1)]).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].signature.len(), 65);
    }

    #[tokio::test]
    async fn bulk_orders_recover_to_offerer() {
        let signer = SeaportSigner::new(LocalTypedDataSigner::new(key()), CHAIN_ID, SEAPORT);
        let batch = (1..=3).map(|id| listing(signer.address(), id)).collect();
        let orders = signer.sign_orders(batch).await.unwrap();

        assert_eq!(orders.len(), 3);
        for order in &orders {
            // 65 byte signature, 3 byte key, two proof nodes
            assert_eq!(order.signature.len(), 65 + 3 + 64);
            assert_eq!(recover_signer(order, signer.domain()).unwrap(), signer.address());
        }
        // one signature shared by the batch
        assert_eq!(orders[0].signature[..65], orders[2].signature[..65]);
    }

    #[tokio::test]
    async fn wallet_backend_receives_domain_type() {
        let backend = WalletLike { key: key(), saw_domain_type: AtomicBool::new(false) };
        let signer = SeaportSigner::new(&backend, CHAIN_ID, SEAPORT);
        let order = signer.sign_order(listing(backend.address(), 1)).await.unwrap();

        assert!(backend.saw_domain_type.load(Ordering::SeqCst));
        assert_eq!(recover_signer(&order, signer.domain()).unwrap(), backend.address());
    }

    #[tokio::test]
    async fn local_backend_rejects_declared_domain_type() {
        let signer = SeaportSigner::new(LocalTypedDataSigner::new(key()), CHAIN_ID, SEAPORT);
        let mut payload = signer.order_payload(&listing(signer.address(), 1));
        payload.reconcile(false);

        let err = signer.backend().sign_typed_data(&payload).await.unwrap_err();
        assert!(matches!(err, SigningError::DuplicateDomainType));
    }

    #[tokio::test]
    async fn rejects_foreign_offerer_and_empty_batch() {
        let signer = SeaportSigner::new(LocalTypedDataSigner::new(key()), CHAIN_ID, SEAPORT);
        let foreign = listing(Address::repeat_byte(1), 1);

        let err = signer.sign_order(foreign.clone()).await.unwrap_err();
        assert!(matches!(err, SigningError::OffererMismatch { .. }));

        let batch = vec![listing(signer.address(), 2), foreign];
        assert!(signer.sign_orders(batch).await.is_err());

        assert!(matches!(signer.sign_orders(vec![]).await, Err(SigningError::NoOrders)));
    }

    #[test]
    fn bulk_message_is_nested_pairs() {
        let signer = SeaportSigner::new((), CHAIN_ID, SEAPORT);
        let batch: Vec<_> = (1..=3).map(|id| listing(Address::repeat_byte(9), id)).collect();
        let (payload, tree) = signer.bulk_payload(&batch).unwrap();

        assert_eq!(tree.height(), 2);
        assert_eq!(payload.primary_type(), "BulkOrder");
        let root = &payload.message()["tree"];
        assert_eq!(root.as_array().unwrap().len(), 2);
        assert_eq!(root[0][1]["offer"][0]["identifierOrCriteria"], "2");
        // padding leaf
        assert_eq!(root[1][1]["offerer"], json!(Address::ZERO));
        assert_eq!(payload.types()["BulkOrder"][0].ty, "OrderComponents[2][2]");
    }
}
