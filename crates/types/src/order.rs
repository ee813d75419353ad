use crate::decimal;
use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, B256, U256},
    rpc::types::TransactionRequest,
    sol_types::{SolCall, SolStruct},
};
use serde::{Deserialize, Serialize};
use steptract_seaport::{self as bindings, ItemType, OrderType, Seaport::fulfillOrderCall};

/// An asset the offerer gives up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferItem {
    /// Asset kind.
    pub item_type: ItemType,
    /// Token contract, zero for the native currency.
    pub token: Address,
    /// Token id, or a merkle root for criteria items.
    #[serde(with = "decimal")]
    pub identifier_or_criteria: U256,
    /// Amount at the start time.
    #[serde(with = "decimal")]
    pub start_amount: U256,
    /// Amount at the end time. Equal to `start_amount` for fixed prices.
    #[serde(with = "decimal")]
    pub end_amount: U256,
}

impl OfferItem {
    /// A single ERC-721 token.
    pub const fn erc721(collection: Address, token_id: U256) -> Self {
        Self {
            item_type: ItemType::Erc721,
            token: collection,
            identifier_or_criteria: token_id,
            start_amount: U256::from_limbs([1, 0, 0, 0]),
            end_amount: U256::from_limbs([1, 0, 0, 0]),
        }
    }

    /// Convert to the ABI struct.
    pub fn to_sol(&self) -> bindings::OfferItem {
        bindings::OfferItem {
            itemType: self.item_type.into(),
            token: self.token,
            identifierOrCriteria: self.identifier_or_criteria,
            startAmount: self.start_amount,
            endAmount: self.end_amount,
        }
    }
}

/// An asset the offerer requires in return, and who receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsiderationItem {
    /// Asset kind.
    pub item_type: ItemType,
    /// Token contract, zero for the native currency.
    pub token: Address,
    /// Token id, or a merkle root for criteria items.
    #[serde(with = "decimal")]
    pub identifier_or_criteria: U256,
    /// Amount at the start time.
    #[serde(with = "decimal")]
    pub start_amount: U256,
    /// Amount at the end time. Equal to `start_amount` for fixed prices.
    #[serde(with = "decimal")]
    pub end_amount: U256,
    /// Receiver of the asset.
    pub recipient: Address,
}

impl ConsiderationItem {
    /// A fixed native-currency payment.
    pub const fn native(amount: U256, recipient: Address) -> Self {
        Self {
            item_type: ItemType::Native,
            token: Address::ZERO,
            identifier_or_criteria: U256::ZERO,
            start_amount: amount,
            end_amount: amount,
            recipient,
        }
    }

    /// Convert to the ABI struct.
    pub fn to_sol(&self) -> bindings::ConsiderationItem {
        bindings::ConsiderationItem {
            itemType: self.item_type.into(),
            token: self.token,
            identifierOrCriteria: self.identifier_or_criteria,
            startAmount: self.start_amount,
            endAmount: self.end_amount,
            recipient: self.recipient,
        }
    }
}

/// Where a timestamp falls relative to an order's validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderWindow {
    /// Before `startTime`. The settlement contract will reject it for now.
    NotStarted,
    /// Fillable.
    Active,
    /// At or after `endTime`.
    Expired,
}

/// The body of a Seaport order, in the shape Seaport tooling stores it.
///
/// This carries both the `counter` (needed for the order hash) and
/// `totalOriginalConsiderationItems` (needed for submission), so a single
/// value can be hashed, signed and submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParameters {
    /// The account whose assets are offered.
    pub offerer: Address,
    /// Optional access-control contract, zero when unused.
    pub zone: Address,
    /// Offered assets.
    pub offer: Vec<OfferItem>,
    /// Required assets.
    pub consideration: Vec<ConsiderationItem>,
    /// Fill and access policy.
    pub order_type: OrderType,
    /// First valid second, unix time.
    #[serde(with = "decimal")]
    pub start_time: U256,
    /// First invalid second, unix time.
    #[serde(with = "decimal")]
    pub end_time: U256,
    /// Opaque value passed to the zone.
    pub zone_hash: B256,
    /// Entropy distinguishing otherwise identical orders.
    #[serde(with = "decimal")]
    pub salt: U256,
    /// Conduit used to pull the offerer's assets.
    pub conduit_key: B256,
    /// The offerer's Seaport counter at signing time.
    #[serde(with = "decimal")]
    pub counter: U256,
    /// Number of consideration items the offerer signed.
    pub total_original_consideration_items: u64,
}

impl Default for OrderParameters {
    fn default() -> Self {
        Self {
            offerer: Address::ZERO,
            zone: Address::ZERO,
            offer: Vec::new(),
            consideration: Vec::new(),
            order_type: OrderType::FullOpen,
            start_time: U256::ZERO,
            end_time: U256::ZERO,
            zone_hash: B256::ZERO,
            salt: U256::ZERO,
            conduit_key: B256::ZERO,
            counter: U256::ZERO,
            total_original_consideration_items: 0,
        }
    }
}

impl OrderParameters {
    /// A full-open listing of one ERC-721 token for a fixed native price
    /// paid to the offerer.
    pub fn native_listing(
        offerer: Address,
        collection: Address,
        token_id: U256,
        price: U256,
    ) -> Self {
        Self {
            offerer,
            offer: vec![OfferItem::erc721(collection, token_id)],
            consideration: vec![ConsiderationItem::native(price, offerer)],
            total_original_consideration_items: 1,
            ..Default::default()
        }
    }

    /// Set the validity window.
    pub fn with_window(self, start_time: u64, end_time: u64) -> Self {
        Self { start_time: U256::from(start_time), end_time: U256::from(end_time), ..self }
    }

    /// Set the salt.
    pub fn with_salt(self, salt: U256) -> Self {
        Self { salt, ..self }
    }

    /// Set the conduit key.
    pub fn with_conduit_key(self, conduit_key: B256) -> Self {
        Self { conduit_key, ..self }
    }

    /// Set the counter.
    pub fn with_counter(self, counter: U256) -> Self {
        Self { counter, ..self }
    }

    /// The signed form, as hashed by `getOrderHash`.
    pub fn to_components(&self) -> bindings::OrderComponents {
        bindings::OrderComponents {
            offerer: self.offerer,
            zone: self.zone,
            offer: self.offer.iter().map(OfferItem::to_sol).collect(),
            consideration: self.consideration.iter().map(ConsiderationItem::to_sol).collect(),
            orderType: self.order_type.into(),
            startTime: self.start_time,
            endTime: self.end_time,
            zoneHash: self.zone_hash,
            salt: self.salt,
            conduitKey: self.conduit_key,
            counter: self.counter,
        }
    }

    /// The submitted form, as passed to `fulfillOrder`.
    pub fn to_sol(&self) -> bindings::OrderParameters {
        let (mut parameters, _) = self.to_components().into_parameters();
        parameters.totalOriginalConsiderationItems =
            U256::from(self.total_original_consideration_items);
        parameters
    }

    /// The EIP-712 struct hash of the order components. Identical to the
    /// value Seaport's `getOrderHash` returns.
    pub fn order_hash(&self) -> B256 {
        self.to_components().eip712_hash_struct()
    }

    /// True if this is a single ERC-721 token offered for a single native
    /// payment.
    pub fn is_native_listing(&self) -> bool {
        matches!(
            (self.offer.as_slice(), self.consideration.as_slice()),
            ([offer], [payment])
                if offer.item_type == ItemType::Erc721
                    && offer.start_amount == U256::from(1)
                    && payment.item_type.is_native()
        )
    }

    /// The collection and token id of the first NFT offered.
    pub fn offered_token(&self) -> Option<(Address, U256)> {
        self.offer
            .iter()
            .find(|item| item.item_type.is_nft())
            .map(|item| (item.token, item.identifier_or_criteria))
    }

    /// Sum of the start amounts of all native consideration items.
    pub fn native_total(&self) -> U256 {
        self.consideration
            .iter()
            .filter(|item| item.item_type.is_native())
            .fold(U256::ZERO, |acc, item| acc.saturating_add(item.start_amount))
    }

    /// Sum of the native consideration amounts Seaport will require at
    /// `now`, interpolated across the window and rounded up.
    pub fn native_total_at(&self, now: u64) -> U256 {
        self.consideration
            .iter()
            .filter(|item| item.item_type.is_native())
            .map(|item| {
                locate_amount(
                    item.start_amount,
                    item.end_amount,
                    self.start_time,
                    self.end_time,
                    now,
                    true,
                )
            })
            .fold(U256::ZERO, U256::saturating_add)
    }

    /// Classify `now` against the validity window.
    pub fn window_at(&self, now: u64) -> OrderWindow {
        let now = U256::from(now);
        if now < self.start_time {
            OrderWindow::NotStarted
        } else if now >= self.end_time {
            OrderWindow::Expired
        } else {
            OrderWindow::Active
        }
    }
}

/// Linear interpolation of an item amount across the validity window, the
/// way Seaport computes it at fill time. Consideration amounts round up,
/// offer amounts round down.
pub fn locate_amount(
    start_amount: U256,
    end_amount: U256,
    start_time: U256,
    end_time: U256,
    now: u64,
    round_up: bool,
) -> U256 {
    if start_amount == end_amount || end_time <= start_time {
        return end_amount;
    }

    let now = U256::from(now).clamp(start_time, end_time);
    let duration = end_time - start_time;
    let elapsed = now - start_time;
    let remaining = duration - elapsed;

    let total =
        start_amount.saturating_mul(remaining).saturating_add(end_amount.saturating_mul(elapsed));
    let ceiling = if round_up { duration - U256::from(1) } else { U256::ZERO };
    total.saturating_add(ceiling) / duration
}

/// An order together with the offerer's signature.
///
/// Serializes to `{"parameters": {..}, "signature": "0x.."}`, the shape
/// persisted in listing records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeaportOrder {
    /// The order body.
    pub parameters: OrderParameters,
    /// A 65-byte ECDSA signature, or a bulk signature with its proof.
    pub signature: Bytes,
}

impl SeaportOrder {
    /// Pair parameters with a signature.
    pub const fn new(parameters: OrderParameters, signature: Bytes) -> Self {
        Self { parameters, signature }
    }

    /// The order hash.
    pub fn hash(&self) -> B256 {
        self.parameters.order_hash()
    }

    /// Convert to the ABI struct.
    pub fn to_sol(&self) -> bindings::Order {
        bindings::Order { parameters: self.parameters.to_sol(), signature: self.signature.clone() }
    }

    /// Generate a `fulfillOrder` transaction paying the order's native
    /// consideration.
    pub fn to_fulfill_tx(
        &self,
        seaport: Address,
        fulfiller_conduit_key: B256,
    ) -> TransactionRequest {
        let data =
            fulfillOrderCall { order: self.to_sol(), fulfillerConduitKey: fulfiller_conduit_key }
                .abi_encode();

        TransactionRequest::default()
            .with_input(data)
            .with_to(seaport)
            .with_value(self.parameters.native_total())
    }

    /// Decompose into parameters and signature.
    pub fn into_parts(self) -> (OrderParameters, Bytes) {
        (self.parameters, self.signature)
    }
}
