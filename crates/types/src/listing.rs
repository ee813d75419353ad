use crate::{normalize, CodecError, SeaportOrder};
use alloy::primitives::{Address, B256, U256};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// The persisted state of one token in the collection.
///
/// A record is either listed (`price > 0`, seller set, signed order
/// attached) or unlisted (`price == 0`, buyer set to the last known
/// owner). Display metadata rides along untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Token id as a decimal string. Primary key.
    #[serde(alias = "tokenId", deserialize_with = "token_id_string")]
    pub tokenid: String,
    /// Asking price in whole native units. Zero when unlisted.
    #[serde(default, deserialize_with = "zero_if_null")]
    pub price: Decimal,
    /// The account that signed the current listing.
    #[serde(default)]
    pub seller_address: Option<Address>,
    /// The last known owner when unlisted.
    #[serde(default)]
    pub buyer_address: Option<Address>,
    /// The signed order, as stored. Normalize with [`ListingRecord::order`].
    #[serde(default)]
    pub seaport_order: Option<Value>,
    /// Hash of the signed order, computed at listing time.
    #[serde(default)]
    pub order_hash: Option<B256>,
    /// Set once the token has changed hands through the settlement
    /// contract.
    #[serde(default, deserialize_with = "false_if_null")]
    pub on_chain: bool,
    /// The collection contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nft_contract: Option<Address>,
    /// The settlement contract the order was signed for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace_contract: Option<Address>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display image URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Last write time.
    #[serde(default, deserialize_with = "store_timestamp")]
    pub updatedat: Option<DateTime<Utc>>,
}

impl ListingRecord {
    /// An unlisted record with no owner information.
    pub fn new(tokenid: impl Into<String>) -> Self {
        Self {
            tokenid: tokenid.into(),
            price: Decimal::ZERO,
            seller_address: None,
            buyer_address: None,
            seaport_order: None,
            order_hash: None,
            on_chain: false,
            nft_contract: None,
            marketplace_contract: None,
            name: None,
            image: None,
            updatedat: None,
        }
    }

    /// True if the record carries an active listing.
    pub fn is_listed(&self) -> bool {
        self.price > Decimal::ZERO
    }

    /// The current owner as far as the store knows.
    pub const fn owner(&self) -> Option<Address> {
        match (self.seller_address, self.buyer_address) {
            (Some(seller), _) => Some(seller),
            (None, buyer) => buyer,
        }
    }

    /// Normalize the stored order, if any.
    pub fn order(&self) -> Option<Result<SeaportOrder, CodecError>> {
        self.seaport_order.as_ref().map(normalize)
    }

    /// What `viewer` can do with this token.
    pub fn action_for(&self, viewer: Option<Address>) -> ListingAction {
        match (self.is_listed(), viewer) {
            (true, Some(viewer)) if self.seller_address == Some(viewer) => {
                ListingAction::OwnListing
            }
            (true, _) => ListingAction::Buy,
            (false, Some(viewer)) if self.buyer_address == Some(viewer) => {
                ListingAction::ListForSale
            }
            (false, _) => ListingAction::NotOwned,
        }
    }

    /// Replace the listing state with a new signed listing. Display
    /// metadata is kept.
    pub fn apply_listing(&mut self, listing: &NewListing, now: DateTime<Utc>) {
        self.price = listing.price;
        self.seller_address = Some(listing.seller_address);
        self.buyer_address = None;
        self.seaport_order = Some(listing.seaport_order.clone());
        self.order_hash = Some(listing.order_hash);
        self.on_chain = false;
        self.updatedat = Some(now);
    }

    /// Record a completed sale: the listing is cleared and `buyer` becomes
    /// the owner.
    pub fn apply_sale(&mut self, buyer: Address, now: DateTime<Utc>) {
        self.price = Decimal::ZERO;
        self.seller_address = None;
        self.buyer_address = Some(buyer);
        self.seaport_order = None;
        self.order_hash = None;
        self.on_chain = true;
        self.updatedat = Some(now);
    }
}

/// What a viewer can do with a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingAction {
    /// Listed by someone else.
    Buy,
    /// Listed by the viewer.
    OwnListing,
    /// Owned by the viewer and not listed.
    ListForSale,
    /// Neither listed nor owned by the viewer.
    NotOwned,
}

/// A signed listing, as submitted to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListing {
    /// Token id as a decimal string.
    pub tokenid: String,
    /// Asking price in whole native units.
    pub price: Decimal,
    /// The signer of the order.
    pub seller_address: Address,
    /// The signed order in its canonical JSON shape.
    pub seaport_order: Value,
    /// Hash of the signed order.
    pub order_hash: B256,
}

impl NewListing {
    /// Build the store submission for a signed order.
    pub fn from_order(
        order: &SeaportOrder,
        tokenid: impl Into<String>,
        price: Decimal,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            tokenid: tokenid.into(),
            price,
            seller_address: order.parameters.offerer,
            seaport_order: serde_json::to_value(order)?,
            order_hash: order.hash(),
        })
    }
}

/// A completed on-chain sale, as submitted to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Token id as a decimal string.
    pub tokenid: String,
    /// The new owner.
    pub buyer_address: Address,
}

/// Order token ids numerically when both parse as integers, and
/// lexicographically otherwise.
pub fn compare_token_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<U256>(), b.parse::<U256>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn token_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("invalid token id: {other}"))),
    }
}

/// Rows seeded with metadata only carry a null price.
fn zero_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    Ok(Option::<Decimal>::deserialize(deserializer)?.unwrap_or(Decimal::ZERO))
}

fn false_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

/// RFC 3339, or a `timestamp` column without an offset, read as UTC.
fn store_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&raw, format).ok())
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALICE: Address = Address::repeat_byte(0xaa);
    const BOB: Address = Address::repeat_byte(0xbb);

    fn listed() -> ListingRecord {
        let mut record = ListingRecord::new("7");
        let listing = NewListing {
            tokenid: "7".into(),
            price: Decimal::new(15, 1),
            seller_address: ALICE,
            seaport_order: json!({ "parameters": {}, "signature": "0x" }),
            order_hash: B256::repeat_byte(1),
        };
        record.apply_listing(&listing, Utc::now());
        record
    }

    #[test]
    fn actions_by_viewer() {
        let record = listed();
        assert_eq!(record.action_for(Some(ALICE)), ListingAction::OwnListing);
        assert_eq!(record.action_for(Some(BOB)), ListingAction::Buy);
        assert_eq!(record.action_for(None), ListingAction::Buy);

        let mut sold = record;
        sold.apply_sale(BOB, Utc::now());
        assert_eq!(sold.action_for(Some(BOB)), ListingAction::ListForSale);
        assert_eq!(sold.action_for(Some(ALICE)), ListingAction::NotOwned);
    }

    #[test]
    fn sale_clears_listing_state() {
        let mut record = listed();
        record.name = Some("Ape #7".into());
        record.apply_sale(BOB, Utc::now());

        assert!(!record.is_listed());
        assert_eq!(record.seller_address, None);
        assert_eq!(record.owner(), Some(BOB));
        assert_eq!(record.seaport_order, None);
        assert_eq!(record.order_hash, None);
        assert!(record.on_chain);
        assert_eq!(record.name.as_deref(), Some("Ape #7"));
    }

    #[test]
    fn deserializes_store_rows() {
        let row = json!({
            "tokenid": 12,
            "price": "2.5",
            "seller_address": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "buyer_address": null,
            "seaport_order": null,
            "order_hash": null,
            "on_chain": false,
            "updatedat": "2024-05-01T12:00:00+00:00",
        });
        let record: ListingRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.tokenid, "12");
        assert_eq!(record.price, Decimal::new(25, 1));
        assert_eq!(record.owner(), Some(ALICE));
        assert!(record.updatedat.is_some());

        let sparse: ListingRecord = serde_json::from_value(json!({ "tokenId": "3" })).unwrap();
        assert_eq!(sparse, ListingRecord::new("3"));
    }

    #[test]
    fn null_columns_read_as_unlisted() {
        let row = json!({
            "tokenid": "4",
            "price": null,
            "on_chain": null,
            "name": "Ape #4",
            "updatedat": "2024-05-01T12:00:00.123456",
        });
        let record: ListingRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.price, Decimal::ZERO);
        assert!(!record.on_chain);
        assert!(!record.is_listed());
        assert_eq!(record.action_for(Some(ALICE)), ListingAction::NotOwned);
        assert_eq!(
            record.updatedat.unwrap().to_rfc3339(),
            "2024-05-01T12:00:00.123456+00:00"
        );

        let spaced: ListingRecord = serde_json::from_value(json!({
            "tokenid": "5",
            "updatedat": "2024-05-01 12:00:00",
        }))
        .unwrap();
        assert!(spaced.updatedat.is_some());

        let bad = serde_json::from_value::<ListingRecord>(json!({
            "tokenid": "6",
            "updatedat": "yesterday",
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn price_serializes_as_string() {
        let json = serde_json::to_value(listed()).unwrap();
        assert_eq!(json["price"], "1.5");
        assert!(json.get("name").is_none());
    }

    #[test]
    fn token_id_ordering() {
        let mut ids = vec!["10", "9", "abc", "100", "2"];
        ids.sort_by(|a, b| compare_token_ids(a, b));
        assert_eq!(ids, ["2", "9", "10", "100", "abc"]);
    }
}
