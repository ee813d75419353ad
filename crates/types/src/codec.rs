//! Normalization of stored order JSON.
//!
//! Orders reach the store through several generations of client code, so
//! numbers arrive as decimal strings, hex strings, plain JSON integers, or
//! big-number wrapper objects, and optional fields are frequently absent.
//! [`normalize`] is the single boundary where all of that is resolved into
//! a [`SeaportOrder`].

use crate::{ConsiderationItem, OfferItem, OrderParameters, SeaportOrder};
use alloy::primitives::{Address, Bytes, B256, U256};
use serde_json::{Map, Value};
use std::borrow::Cow;
use steptract_seaport::{ItemType, OrderType};

/// Errors produced while normalizing stored order JSON.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A string-encoded order was not valid JSON.
    #[error("order is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Neither the document nor its `order` envelope has a `parameters`
    /// object.
    #[error("order has no parameters")]
    MissingParameters,
    /// A field is absent or could not be decoded.
    #[error("malformed order field `{field}`: {reason}")]
    MalformedOrder {
        /// Path of the offending field.
        field: String,
        /// What was wrong with it.
        reason: Cow<'static, str>,
    },
}

impl CodecError {
    fn malformed(field: impl Into<String>, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedOrder { field: field.into(), reason: reason.into() }
    }
}

/// Normalize a stored order into its canonical form.
///
/// Accepts `{"order": {"parameters", "signature"}}`, a bare
/// `{"parameters", "signature"}`, or a JSON string containing either.
/// Numeric fields are read leniently: decimal and `0x` strings, JSON
/// integers, and `{"hex": ..}` / `{"_hex": ..}` wrappers, with null or
/// absent values read as zero. Optional addresses and 32-byte fields
/// default to zero, `identifierOrCriteria` falls back to `identifier`,
/// `endAmount` falls back to `startAmount`, and
/// `totalOriginalConsiderationItems` defaults to the consideration count.
pub fn normalize(raw: &Value) -> Result<SeaportOrder, CodecError> {
    let raw: Cow<'_, Value> = match raw {
        Value::String(encoded) => Cow::Owned(serde_json::from_str(encoded)?),
        other => Cow::Borrowed(other),
    };

    let envelope = match raw.get("order") {
        Some(order) if !is_absent(order) => order,
        _ => raw.as_ref(),
    };

    let parameters = envelope
        .get("parameters")
        .and_then(Value::as_object)
        .ok_or(CodecError::MissingParameters)?;

    let signature = match envelope.get("signature") {
        None | Some(Value::Null) => Bytes::new(),
        Some(Value::String(hex)) if hex.is_empty() => Bytes::new(),
        Some(Value::String(hex)) => {
            hex.parse().map_err(|_| CodecError::malformed("signature", "invalid hex"))?
        }
        Some(_) => return Err(CodecError::malformed("signature", "expected a hex string")),
    };

    Ok(SeaportOrder::new(parameters_from(parameters)?, signature))
}

fn parameters_from(params: &Map<String, Value>) -> Result<OrderParameters, CodecError> {
    let offer = array(params, "offer")?
        .iter()
        .enumerate()
        .map(|(i, item)| offer_item(item, &format!("offer[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    let consideration = array(params, "consideration")?
        .iter()
        .enumerate()
        .map(|(i, item)| consideration_item(item, &format!("consideration[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    let total_original_consideration_items = match params.get("totalOriginalConsiderationItems") {
        Some(value) if !is_absent(value) => {
            let total = uint(Some(value), "totalOriginalConsiderationItems")?;
            u64::try_from(total).map_err(|_| {
                CodecError::malformed("totalOriginalConsiderationItems", "out of range")
            })?
        }
        _ => consideration.len() as u64,
    };
    if (consideration.len() as u64) < total_original_consideration_items {
        return Err(CodecError::malformed(
            "totalOriginalConsiderationItems",
            "exceeds the consideration length",
        ));
    }

    let order_type = small(params.get("orderType"), "orderType")?;
    let order_type = OrderType::try_from(order_type)
        .map_err(|err| CodecError::malformed("orderType", err.to_string()))?;

    Ok(OrderParameters {
        offerer: address(params.get("offerer"), "offerer", true)?,
        zone: address(params.get("zone"), "zone", false)?,
        offer,
        consideration,
        order_type,
        start_time: uint(params.get("startTime"), "startTime")?,
        end_time: uint(params.get("endTime"), "endTime")?,
        zone_hash: word(params.get("zoneHash"), "zoneHash")?,
        salt: uint(params.get("salt"), "salt")?,
        conduit_key: word(params.get("conduitKey"), "conduitKey")?,
        counter: uint(params.get("counter"), "counter")?,
        total_original_consideration_items,
    })
}

/// Shared fields of offer and consideration items.
struct ItemFields {
    item_type: ItemType,
    token: Address,
    identifier_or_criteria: U256,
    start_amount: U256,
    end_amount: U256,
}

fn item_fields(item: &Value, path: &str) -> Result<ItemFields, CodecError> {
    let item = item.as_object().ok_or_else(|| CodecError::malformed(path, "expected an object"))?;
    let field = |name: &str| format!("{path}.{name}");

    let item_type = small(item.get("itemType"), &field("itemType"))?;
    let item_type = ItemType::try_from(item_type)
        .map_err(|err| CodecError::malformed(field("itemType"), err.to_string()))?;

    let identifier = match item.get("identifierOrCriteria") {
        Some(value) if !is_absent(value) => value,
        _ => item.get("identifier").unwrap_or(&Value::Null),
    };
    let start_amount = uint(item.get("startAmount"), &field("startAmount"))?;
    let end_amount = match item.get("endAmount") {
        Some(value) if !is_absent(value) => uint(Some(value), &field("endAmount"))?,
        _ => start_amount,
    };

    Ok(ItemFields {
        item_type,
        token: address(item.get("token"), &field("token"), false)?,
        identifier_or_criteria: uint(Some(identifier), &field("identifierOrCriteria"))?,
        start_amount,
        end_amount,
    })
}

fn offer_item(item: &Value, path: &str) -> Result<OfferItem, CodecError> {
    let ItemFields { item_type, token, identifier_or_criteria, start_amount, end_amount } =
        item_fields(item, path)?;
    Ok(OfferItem { item_type, token, identifier_or_criteria, start_amount, end_amount })
}

fn consideration_item(item: &Value, path: &str) -> Result<ConsiderationItem, CodecError> {
    let ItemFields { item_type, token, identifier_or_criteria, start_amount, end_amount } =
        item_fields(item, path)?;
    let recipient = address(item.get("recipient"), &format!("{path}.recipient"), false)?;
    Ok(ConsiderationItem {
        item_type,
        token,
        identifier_or_criteria,
        start_amount,
        end_amount,
        recipient,
    })
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn array<'a>(params: &'a Map<String, Value>, name: &str) -> Result<&'a Vec<Value>, CodecError> {
    match params.get(name) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(CodecError::malformed(name, "expected an array")),
        None => Err(CodecError::malformed(name, "missing")),
    }
}

/// Read an integer in any of the accepted encodings.
fn uint(value: Option<&Value>, field: &str) -> Result<U256, CodecError> {
    let Some(value) = value else { return Ok(U256::ZERO) };
    match value {
        Value::Null => Ok(U256::ZERO),
        Value::Bool(_) | Value::Array(_) => Err(CodecError::malformed(field, "expected a number")),
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| CodecError::malformed(field, "expected a non-negative integer")),
        Value::String(s) => parse_uint(s, field),
        Value::Object(wrapper) => match wrapper.get("hex").or_else(|| wrapper.get("_hex")) {
            Some(Value::String(hex)) => parse_hex(hex, field),
            _ => Err(CodecError::malformed(field, "unrecognized numeric wrapper")),
        },
    }
}

fn parse_uint(raw: &str, field: &str) -> Result<U256, CodecError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(U256::ZERO);
    }
    if raw.starts_with("0x") || raw.starts_with("0X") {
        return parse_hex(raw, field);
    }
    U256::from_str_radix(raw, 10)
        .map_err(|_| CodecError::malformed(field, format!("`{raw}` is not a decimal integer")))
}

fn parse_hex(raw: &str, field: &str) -> Result<U256, CodecError> {
    let digits = raw.trim().trim_start_matches("0x").trim_start_matches("0X");
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|_| CodecError::malformed(field, format!("`{raw}` is not a hex integer")))
}

fn small(value: Option<&Value>, field: &str) -> Result<u8, CodecError> {
    let value = uint(value, field)?;
    u8::try_from(value).map_err(|_| CodecError::malformed(field, "out of range"))
}

fn address(value: Option<&Value>, field: &str, required: bool) -> Result<Address, CodecError> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => {
            s.parse().map_err(|_| CodecError::malformed(field, format!("`{s}` is not an address")))
        }
        Some(value) if !is_absent(value) => {
            Err(CodecError::malformed(field, "expected an address string"))
        }
        _ if required => Err(CodecError::malformed(field, "missing")),
        _ => Ok(Address::ZERO),
    }
}

fn word(value: Option<&Value>, field: &str) -> Result<B256, CodecError> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => {
            s.parse().map_err(|_| CodecError::malformed(field, "expected 32 bytes of hex"))
        }
        Some(value) if !is_absent(value) => {
            Err(CodecError::malformed(field, "expected a hex string"))
        }
        _ => Ok(B256::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use serde_json::json;

    fn legacy_order() -> Value {
        json!({
            "parameters": {
                "offerer": "0x1111111111111111111111111111111111111111",
                "offer": [{
                    "itemType": 2,
                    "token": "0x54a88333F6e7540eA982261301309048aC431eD5",
                    "identifier": "17",
                    "startAmount": 1,
                }],
                "consideration": [{
                    "itemType": "0",
                    "token": "0x0000000000000000000000000000000000000000",
                    "identifierOrCriteria": "0",
                    "startAmount": { "type": "BigNumber", "hex": "0x0de0b6b3a7640000" },
                    "endAmount": { "_hex": "0x0de0b6b3a7640000" },
                    "recipient": "0x1111111111111111111111111111111111111111",
                }],
                "orderType": 0,
                "startTime": "0x64",
                "endTime": 2000,
                "salt": "0x2a",
                "counter": null,
            },
            "signature": "0x1234",
        })
    }

    #[test]
    fn normalizes_legacy_encodings() {
        let order = normalize(&legacy_order()).unwrap();
        let params = &order.parameters;

        assert_eq!(params.offerer, address!("0x1111111111111111111111111111111111111111"));
        assert_eq!(params.zone, Address::ZERO);
        assert_eq!(params.zone_hash, B256::ZERO);
        assert_eq!(params.conduit_key, B256::ZERO);
        assert_eq!(params.start_time, U256::from(100));
        assert_eq!(params.end_time, U256::from(2000));
        assert_eq!(params.salt, U256::from(42));
        assert_eq!(params.counter, U256::ZERO);
        assert_eq!(params.total_original_consideration_items, 1);

        let offer = &params.offer[0];
        assert_eq!(offer.identifier_or_criteria, U256::from(17));
        assert_eq!(offer.end_amount, U256::from(1));

        let payment = &params.consideration[0];
        assert_eq!(payment.start_amount, U256::from(10u64.pow(18)));
        assert_eq!(payment.end_amount, U256::from(10u64.pow(18)));
        assert_eq!(order.signature, Bytes::from(vec![0x12, 0x34]));
    }

    #[test]
    fn accepts_envelope_and_string_encodings() {
        let bare = normalize(&legacy_order()).unwrap();
        let wrapped = normalize(&json!({ "order": legacy_order() })).unwrap();
        let encoded = normalize(&Value::String(legacy_order().to_string())).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare, encoded);
    }

    #[test]
    fn missing_recipient_defaults_to_zero() {
        let mut raw = legacy_order();
        raw["parameters"]["consideration"][0].as_object_mut().unwrap().remove("recipient");
        let order = normalize(&raw).unwrap();
        assert_eq!(order.parameters.consideration[0].recipient, Address::ZERO);
    }

    #[test]
    fn canonical_form_is_a_fixed_point() {
        let order = normalize(&legacy_order()).unwrap();
        let stored = serde_json::to_value(&order).unwrap();
        assert_eq!(normalize(&stored).unwrap(), order);
        assert_eq!(serde_json::from_value::<SeaportOrder>(stored).unwrap(), order);
    }

    #[test]
    fn missing_parameters() {
        assert!(matches!(
            normalize(&json!({ "signature": "0x" })),
            Err(CodecError::MissingParameters)
        ));
        assert!(matches!(
            normalize(&json!({ "order": { "signature": "0x" } })),
            Err(CodecError::MissingParameters)
        ));
        assert!(matches!(normalize(&Value::Null), Err(CodecError::MissingParameters)));
    }

    #[test]
    fn malformed_fields_are_reported() {
        let mut raw = legacy_order();
        raw["parameters"].as_object_mut().unwrap().remove("offer");
        assert!(matches!(
            normalize(&raw),
            Err(CodecError::MalformedOrder { field, .. }) if field == "offer"
        ));

        let mut raw = legacy_order();
        raw["parameters"]["consideration"][0]["startAmount"] = json!("ten");
        assert!(matches!(
            normalize(&raw),
            Err(CodecError::MalformedOrder { field, .. }) if field == "consideration[0].startAmount"
        ));

        let mut raw = legacy_order();
        raw["parameters"]["offer"][0]["itemType"] = json!(9);
        assert!(normalize(&raw).is_err());

        let mut raw = legacy_order();
        raw["parameters"]["totalOriginalConsiderationItems"] = json!(3);
        assert!(normalize(&raw).is_err());

        assert!(matches!(
            normalize(&Value::String("{not json".into())),
            Err(CodecError::Json(_))
        ));
    }
}
