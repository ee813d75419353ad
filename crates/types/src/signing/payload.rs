use alloy::{
    primitives::{keccak256, B256},
    sol_types::Eip712Domain,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Name of the EIP-712 domain type.
pub(crate) const DOMAIN_TYPE: &str = "EIP712Domain";

/// A member of an EIP-712 struct type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedField {
    /// Member name.
    pub name: String,
    /// Solidity type of the member.
    #[serde(rename = "type")]
    pub ty: String,
}

impl TypedField {
    fn new(name: &str, ty: &str) -> Self {
        Self { name: name.to_owned(), ty: ty.to_owned() }
    }
}

/// Everything a signing backend needs to sign one EIP-712 message.
///
/// The payload carries both the JSON form sent to wallets
/// (`eth_signTypedData_v4`) and the struct hash computed locally from the
/// ABI types, so local and remote signers sign the same digest.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedDataPayload {
    domain: Eip712Domain,
    types: BTreeMap<String, Vec<TypedField>>,
    primary_type: String,
    message: Value,
    struct_hash: B256,
}

impl TypedDataPayload {
    /// Assemble a payload from an EIP-712 type string such as
    /// `Foo(Bar bar)Bar(uint256 x)`. The first type is the primary type.
    pub fn new(domain: Eip712Domain, encode_type: &str, message: Value, struct_hash: B256) -> Self {
        let types = parse_encode_type(encode_type);
        let primary_type =
            encode_type.split_once('(').map(|(name, _)| name.to_owned()).unwrap_or_default();
        Self { domain, types, primary_type, message, struct_hash }
    }

    /// The signing domain.
    pub const fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    /// The declared struct types, keyed by name.
    pub const fn types(&self) -> &BTreeMap<String, Vec<TypedField>> {
        &self.types
    }

    /// The type of the signed message.
    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    /// The message, with integers as decimal strings.
    pub const fn message(&self) -> &Value {
        &self.message
    }

    /// The EIP-712 struct hash of the message.
    pub const fn struct_hash(&self) -> B256 {
        self.struct_hash
    }

    /// The digest a signature commits to.
    pub fn signing_hash(&self) -> B256 {
        signing_hash(&self.domain, self.struct_hash)
    }

    /// True if the type set declares `EIP712Domain`.
    pub fn has_domain_type(&self) -> bool {
        self.types.contains_key(DOMAIN_TYPE)
    }

    /// Prepare the type set for a backend. A backend that injects the
    /// domain type rejects a payload that also declares it. A backend that
    /// does not inject it needs it declared.
    pub fn reconcile(&mut self, backend_injects_domain: bool) {
        if backend_injects_domain {
            self.types.remove(DOMAIN_TYPE);
        } else if !self.has_domain_type() {
            self.types.insert(DOMAIN_TYPE.to_owned(), domain_fields(&self.domain));
        }
    }

    /// The `eth_signTypedData_v4` document.
    pub fn to_json(&self) -> Value {
        json!({
            "types": self.types,
            "primaryType": self.primary_type,
            "domain": domain_json(&self.domain),
            "message": self.message,
        })
    }
}

/// `keccak256(0x1901 ‖ domainSeparator ‖ structHash)`.
pub(crate) fn signing_hash(domain: &Eip712Domain, struct_hash: B256) -> B256 {
    let mut buf = [0u8; 66];
    buf[0] = 0x19;
    buf[1] = 0x01;
    buf[2..34].copy_from_slice(domain.hash_struct().as_slice());
    buf[34..].copy_from_slice(struct_hash.as_slice());
    keccak256(buf)
}

/// The `EIP712Domain` members implied by the populated domain fields, in
/// canonical order.
fn domain_fields(domain: &Eip712Domain) -> Vec<TypedField> {
    let mut fields = Vec::with_capacity(5);
    if domain.name.is_some() {
        fields.push(TypedField::new("name", "string"));
    }
    if domain.version.is_some() {
        fields.push(TypedField::new("version", "string"));
    }
    if domain.chain_id.is_some() {
        fields.push(TypedField::new("chainId", "uint256"));
    }
    if domain.verifying_contract.is_some() {
        fields.push(TypedField::new("verifyingContract", "address"));
    }
    if domain.salt.is_some() {
        fields.push(TypedField::new("salt", "bytes32"));
    }
    fields
}

fn domain_json(domain: &Eip712Domain) -> Value {
    let mut map = Map::new();
    if let Some(name) = &domain.name {
        map.insert("name".into(), json!(name));
    }
    if let Some(version) = &domain.version {
        map.insert("version".into(), json!(version));
    }
    if let Some(chain_id) = domain.chain_id {
        // wallets compare this against the active chain as a number
        let value = u64::try_from(chain_id).map_or_else(|_| json!(chain_id), |id| json!(id));
        map.insert("chainId".into(), value);
    }
    if let Some(contract) = domain.verifying_contract {
        map.insert("verifyingContract".into(), json!(contract));
    }
    if let Some(salt) = domain.salt {
        map.insert("salt".into(), json!(salt));
    }
    Value::Object(map)
}

/// Split `A(uint256 x,B b)B(address y)` into its struct definitions.
fn parse_encode_type(encode_type: &str) -> BTreeMap<String, Vec<TypedField>> {
    let mut types = BTreeMap::new();
    let mut rest = encode_type;
    while let Some((name, tail)) = rest.split_once('(') {
        let Some((members, tail)) = tail.split_once(')') else { break };
        let fields = members
            .split(',')
            .filter(|member| !member.is_empty())
            .filter_map(|member| member.rsplit_once(' '))
            .map(|(ty, name)| TypedField::new(name, ty))
            .collect();
        types.insert(name.to_owned(), fields);
        rest = tail;
    }
    types
}
