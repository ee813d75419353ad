use super::SigningError;
use alloy::{
    primitives::{keccak256, Bytes, Signature, B256},
    sol_types::SolStruct,
};
use steptract_seaport::{ConsiderationItem, OfferItem, OrderComponents};

/// Maximum height of a bulk order tree accepted by Seaport.
pub const MAX_BULK_HEIGHT: usize = 24;

/// Length of the tree key appended to a bulk signature.
const KEY_LEN: usize = 3;

/// A merkle tree of order hashes, signed once as a Seaport `BulkOrder`.
///
/// Leaves are padded to a power of two with the hash of an empty
/// `OrderComponents`. Parents hash their children in position order, so a
/// proof is verified by reading the leaf index bit by bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOrderTree {
    /// `layers[0]` are the padded leaves; the last layer is the root.
    layers: Vec<Vec<B256>>,
}

impl BulkOrderTree {
    /// Build a tree over `order_hashes`.
    pub fn new(order_hashes: impl IntoIterator<Item = B256>) -> Result<Self, SigningError> {
        let mut leaves: Vec<B256> = order_hashes.into_iter().collect();
        if leaves.is_empty() {
            return Err(SigningError::NoOrders);
        }

        let height = Self::height_for(leaves.len());
        if height > MAX_BULK_HEIGHT {
            return Err(SigningError::TooManyOrders(leaves.len()));
        }

        leaves.resize(1 << height, empty_order_hash());
        let mut layers = vec![leaves];
        while let Some(layer) = layers.last().filter(|layer| layer.len() > 1) {
            let parents = layer.chunks_exact(2).map(|pair| hash_pair(pair[0], pair[1])).collect();
            layers.push(parents);
        }

        Ok(Self { layers })
    }

    /// Height of a tree holding `count` orders. Never less than one.
    pub const fn height_for(count: usize) -> usize {
        let mut height = 1;
        while height < usize::BITS as usize && (1usize << height) < count {
            height += 1;
        }
        height
    }

    /// Number of levels above the leaves.
    pub fn height(&self) -> usize {
        self.layers.len() - 1
    }

    /// The padded leaves.
    pub fn leaves(&self) -> &[B256] {
        &self.layers[0]
    }

    /// The merkle root.
    pub fn root(&self) -> B256 {
        self.layers[self.height()][0]
    }

    /// Sibling hashes from the leaf at `index` up to the root.
    pub fn proof(&self, index: usize) -> Vec<B256> {
        self.layers[..self.height()]
            .iter()
            .enumerate()
            .map(|(level, layer)| layer[(index >> level) ^ 1])
            .collect()
    }

    /// The EIP-712 type string of a tree of `height`.
    pub fn encode_type(height: usize) -> String {
        format!(
            "BulkOrder(OrderComponents{} tree){}{}{}",
            "[2]".repeat(height),
            ConsiderationItem::eip712_root_type(),
            OfferItem::eip712_root_type(),
            OrderComponents::eip712_root_type(),
        )
    }

    /// The EIP-712 struct hash of this tree as a `BulkOrder`.
    pub fn struct_hash(&self) -> B256 {
        bulk_struct_hash(self.height(), self.root())
    }

    /// Signature for the order at `index`: the bulk signature followed by
    /// the three-byte big-endian index and the proof.
    pub fn encode_signature(&self, signature: &Signature, index: usize) -> Bytes {
        let proof = self.proof(index);
        let mut buf = Vec::with_capacity(65 + KEY_LEN + proof.len() * 32);
        buf.extend_from_slice(&signature.as_bytes());
        buf.extend_from_slice(&(index as u32).to_be_bytes()[4 - KEY_LEN..]);
        for node in proof {
            buf.extend_from_slice(node.as_slice());
        }
        buf.into()
    }
}

/// The hash Seaport pads bulk trees with.
pub(crate) fn empty_order_hash() -> B256 {
    OrderComponents::default().eip712_hash_struct()
}

pub(crate) fn bulk_struct_hash(height: usize, root: B256) -> B256 {
    let type_hash = keccak256(BulkOrderTree::encode_type(height));
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(type_hash.as_slice());
    buf[32..].copy_from_slice(root.as_slice());
    keccak256(buf)
}

/// Recompute a bulk order root from a leaf, its index, and its proof.
pub(crate) fn root_from_proof(leaf: B256, index: u32, proof: &[B256]) -> B256 {
    proof.iter().enumerate().fold(leaf, |node, (level, sibling)| {
        if (index >> level) & 1 == 1 {
            hash_pair(*sibling, node)
        } else {
            hash_pair(node, *sibling)
        }
    })
}

/// Split a bulk signature into the inner signature bytes, the leaf index,
/// and the proof. `None` if the length does not fit the layout.
pub(crate) fn split_bulk_signature(signature: &[u8]) -> Option<(&[u8], u32, Vec<B256>)> {
    let proof_len = signature.len().checked_sub(65 + KEY_LEN)?;
    if proof_len == 0 || proof_len % 32 != 0 || proof_len / 32 > MAX_BULK_HEIGHT {
        return None;
    }

    let (inner, rest) = signature.split_at(65);
    let (key, proof) = rest.split_at(KEY_LEN);
    let index = u32::from_be_bytes([0, key[0], key[1], key[2]]);
    let proof = proof.chunks_exact(32).map(B256::from_slice).collect();
    Some((inner, index, proof))
}

fn hash_pair(left: B256, right: B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    keccak256(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    fn hashes(n: u8) -> Vec<B256> {
        (1..=n).map(B256::repeat_byte).collect()
    }

    #[test]
    fn heights() {
        assert_eq!(BulkOrderTree::height_for(1), 1);
        assert_eq!(BulkOrderTree::height_for(2), 1);
        assert_eq!(BulkOrderTree::height_for(3), 2);
        assert_eq!(BulkOrderTree::height_for(4), 2);
        assert_eq!(BulkOrderTree::height_for(5), 3);
        assert_eq!(BulkOrderTree::height_for(1 << 24), 24);
        assert_eq!(BulkOrderTree::height_for((1 << 24) + 1), 25);
    }

    #[test]
    fn pads_with_empty_order_hash() {
        let tree = BulkOrderTree::new(hashes(3)).unwrap();
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.leaves().len(), 4);
        assert_eq!(tree.leaves()[3], empty_order_hash());
    }

    #[test]
    fn proofs_recompute_the_root() {
        let leaves = hashes(5);
        let tree = BulkOrderTree::new(leaves.clone()).unwrap();
        for (index, leaf) in leaves.iter().enumerate() {
            let proof = tree.proof(index);
            assert_eq!(proof.len(), 3);
            assert_eq!(root_from_proof(*leaf, index as u32, &proof), tree.root());
        }
    }

    #[test]
    fn two_leaf_root() {
        let tree = BulkOrderTree::new(hashes(2)).unwrap();
        let expected = hash_pair(B256::repeat_byte(1), B256::repeat_byte(2));
        assert_eq!(tree.root(), expected);
        assert_eq!(tree.proof(1), vec![B256::repeat_byte(1)]);
    }

    #[test]
    fn type_string() {
        let encoded = BulkOrderTree::encode_type(2);
        assert!(encoded.starts_with("BulkOrder(OrderComponents[2][2] tree)ConsiderationItem("));
        assert!(encoded.contains(")OfferItem("));
        assert!(encoded.ends_with("uint256 counter)"));
    }

    #[test]
    fn signature_layout() {
        let tree = BulkOrderTree::new(hashes(3)).unwrap();
        let signature = Signature::new(U256::from(1), U256::from(2), false);
        let encoded = tree.encode_signature(&signature, 2);
        assert_eq!(encoded.len(), 65 + 3 + 2 * 32);

        let (inner, index, proof) = split_bulk_signature(&encoded).unwrap();
        assert_eq!(inner, signature.as_bytes().as_slice());
        assert_eq!(index, 2);
        assert_eq!(proof, tree.proof(2));

        assert!(split_bulk_signature(&encoded[..65]).is_none());
        assert!(split_bulk_signature(&encoded[..90]).is_none());
    }

    #[test]
    fn empty_batch() {
        assert!(matches!(BulkOrderTree::new(Vec::new()), Err(SigningError::NoOrders)));
    }
}
