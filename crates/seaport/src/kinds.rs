use core::fmt;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A discriminant outside the range Seaport defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} discriminant: {value}")]
pub struct UnknownVariant {
    /// The enum being decoded.
    pub kind: &'static str,
    /// The offending value.
    pub value: u8,
}

/// The kind of asset an offer or consideration item describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ItemType {
    /// The chain's native currency.
    Native = 0,
    /// A fungible ERC-20 token.
    Erc20 = 1,
    /// A unique ERC-721 token.
    Erc721 = 2,
    /// A semi-fungible ERC-1155 token.
    Erc1155 = 3,
    /// Any ERC-721 token matching a merkle root of identifiers.
    Erc721WithCriteria = 4,
    /// Any ERC-1155 token matching a merkle root of identifiers.
    Erc1155WithCriteria = 5,
}

impl ItemType {
    /// True for the native currency.
    pub const fn is_native(self) -> bool {
        matches!(self, Self::Native)
    }

    /// True for ERC-721 and ERC-1155 items, with or without criteria.
    pub const fn is_nft(self) -> bool {
        !matches!(self, Self::Native | Self::Erc20)
    }
}

impl From<ItemType> for u8 {
    fn from(value: ItemType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for ItemType {
    type Error = UnknownVariant;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Native,
            1 => Self::Erc20,
            2 => Self::Erc721,
            3 => Self::Erc1155,
            4 => Self::Erc721WithCriteria,
            5 => Self::Erc1155WithCriteria,
            value => return Err(UnknownVariant { kind: "item type", value }),
        })
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Native => "native",
            Self::Erc20 => "erc20",
            Self::Erc721 => "erc721",
            Self::Erc1155 => "erc1155",
            Self::Erc721WithCriteria => "erc721-criteria",
            Self::Erc1155WithCriteria => "erc1155-criteria",
        };
        f.write_str(name)
    }
}

/// Fill and access policy of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum OrderType {
    /// Anyone may fill, all at once.
    #[default]
    FullOpen = 0,
    /// Anyone may fill, in fractions.
    PartialOpen = 1,
    /// The zone must approve, all at once.
    FullRestricted = 2,
    /// The zone must approve, in fractions.
    PartialRestricted = 3,
    /// Generated by a contract offerer.
    Contract = 4,
}

impl OrderType {
    /// True if the zone is consulted before fulfillment.
    pub const fn is_restricted(self) -> bool {
        matches!(self, Self::FullRestricted | Self::PartialRestricted)
    }
}

impl From<OrderType> for u8 {
    fn from(value: OrderType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for OrderType {
    type Error = UnknownVariant;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::FullOpen,
            1 => Self::PartialOpen,
            2 => Self::FullRestricted,
            3 => Self::PartialRestricted,
            4 => Self::Contract,
            value => return Err(UnknownVariant { kind: "order type", value }),
        })
    }
}

macro_rules! serde_as_u8 {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u8(u8::from(*self))
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = u8::deserialize(deserializer)?;
                Self::try_from(raw).map_err(de::Error::custom)
            }
        }
    };
}

serde_as_u8!(ItemType);
serde_as_u8!(OrderType);
