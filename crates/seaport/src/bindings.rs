#![allow(clippy::too_many_arguments)]
#![allow(missing_docs)]

mod seaport {
    alloy::sol!(
        #[derive(Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        struct OfferItem {
            uint8 itemType;
            address token;
            uint256 identifierOrCriteria;
            uint256 startAmount;
            uint256 endAmount;
        }

        #[derive(Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        struct ConsiderationItem {
            uint8 itemType;
            address token;
            uint256 identifierOrCriteria;
            uint256 startAmount;
            uint256 endAmount;
            address recipient;
        }

        /// The signed form of an order. Its EIP-712 struct hash is the order
        /// hash.
        #[derive(Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        struct OrderComponents {
            address offerer;
            address zone;
            OfferItem[] offer;
            ConsiderationItem[] consideration;
            uint8 orderType;
            uint256 startTime;
            uint256 endTime;
            bytes32 zoneHash;
            uint256 salt;
            bytes32 conduitKey;
            uint256 counter;
        }

        /// The submitted form of an order. Replaces the counter with the
        /// original consideration length.
        #[derive(Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        struct OrderParameters {
            address offerer;
            address zone;
            OfferItem[] offer;
            ConsiderationItem[] consideration;
            uint8 orderType;
            uint256 startTime;
            uint256 endTime;
            bytes32 zoneHash;
            uint256 salt;
            bytes32 conduitKey;
            uint256 totalOriginalConsiderationItems;
        }

        #[derive(Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        struct Order {
            OrderParameters parameters;
            bytes signature;
        }

        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface Seaport {
            function fulfillOrder(Order calldata order, bytes32 fulfillerConduitKey)
                external
                payable
                returns (bool fulfilled);

            function getCounter(address offerer) external view returns (uint256 counter);

            function getOrderHash(OrderComponents calldata order)
                external
                view
                returns (bytes32 orderHash);

            function getOrderStatus(bytes32 orderHash)
                external
                view
                returns (
                    bool isValidated,
                    bool isCancelled,
                    uint256 totalFilled,
                    uint256 totalSize
                );

            error BadSignatureV(uint8 v);
            error InvalidSigner();
            error InvalidSignature();
            error InvalidTime(uint256 startTime, uint256 endTime);
            error OrderIsCancelled(bytes32 orderHash);
            error OrderAlreadyFilled(bytes32 orderHash);
            error OrderPartiallyFilled(bytes32 orderHash);
            error InsufficientNativeTokensSupplied();
            error InvalidMsgValue(uint256 value);
            error InvalidRestrictedOrder(bytes32 orderHash);
            error InvalidContractOrder(bytes32 orderHash);
            error InvalidConduit(bytes32 conduitKey, address conduit);
        }
    );
}
pub use seaport::{ConsiderationItem, OfferItem, Order, OrderComponents, OrderParameters, Seaport};

mod erc721 {
    alloy::sol!(
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface IERC721 {
            function ownerOf(uint256 tokenId) external view returns (address owner);

            function isApprovedForAll(address owner, address operator)
                external
                view
                returns (bool approved);

            function setApprovalForAll(address operator, bool approved) external;
        }
    );
}
pub use erc721::IERC721;

impl OrderComponents {
    /// Split into the submitted [`OrderParameters`] and the counter.
    pub fn into_parameters(self) -> (OrderParameters, alloy::primitives::U256) {
        let total = alloy::primitives::U256::from(self.consideration.len());
        let parameters = OrderParameters {
            offerer: self.offerer,
            zone: self.zone,
            offer: self.offer,
            consideration: self.consideration,
            orderType: self.orderType,
            startTime: self.startTime,
            endTime: self.endTime,
            zoneHash: self.zoneHash,
            salt: self.salt,
            conduitKey: self.conduitKey,
            totalOriginalConsiderationItems: total,
        };
        (parameters, self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolStruct;

    #[test]
    fn order_components_type_string() {
        // Must match Seaport's ORDER_TYPEHASH pre-image exactly.
        assert_eq!(
            OrderComponents::eip712_encode_type(),
            "OrderComponents(address offerer,address zone,OfferItem[] offer,\
             ConsiderationItem[] consideration,uint8 orderType,uint256 startTime,\
             uint256 endTime,bytes32 zoneHash,uint256 salt,bytes32 conduitKey,\
             uint256 counter)\
             ConsiderationItem(uint8 itemType,address token,uint256 identifierOrCriteria,\
             uint256 startAmount,uint256 endAmount,address recipient)\
             OfferItem(uint8 itemType,address token,uint256 identifierOrCriteria,\
             uint256 startAmount,uint256 endAmount)"
        );
    }

    #[test]
    fn into_parameters_counts_consideration() {
        let components = OrderComponents {
            consideration: vec![ConsiderationItem::default(), ConsiderationItem::default()],
            counter: alloy::primitives::U256::from(7),
            ..Default::default()
        };
        let (parameters, counter) = components.into_parameters();
        assert_eq!(parameters.totalOriginalConsiderationItems, alloy::primitives::U256::from(2));
        assert_eq!(counter, alloy::primitives::U256::from(7));
    }
}
