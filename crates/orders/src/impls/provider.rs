use crate::{SettlementChain, SettlementReceipt};
use alloy::{
    contract,
    network::{ReceiptResponse, TransactionBuilder},
    primitives::{Address, TxHash, U256},
    providers::{PendingTransactionBuilder, PendingTransactionError, Provider},
    rpc::types::TransactionRequest,
    sol_types::SolInterface,
    transports::TransportError,
};
use steptract_seaport::{
    Seaport::{self, SeaportErrors},
    IERC721,
};
use tracing::debug;

/// Errors returned by [`AlloyChain`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AlloyChainError {
    /// RPC call failed.
    #[error("RPC error: {0}")]
    Rpc(#[source] TransportError),
    /// Contract call failed.
    #[error("contract call failed: {0}")]
    Contract(#[source] contract::Error),
    /// Waiting for a transaction failed.
    #[error("failed to await transaction: {0}")]
    Pending(#[from] PendingTransactionError),
    /// Execution reverted, with the decoded reason where one was returned.
    #[error("execution reverted: {0}")]
    Revert(String),
}

impl From<TransportError> for AlloyChainError {
    fn from(error: TransportError) -> Self {
        match revert_reason(&error) {
            Some(reason) => Self::Revert(reason),
            None => Self::Rpc(error),
        }
    }
}

impl From<contract::Error> for AlloyChainError {
    fn from(error: contract::Error) -> Self {
        match error {
            contract::Error::TransportError(error) => error.into(),
            other => Self::Contract(other),
        }
    }
}

/// A [`SettlementChain`] backed by an alloy [`Provider`].
///
/// Transactions are sent through the provider, so it must be configured
/// with a wallet for the sending account (e.g. via `ProviderBuilder::wallet`)
/// or be connected to a node that holds the account's key.
#[derive(Debug, Clone)]
pub struct AlloyChain<P> {
    provider: P,
}

impl<P> AlloyChain<P> {
    /// Wrap a provider.
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P> SettlementChain for AlloyChain<P>
where
    P: Provider + Send + Sync,
{
    type Error = AlloyChainError;

    async fn chain_id(&self) -> Result<u64, Self::Error> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn is_approved_for_all(
        &self,
        collection: Address,
        owner: Address,
        operator: Address,
    ) -> Result<bool, Self::Error> {
        let collection = IERC721::new(collection, &self.provider);
        Ok(collection.isApprovedForAll(owner, operator).call().await?)
    }

    async fn set_approval_for_all(
        &self,
        collection: Address,
        owner: Address,
        operator: Address,
    ) -> Result<SettlementReceipt, Self::Error> {
        let collection = IERC721::new(collection, &self.provider);
        let pending = collection.setApprovalForAll(operator, true).from(owner).send().await?;
        debug!(tx_hash = %pending.tx_hash(), "approval sent");
        Ok(settlement_receipt(&pending.get_receipt().await?))
    }

    async fn counter(&self, seaport: Address, offerer: Address) -> Result<U256, Self::Error> {
        Ok(Seaport::new(seaport, &self.provider).getCounter(offerer).call().await?)
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64, Self::Error> {
        Ok(self.provider.estimate_gas(tx).await?)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, Self::Error> {
        debug!(to = ?TransactionBuilder::to(&tx), value = ?TransactionBuilder::value(&tx), gas = ?TransactionBuilder::gas_limit(&tx), "sending transaction");
        let pending = self.provider.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<SettlementReceipt, Self::Error> {
        let pending = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash);
        Ok(settlement_receipt(&pending.get_receipt().await?))
    }
}

fn settlement_receipt<R: ReceiptResponse>(receipt: &R) -> SettlementReceipt {
    SettlementReceipt {
        tx_hash: receipt.transaction_hash(),
        block_number: receipt.block_number(),
        gas_used: receipt.gas_used(),
        success: receipt.status(),
    }
}

/// Decode the revert data of a failed call, naming the Seaport error when
/// the selector is known.
fn revert_reason(error: &TransportError) -> Option<String> {
    let payload = error.as_error_resp()?;
    let data = payload.as_revert_data()?;
    Some(match SeaportErrors::abi_decode(&data) {
        Ok(decoded) => seaport_error_name(&decoded).to_owned(),
        Err(_) => payload.message.to_string(),
    })
}

const fn seaport_error_name(error: &SeaportErrors) -> &'static str {
    match error {
        SeaportErrors::BadSignatureV(_) => "BadSignatureV",
        SeaportErrors::InvalidSigner(_) => "InvalidSigner",
        SeaportErrors::InvalidSignature(_) => "InvalidSignature",
        SeaportErrors::InvalidTime(_) => "InvalidTime",
        SeaportErrors::OrderIsCancelled(_) => "OrderIsCancelled",
        SeaportErrors::OrderAlreadyFilled(_) => "OrderAlreadyFilled",
        SeaportErrors::OrderPartiallyFilled(_) => "OrderPartiallyFilled",
        SeaportErrors::InsufficientNativeTokensSupplied(_) => "InsufficientNativeTokensSupplied",
        SeaportErrors::InvalidMsgValue(_) => "InvalidMsgValue",
        SeaportErrors::InvalidRestrictedOrder(_) => "InvalidRestrictedOrder",
        SeaportErrors::InvalidContractOrder(_) => "InvalidContractOrder",
        SeaportErrors::InvalidConduit(_) => "InvalidConduit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{
        primitives::{Bytes, B256},
        providers::ProviderBuilder,
        rpc::json_rpc::ErrorPayload,
        sol_types::SolError,
        transports::mock::Asserter,
    };

    fn revert_payload(data: Vec<u8>) -> ErrorPayload {
        ErrorPayload {
            code: 3,
            message: "execution reverted".into(),
            data: Some(serde_json::value::to_raw_value(&Bytes::from(data)).unwrap()),
        }
    }

    #[test]
    fn decodes_seaport_reverts() {
        let data = Seaport::OrderAlreadyFilled { orderHash: B256::repeat_byte(1) }.abi_encode();
        let error = AlloyChainError::from(TransportError::ErrorResp(revert_payload(data)));
        assert!(matches!(&error, AlloyChainError::Revert(name) if name == "OrderAlreadyFilled"));
        assert_eq!(error.to_string(), "execution reverted: OrderAlreadyFilled");
    }

    #[test]
    fn unknown_revert_keeps_the_message() {
        let payload = revert_payload(vec![1, 2, 3, 4]);
        let error = AlloyChainError::from(TransportError::ErrorResp(payload));
        assert!(
            matches!(&error, AlloyChainError::Revert(message) if message == "execution reverted")
        );
    }

    #[tokio::test]
    async fn reads_counter_and_approval() {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone());
        let chain = AlloyChain::new(provider);

        asserter.push_success(&Bytes::from(U256::from(7).to_be_bytes::<32>().to_vec()));
        let counter = chain.counter(Address::repeat_byte(0x5e), Address::repeat_byte(1)).await;
        assert_eq!(counter.unwrap(), U256::from(7));

        asserter.push_success(&Bytes::from(U256::from(1).to_be_bytes::<32>().to_vec()));
        let approved = chain
            .is_approved_for_all(
                Address::repeat_byte(0xc0),
                Address::repeat_byte(1),
                Address::repeat_byte(0x5e),
            )
            .await;
        assert!(approved.unwrap());
    }
}
