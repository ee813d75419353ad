use alloy::{
    primitives::{Address, Bytes, Signature},
    providers::Provider,
    transports::TransportError,
};
use serde_json::{json, Value};
use steptract_constants::ChainParams;
use steptract_types::{SigningError, TypedDataPayload, TypedDataSigner};
use tracing::{debug, instrument};

/// EIP-1193 code for a request the user declined.
const USER_REJECTED: i64 = 4001;

/// EIP-3326 code for a chain the wallet does not know.
const UNRECOGNIZED_CHAIN: i64 = 4902;

/// Signs through a wallet reached over JSON-RPC, using
/// `eth_signTypedData_v4`.
///
/// The wallet hashes the JSON document itself, so the `EIP712Domain` type
/// must be declared in the payload.
#[derive(Debug, Clone)]
pub struct WalletTypedDataSigner<P> {
    provider: P,
    address: Address,
}

impl<P> WalletTypedDataSigner<P> {
    /// Sign as `address` through `provider`.
    pub const fn new(provider: P, address: Address) -> Self {
        Self { provider, address }
    }

    /// Get a reference to the provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider> WalletTypedDataSigner<P> {
    /// Request account access and sign as the first account the wallet
    /// exposes.
    #[instrument(skip_all)]
    pub async fn connect(provider: P) -> Result<Self, SigningError> {
        let accounts: Vec<Address> =
            provider.raw_request("eth_requestAccounts".into(), ()).await.map_err(wallet_error)?;
        let address = accounts.first().copied().ok_or(SigningError::NotConnected)?;
        debug!(%address, "wallet connected");
        Ok(Self::new(provider, address))
    }

    /// Switch the wallet to `chain`, adding it first if the wallet does not
    /// know it.
    #[instrument(skip_all, fields(chain_id = chain.chain_id()))]
    pub async fn switch_chain(&self, chain: &ChainParams) -> Result<(), SigningError> {
        let params = [json!({ "chainId": chain.chain_id_hex() })];
        let switched = self
            .provider
            .raw_request::<_, Value>("wallet_switchEthereumChain".into(), params)
            .await;
        match switched {
            Ok(_) => Ok(()),
            Err(error) if error_code(&error) == Some(UNRECOGNIZED_CHAIN) => {
                self.add_chain(chain).await
            }
            Err(error) => Err(wallet_error(error)),
        }
    }

    /// Ask the wallet to add `chain` with `wallet_addEthereumChain`.
    #[instrument(skip_all, fields(chain_id = chain.chain_id()))]
    pub async fn add_chain(&self, chain: &ChainParams) -> Result<(), SigningError> {
        let params = [json!({
            "chainId": chain.chain_id_hex(),
            "chainName": chain.name(),
            "nativeCurrency": {
                "name": chain.native_symbol(),
                "symbol": chain.native_symbol(),
                "decimals": chain.native_decimals(),
            },
            "rpcUrls": [chain.rpc_url()],
            "blockExplorerUrls": [chain.explorer_url()],
        })];
        self.provider
            .raw_request::<_, Value>("wallet_addEthereumChain".into(), params)
            .await
            .map_err(wallet_error)?;
        Ok(())
    }
}

impl<P> TypedDataSigner for WalletTypedDataSigner<P>
where
    P: Provider + Send + Sync,
{
    fn address(&self) -> Address {
        self.address
    }

    fn injects_domain_type(&self) -> bool {
        false
    }

    #[instrument(skip_all, fields(primary_type = payload.primary_type()))]
    async fn sign_typed_data(&self, payload: &TypedDataPayload) -> Result<Signature, SigningError> {
        let document = payload.to_json().to_string();
        let raw: Bytes = self
            .provider
            .raw_request("eth_signTypedData_v4".into(), (self.address, document))
            .await
            .map_err(wallet_error)?;

        let signature = Signature::from_raw(&raw)?;
        let recovered = signature.recover_address_from_prehash(&payload.signing_hash())?;
        if recovered != self.address {
            return Err(SigningError::Wallet(format!(
                "signature recovers to {recovered}, expected {}",
                self.address
            )));
        }
        Ok(signature)
    }
}

fn error_code(error: &TransportError) -> Option<i64> {
    error.as_error_resp().map(|payload| payload.code)
}

fn wallet_error(error: TransportError) -> SigningError {
    if error_code(&error) == Some(USER_REJECTED) {
        return SigningError::UserRejected;
    }
    let message = error.to_string();
    let lower = message.to_lowercase();
    if lower.contains("user rejected") || lower.contains("user denied") {
        SigningError::UserRejected
    } else {
        SigningError::Wallet(message)
    }
}
