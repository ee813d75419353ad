//! A scriptable in-memory [`SettlementChain`].
use alloy::{
    network::TransactionBuilder,
    primitives::{Address, TxHash, B256, U256},
    rpc::types::TransactionRequest,
};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};
use steptract_constants::test_utils::TEST_CHAIN_ID;
use steptract_orders::{SettlementChain, SettlementReceipt};

/// Gas used by every mock receipt.
pub const MOCK_GAS_USED: u64 = 90_000;

/// Error returned by [`MockChain`] when a failure has been scripted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct MockChainError(pub String);

#[derive(Debug)]
struct State {
    chain_id: u64,
    approvals: HashSet<(Address, Address, Address)>,
    counters: HashMap<Address, U256>,
    gas_estimate: Result<u64, String>,
    approval_check_error: Option<String>,
    approval_reverts: bool,
    counter_error: Option<String>,
    send_error: Option<String>,
    receipt_success: bool,
    hang_receipts: bool,
    approval_txs: usize,
    sent: Vec<TransactionRequest>,
    next_hash: u64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            chain_id: TEST_CHAIN_ID,
            approvals: HashSet::new(),
            counters: HashMap::new(),
            gas_estimate: Ok(100_000),
            approval_check_error: None,
            approval_reverts: false,
            counter_error: None,
            send_error: None,
            receipt_success: true,
            hang_receipts: false,
            approval_txs: 0,
            sent: Vec::new(),
            next_hash: 1,
        }
    }
}

/// A [`SettlementChain`] whose responses are set up by the test.
///
/// Clones share state, so a test can keep a handle while the workflow
/// under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<State>>,
}

impl MockChain {
    /// A chain on [`TEST_CHAIN_ID`] where every call succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    /// Report `chain_id` from [`SettlementChain::chain_id`].
    pub fn with_chain_id(self, chain_id: u64) -> Self {
        self.with_state(|s| s.chain_id = chain_id);
        self
    }

    /// Mark `operator` as approved for all of `owner`'s tokens in
    /// `collection`.
    pub fn with_approval(self, collection: Address, owner: Address, operator: Address) -> Self {
        self.with_state(|s| s.approvals.insert((collection, owner, operator)));
        self
    }

    /// Set the Seaport counter of `offerer`.
    pub fn with_counter(self, offerer: Address, counter: U256) -> Self {
        self.with_state(|s| s.counters.insert(offerer, counter));
        self
    }

    /// Return `gas` from every estimate.
    pub fn with_gas_estimate(self, gas: u64) -> Self {
        self.with_state(|s| s.gas_estimate = Ok(gas));
        self
    }

    /// Fail every estimate with `message`.
    pub fn failing_estimates(self, message: &str) -> Self {
        self.with_state(|s| s.gas_estimate = Err(message.to_owned()));
        self
    }

    /// Fail every approval check with `message`.
    pub fn failing_approval_checks(self, message: &str) -> Self {
        self.with_state(|s| s.approval_check_error = Some(message.to_owned()));
        self
    }

    /// Mine approval transactions as reverted.
    pub fn reverting_approvals(self) -> Self {
        self.with_state(|s| s.approval_reverts = true);
        self
    }

    /// Fail every counter read with `message`.
    pub fn failing_counter(self, message: &str) -> Self {
        self.with_state(|s| s.counter_error = Some(message.to_owned()));
        self
    }

    /// Reject every submitted transaction with `message`.
    pub fn failing_sends(self, message: &str) -> Self {
        self.with_state(|s| s.send_error = Some(message.to_owned()));
        self
    }

    /// Mine submitted transactions as reverted.
    pub fn reverting_transactions(self) -> Self {
        self.with_state(|s| s.receipt_success = false);
        self
    }

    /// Never produce a receipt.
    pub fn hanging_receipts(self) -> Self {
        self.with_state(|s| s.hang_receipts = true);
        self
    }

    /// Transactions submitted through [`SettlementChain::send_transaction`].
    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.with_state(|s| s.sent.clone())
    }

    /// Number of approval transactions sent.
    pub fn approval_txs(&self) -> usize {
        self.with_state(|s| s.approval_txs)
    }

    /// True if `operator` is approved for `owner` in `collection`.
    pub fn is_approved(&self, collection: Address, owner: Address, operator: Address) -> bool {
        self.with_state(|s| s.approvals.contains(&(collection, owner, operator)))
    }

    fn next_hash(state: &mut State) -> TxHash {
        let hash = B256::from(U256::from(state.next_hash));
        state.next_hash += 1;
        hash
    }
}

impl SettlementChain for MockChain {
    type Error = MockChainError;

    async fn chain_id(&self) -> Result<u64, Self::Error> {
        Ok(self.with_state(|s| s.chain_id))
    }

    async fn is_approved_for_all(
        &self,
        collection: Address,
        owner: Address,
        operator: Address,
    ) -> Result<bool, Self::Error> {
        self.with_state(|s| match &s.approval_check_error {
            Some(message) => Err(MockChainError(message.clone())),
            None => Ok(s.approvals.contains(&(collection, owner, operator))),
        })
    }

    async fn set_approval_for_all(
        &self,
        collection: Address,
        owner: Address,
        operator: Address,
    ) -> Result<SettlementReceipt, Self::Error> {
        Ok(self.with_state(|s| {
            s.approval_txs += 1;
            let success = !s.approval_reverts;
            if success {
                s.approvals.insert((collection, owner, operator));
            }
            SettlementReceipt {
                tx_hash: Self::next_hash(s),
                block_number: Some(1),
                gas_used: MOCK_GAS_USED,
                success,
            }
        }))
    }

    async fn counter(&self, _seaport: Address, offerer: Address) -> Result<U256, Self::Error> {
        self.with_state(|s| match &s.counter_error {
            Some(message) => Err(MockChainError(message.clone())),
            None => Ok(s.counters.get(&offerer).copied().unwrap_or_default()),
        })
    }

    async fn estimate_gas(&self, _tx: TransactionRequest) -> Result<u64, Self::Error> {
        self.with_state(|s| s.gas_estimate.clone().map_err(MockChainError))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, Self::Error> {
        self.with_state(|s| {
            if let Some(message) = &s.send_error {
                return Err(MockChainError(message.clone()));
            }
            assert!(TransactionBuilder::gas_limit(&tx).is_some(), "transactions are sent with a gas limit");
            s.sent.push(tx);
            Ok(Self::next_hash(s))
        })
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<SettlementReceipt, Self::Error> {
        let (hang, success) = self.with_state(|s| (s.hang_receipts, s.receipt_success));
        if hang {
            core::future::pending::<()>().await;
        }
        Ok(SettlementReceipt {
            tx_hash,
            block_number: Some(2),
            gas_used: MOCK_GAS_USED,
            success,
        })
    }
}
