//! Fulfillment workflow against the mock chain and store.

use alloy::{
    network::TransactionBuilder,
    primitives::{B256, U256},
    sol_types::SolCall,
};
use core::time::Duration;
use rust_decimal::Decimal;
use chrono::Utc;
use steptract_constants::test_utils::{TEST_MARKET, TEST_SEAPORT};
use steptract_orders::{
    FulfillmentError, FulfillmentOptions, FulfillmentStage, Fulfiller, RevertReason,
};
use steptract_seaport::Seaport::fulfillOrderCall;
use steptract_test_utils::{
    chain::MockChain,
    init_tracing,
    orders::TestOrderBuilder,
    store::MockListingStore,
    users::{test_typed_signer, TEST_USERS},
};
use steptract_types::ListingRecord;

fn fulfiller(
    buyer: usize,
    chain: &MockChain,
    store: &MockListingStore,
) -> Fulfiller<MockChain, MockListingStore> {
    Fulfiller::new(
        TEST_USERS[buyer],
        chain.clone(),
        store.clone(),
        TEST_MARKET,
        FulfillmentOptions::default(),
    )
}

async fn listed(token_id: u64) -> ListingRecord {
    TestOrderBuilder::new(token_id)
        .with_price(Decimal::new(15, 1))
        .listed_record(test_typed_signer(0))
        .await
}

#[tokio::test]
async fn buys_a_listed_token() {
    init_tracing();
    let record = listed(8).await;
    let chain = MockChain::new().with_gas_estimate(200_000);
    let store = MockListingStore::with_records([record]);

    let receipt = fulfiller(1, &chain, &store).fulfill_token("8").await.unwrap();
    assert!(receipt.success);

    let sent = chain.sent();
    assert_eq!(sent.len(), 1);
    let tx = &sent[0];
    assert_eq!(TransactionBuilder::to(tx), Some(TEST_SEAPORT));
    assert_eq!(tx.from, Some(TEST_USERS[1]));
    assert_eq!(TransactionBuilder::value(tx), Some(U256::from(1_500_000_000_000_000_000u64)));
    assert_eq!(TransactionBuilder::gas_limit(tx), Some(260_000));

    let sold = store.record("8").unwrap();
    assert!(!sold.is_listed());
    assert_eq!(sold.buyer_address, Some(TEST_USERS[1]));
    assert!(sold.on_chain);
    assert_eq!(store.sales().len(), 1);
}

#[tokio::test]
async fn estimate_failure_uses_the_fallback_limit() {
    let chain = MockChain::new().failing_estimates("execution reverted");
    let store = MockListingStore::with_records([listed(1).await]);

    fulfiller(2, &chain, &store).fulfill_token("1").await.unwrap();
    assert_eq!(TransactionBuilder::gas_limit(&chain.sent()[0]), Some(1_000_000));
}

#[tokio::test]
async fn rejects_invalid_listings_before_sending() {
    let chain = MockChain::new();
    let record = listed(2).await;
    let store = MockListingStore::with_records([record.clone()]);

    // the seller cannot buy their own listing
    let err = fulfiller(0, &chain, &store).fulfill(&record).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::SelfTrade));

    // tampered price
    let mut tampered = record.clone();
    tampered.seaport_order.as_mut().unwrap()["parameters"]["consideration"][0]["startAmount"] =
        "1".into();
    let err = fulfiller(1, &chain, &store).fulfill(&tampered).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::OrderIntegrityMismatch { .. }));

    // missing stored hash fails closed
    let mut unhashed = record.clone();
    unhashed.order_hash = None;
    let err = fulfiller(1, &chain, &store).fulfill(&unhashed).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::OrderIntegrityMismatch { stored: None, .. }));

    // unlisted
    let err = fulfiller(1, &chain, &store).fulfill(&ListingRecord::new("2")).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::NotListed(_)));

    // unknown token
    let err = fulfiller(1, &chain, &store).fulfill_token("99").await.unwrap_err();
    assert!(matches!(err, FulfillmentError::NotListed(id) if id == "99"));

    assert!(chain.sent().is_empty());
    assert!(store.sales().is_empty());
}

#[tokio::test]
async fn expired_orders_are_rejected() {
    let record = TestOrderBuilder::new(3)
        .with_window(1_000, 2_000)
        .listed_record(test_typed_signer(0))
        .await;
    let chain = MockChain::new();
    let store = MockListingStore::with_records([record.clone()]);

    let err = fulfiller(1, &chain, &store).fulfill(&record).await.unwrap_err();
    assert!(matches!(
        err,
        FulfillmentError::OrderExpired { end_time } if end_time == U256::from(2_000)
    ));
}

#[tokio::test]
async fn orders_not_yet_started_still_settle() {
    let now = Utc::now().timestamp() as u64;
    let record = TestOrderBuilder::new(13)
        .with_window(now + 600, now + 3_600)
        .listed_record(test_typed_signer(0))
        .await;
    let chain = MockChain::new();
    let store = MockListingStore::with_records([record.clone()]);

    let receipt = fulfiller(1, &chain, &store).fulfill(&record).await.unwrap();
    assert!(receipt.success);
    assert_eq!(chain.sent().len(), 1);
    assert_eq!(TransactionBuilder::value(&chain.sent()[0]), Some(U256::from(1_000_000_000_000_000_000u64)));

    let sold = store.record("13").unwrap();
    assert!(!sold.is_listed());
    assert_eq!(sold.buyer_address, Some(TEST_USERS[1]));
}

#[tokio::test]
async fn settles_through_the_order_conduit() {
    let conduit_key = B256::repeat_byte(0x77);
    let record = TestOrderBuilder::new(14)
        .with_constants(TEST_MARKET.with_conduit_key(conduit_key))
        .listed_record(test_typed_signer(0))
        .await;
    let chain = MockChain::new();
    let store = MockListingStore::with_records([record.clone()]);

    fulfiller(1, &chain, &store).fulfill(&record).await.unwrap();

    let sent = chain.sent();
    let call = fulfillOrderCall::abi_decode(TransactionBuilder::input(&sent[0]).unwrap()).unwrap();
    assert_eq!(call.fulfillerConduitKey, conduit_key);
    assert_eq!(call.order.parameters.conduitKey, conduit_key);
}

#[tokio::test]
async fn store_read_failure_is_reported() {
    let chain = MockChain::new();
    let store = MockListingStore::with_records([listed(15).await]).failing_fetches("offline");

    let err = fulfiller(1, &chain, &store).fulfill_token("15").await.unwrap_err();
    assert!(matches!(err, FulfillmentError::Store(_)));
    assert_eq!(err.to_string(), "failed to read listings: offline");
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn classifies_chain_failures() {
    let record = listed(4).await;
    let store = MockListingStore::with_records([record.clone()]);

    let chain = MockChain::new().failing_sends("insufficient funds for gas * price + value");
    let err = fulfiller(1, &chain, &store).fulfill(&record).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::InsufficientFunds));

    let chain = MockChain::new().failing_sends("MetaMask Tx Signature: User denied transaction");
    let err = fulfiller(1, &chain, &store).fulfill(&record).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::UserRejected));

    let chain = MockChain::new().failing_sends("execution reverted: OrderAlreadyFilled");
    let err = fulfiller(1, &chain, &store).fulfill(&record).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::SettlementReverted(RevertReason::OrderUnavailable)));

    let chain = MockChain::new().reverting_transactions();
    let err = fulfiller(1, &chain, &store).fulfill(&record).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::SettlementReverted(RevertReason::Other(_))));

    assert!(store.record("4").unwrap().is_listed());
}

#[tokio::test]
async fn unrecorded_sale_keeps_the_hash() {
    let record = listed(5).await;
    let chain = MockChain::new();
    let store = MockListingStore::with_records([record.clone()]).failing_sales("write failed");

    let err = fulfiller(1, &chain, &store).fulfill(&record).await.unwrap_err();
    match err {
        FulfillmentError::PersistenceFailed { tx_hash, .. } => assert!(!tx_hash.is_zero()),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(chain.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn confirmation_times_out() {
    let record = listed(6).await;
    let chain = MockChain::new().hanging_receipts();
    let store = MockListingStore::with_records([record.clone()]);
    let options = FulfillmentOptions::default().with_confirmation_timeout(Duration::from_secs(5));
    let fulfiller =
        Fulfiller::new(TEST_USERS[1], chain.clone(), store.clone(), TEST_MARKET, options);

    let err = fulfiller.fulfill(&record).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::Timeout(FulfillmentStage::Submitted)));
    assert!(store.sales().is_empty());
}
