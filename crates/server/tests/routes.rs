use alloy::primitives::{Address, B256};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use steptract_server::{router, AppState, MarketContracts, MemoryRepository};
use steptract_test_utils::{
    orders::TestOrderBuilder,
    users::{test_typed_signer, TEST_USERS},
};
use tower::ServiceExt;

const COLLECTION: Address = Address::repeat_byte(0xc0);

fn app() -> Router {
    let contracts = MarketContracts { nft_contract: Some(COLLECTION), marketplace_contract: None };
    router(AppState::new(MemoryRepository::new(contracts)), None)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn order_body(token_id: u64) -> Value {
    let order = TestOrderBuilder::new(token_id).sign(test_typed_signer(0)).await;
    json!({
        "tokenid": token_id,
        "price": "1",
        "seller_address": TEST_USERS[0],
        "seaport_order": order,
        "order_hash": order.hash(),
    })
}

#[tokio::test]
async fn lists_and_sells() {
    let app = app();

    let (status, body) = send(&app, "POST", "/api/order", Some(order_body(10).await)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, json!({ "success": true }));

    let batch = json!({ "orders": [order_body(9).await, order_body(2).await] });
    let (status, _) = send(&app, "POST", "/api/orders", Some(batch)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/nfts", None).await;
    assert_eq!(status, StatusCode::OK);
    let nfts = body["nfts"].as_array().unwrap();
    let ids: Vec<_> = nfts.iter().map(|n| n["tokenid"].as_str().unwrap()).collect();
    assert_eq!(ids, ["2", "9", "10"]);
    assert_eq!(nfts[0]["price"], "1");
    assert_eq!(nfts[0]["on_chain"], false);
    assert_eq!(nfts[0]["buyer_address"], Value::Null);
    assert_eq!(nfts[0]["nft_contract"], json!(COLLECTION));

    let sale = json!({ "tokenid": "9", "buyer_address": TEST_USERS[1] });
    let (status, _) = send(&app, "POST", "/api/buy", Some(sale)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/api/nfts", None).await;
    let sold = &body["nfts"][1];
    assert_eq!(sold["tokenid"], "9");
    assert_eq!(sold["price"], "0");
    assert_eq!(sold["seller_address"], Value::Null);
    assert_eq!(sold["seaport_order"], Value::Null);
    assert_eq!(sold["buyer_address"], json!(TEST_USERS[1]));
    assert_eq!(sold["on_chain"], true);
}

#[tokio::test]
async fn order_requires_data() {
    let app = app();

    let mut body = order_body(1).await;
    body.as_object_mut().unwrap().remove("seaport_order");
    let (status, body) = send(&app, "POST", "/api/order", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing data");

    let mut body = order_body(1).await;
    body["tokenid"] = Value::Null;
    let (status, _) = send(&app, "POST", "/api/order", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = order_body(1).await;
    body["order_hash"] = json!(B256::repeat_byte(1));
    let (status, _) = send(&app, "POST", "/api/order", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "POST", "/api/order", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, body) = send(&app, "GET", "/api/nfts", None).await;
    assert_eq!(body, json!({ "nfts": [] }));
}

#[tokio::test]
async fn batch_is_all_or_nothing() {
    let app = app();

    let mut broken = order_body(4).await;
    broken["seaport_order"] = Value::Null;
    let batch = json!({ "orders": [order_body(3).await, broken] });
    let (status, body) = send(&app, "POST", "/api/orders", Some(batch)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "orders[1]: Missing data");

    let (_, body) = send(&app, "GET", "/api/nfts", None).await;
    assert_eq!(body["nfts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn buy_checks_the_record() {
    let app = app();

    let (status, body) = send(&app, "POST", "/api/buy", Some(json!({ "tokenid": "7" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing buying data");

    let sale = json!({ "tokenid": 7, "buyer_address": TEST_USERS[1] });
    let (status, body) = send(&app, "POST", "/api/buy", Some(sale)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No record for token 7");
}

#[tokio::test]
async fn serves_health_and_the_frontend() {
    let (status, _) = send(&app(), "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);

    let dir = std::env::temp_dir().join(format!("steptract-static-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<html>market</html>").unwrap();

    let app = router(AppState::new(MemoryRepository::default()), Some(&dir));
    let request = Request::builder().uri("/token/12").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<html>market</html>");

    std::fs::remove_dir_all(&dir).ok();
}
