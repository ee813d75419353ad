use alloy::primitives::{Address, B256};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use steptract_api::{types::OrdersRequest, ApiError, MarketApi};
use steptract_types::{ListingRecord, NewListing, Sale};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Default)]
struct Seen {
    bodies: Mutex<Vec<(&'static str, Value)>>,
}

async fn nfts() -> Json<Value> {
    Json(json!({ "nfts": [{ "tokenid": "1", "price": "0.5" }, { "tokenid": 2 }] }))
}

async fn order(State(seen): State<Arc<Seen>>, Json(body): Json<Value>) -> Json<Value> {
    seen.bodies.lock().await.push(("order", body));
    Json(json!({ "success": true }))
}

async fn orders(State(seen): State<Arc<Seen>>, Json(body): Json<Value>) -> Json<Value> {
    seen.bodies.lock().await.push(("orders", body));
    Json(json!({ "success": true }))
}

async fn buy(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["tokenid"] == "404" {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "No record for token 404" })));
    }
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "store offline" })))
}

async fn serve() -> (MarketApi, Arc<Seen>) {
    let seen = Arc::new(Seen::default());
    let app = Router::new()
        .route("/api/nfts", get(nfts))
        .route("/api/order", post(order))
        .route("/api/orders", post(orders))
        .route("/api/buy", post(buy))
        .with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (MarketApi::new_from_string(&format!("http://{addr}")).unwrap(), seen)
}

fn listing(tokenid: &str) -> NewListing {
    NewListing {
        tokenid: tokenid.into(),
        price: Decimal::new(15, 1),
        seller_address: Address::repeat_byte(0xaa),
        seaport_order: json!({ "parameters": {}, "signature": "0x" }),
        order_hash: B256::repeat_byte(1),
    }
}

#[tokio::test]
async fn fetches_records() {
    let (api, _) = serve().await;
    let records = api.get_nfts().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].price, Decimal::new(5, 1));
    assert_eq!(records[1], ListingRecord::new("2"));
}

#[tokio::test]
async fn posts_single_and_batch_listings() {
    let (api, seen) = serve().await;
    api.post_order(&listing("1")).await.unwrap();
    api.post_orders(vec![listing("2"), listing("3")]).await.unwrap();

    let bodies = seen.bodies.lock().await;
    assert_eq!(bodies[0].0, "order");
    assert_eq!(bodies[0].1["tokenid"], "1");
    assert_eq!(bodies[0].1["price"], "1.5");

    assert_eq!(bodies[1].0, "orders");
    let batch: OrdersRequest = serde_json::from_value(bodies[1].1.clone()).unwrap();
    assert_eq!(batch.orders, vec![listing("2"), listing("3")]);
}

#[tokio::test]
async fn maps_error_statuses() {
    let (api, _) = serve().await;
    let buyer = Address::repeat_byte(0xbb);

    let missing = Sale { tokenid: "404".into(), buyer_address: buyer };
    let err = api.post_buy(&missing).await.unwrap_err();
    assert!(matches!(&err, ApiError::NotFound(msg) if msg.contains("404")));

    let sale = Sale { tokenid: "1".into(), buyer_address: buyer };
    let err = api.post_buy(&sale).await.unwrap_err();
    assert!(matches!(err, ApiError::Server(msg) if msg == "store offline"));
}

#[tokio::test]
async fn base_url_gets_trailing_slash() {
    let api = MarketApi::new_from_string("http://localhost:3000/market").unwrap();
    assert_eq!(api.url().as_str(), "http://localhost:3000/market/");
    assert!(MarketApi::new_from_string("not a url").is_err());
}
