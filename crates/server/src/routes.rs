use crate::{ListingRepository, ServerError};
use alloy::primitives::{Address, B256};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::{path::Path, sync::Arc};
use steptract_api::types::{NftsResponse, SuccessResponse};
use steptract_types::{normalize, NewListing, Sale};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, instrument};

/// Signed orders carry bulk proofs, so bodies can be large.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState<R> {
    repository: Arc<R>,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self { repository: Arc::clone(&self.repository) }
    }
}

impl<R> AppState<R> {
    /// Wrap a repository.
    pub fn new(repository: R) -> Self {
        Self { repository: Arc::new(repository) }
    }

    /// Get a reference to the repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }
}

/// The backend's routes, with the frontend in `static_dir` served for
/// every other path.
pub fn router<R: ListingRepository>(state: AppState<R>, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/api/nfts", get(nfts::<R>))
        .route("/api/order", post(order::<R>))
        .route("/api/orders", post(orders::<R>))
        .route("/api/buy", post(buy::<R>))
        .route("/healthz", get(healthz))
        .with_state(state);

    let app = match static_dir {
        Some(dir) => {
            let index = ServeFile::new(dir.join("index.html"));
            api.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => api,
    };

    app.layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[instrument(skip_all)]
async fn nfts<R: ListingRepository>(
    State(state): State<AppState<R>>,
) -> Result<Json<NftsResponse>, ServerError> {
    let nfts = state.repository.all().await?;
    Ok(Json(NftsResponse { nfts }))
}

#[instrument(skip_all)]
async fn order<R: ListingRepository>(
    State(state): State<AppState<R>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ServerError> {
    let listing = parse::<OrderBody>(body)?.into_listing()?;
    info!(tokenid = %listing.tokenid, price = %listing.price, "listing");
    state.repository.upsert(vec![listing], Utc::now()).await?;
    Ok(Json(SuccessResponse::OK))
}

#[instrument(skip_all)]
async fn orders<R: ListingRepository>(
    State(state): State<AppState<R>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ServerError> {
    let OrdersBody { orders } = parse(body)?;
    if orders.is_empty() {
        return Err(ServerError::bad_request("No orders"));
    }
    let listings = orders
        .into_iter()
        .enumerate()
        .map(|(index, order)| {
            order.into_listing().map_err(|error| {
                ServerError::bad_request(format!("orders[{index}]: {error}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(count = listings.len(), "listing batch");
    state.repository.upsert(listings, Utc::now()).await?;
    Ok(Json(SuccessResponse::OK))
}

#[instrument(skip_all)]
async fn buy<R: ListingRepository>(
    State(state): State<AppState<R>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ServerError> {
    let BuyBody { tokenid, buyer_address } = parse(body)?;
    let (Some(tokenid), Some(buyer_address)) = (token_id(tokenid), buyer_address) else {
        return Err(ServerError::bad_request("Missing buying data"));
    };

    info!(%tokenid, %buyer_address, "sale");
    state.repository.mark_sold(Sale { tokenid, buyer_address }, Utc::now()).await?;
    Ok(Json(SuccessResponse::OK))
}

/// A listing as posted by a client. Every field is optional here so that
/// missing data is reported as a 400 with a message.
#[derive(Debug, Deserialize)]
struct OrderBody {
    #[serde(default, alias = "tokenId")]
    tokenid: Option<Value>,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    seller_address: Option<Address>,
    #[serde(default)]
    seaport_order: Option<Value>,
    #[serde(default)]
    order_hash: Option<B256>,
}

impl OrderBody {
    fn into_listing(self) -> Result<NewListing, ServerError> {
        let (Some(tokenid), Some(seaport_order)) = (token_id(self.tokenid), self.seaport_order)
        else {
            return Err(ServerError::bad_request("Missing data"));
        };
        let seller_address =
            self.seller_address.ok_or_else(|| ServerError::bad_request("Missing seller_address"))?;
        let price = self
            .price
            .filter(|price| *price > Decimal::ZERO)
            .ok_or_else(|| ServerError::bad_request("Missing or non-positive price"))?;

        let order = normalize(&seaport_order)
            .map_err(|error| ServerError::bad_request(format!("Malformed order: {error}")))?;
        if order.parameters.offerer != seller_address {
            return Err(ServerError::bad_request("Order offerer is not the seller"));
        }
        let computed = order.hash();
        let order_hash = self.order_hash.unwrap_or(computed);
        if order_hash != computed {
            return Err(ServerError::bad_request("order_hash does not match the order"));
        }

        Ok(NewListing { tokenid, price, seller_address, seaport_order, order_hash })
    }
}

#[derive(Debug, Deserialize)]
struct OrdersBody {
    #[serde(default)]
    orders: Vec<OrderBody>,
}

#[derive(Debug, Deserialize)]
struct BuyBody {
    #[serde(default, alias = "tokenId")]
    tokenid: Option<Value>,
    #[serde(default)]
    buyer_address: Option<Address>,
}

fn parse<T: DeserializeOwned>(body: Result<Json<Value>, JsonRejection>) -> Result<T, ServerError> {
    let Json(value) = body.map_err(|rejection| ServerError::bad_request(rejection.body_text()))?;
    serde_json::from_value(value).map_err(|error| ServerError::bad_request(error.to_string()))
}

/// Token ids arrive as strings or numbers.
fn token_id(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
