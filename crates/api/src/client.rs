use crate::{
    types::{ErrorResponse, NftsResponse, OrdersRequest},
    ApiError,
};
use serde::{de::DeserializeOwned, Serialize};
use steptract_types::{ListingRecord, NewListing, Sale};
use tracing::{instrument, warn};

/// The endpoints of the listing backend.
const NFTS: &str = "api/nfts";
const ORDER: &str = "api/order";
const ORDERS: &str = "api/orders";
const BUY: &str = "api/buy";

/// Client for the listing backend.
///
/// Endpoints are joined onto the base URL, so the base should end with a
/// `/` when it carries a path. [`MarketApi::new_from_string`] adds it.
#[derive(Debug, Clone)]
pub struct MarketApi {
    /// The base URL of the backend.
    url: reqwest::Url,
    /// The reqwest client used to send requests.
    client: reqwest::Client,
}

impl MarketApi {
    /// Create a new client with the given URL and reqwest client.
    pub const fn new_with_client(url: reqwest::Url, client: reqwest::Client) -> Self {
        Self { url, client }
    }

    /// Instantiate a new client with the given URL and a new reqwest client.
    pub fn new(url: reqwest::Url) -> Self {
        Self { url, client: reqwest::Client::new() }
    }

    /// Create a new client given a string URL.
    pub fn new_from_string(url: &str) -> Result<Self, ApiError> {
        let url = if url.ends_with('/') { url.to_owned() } else { format!("{url}/") };
        Ok(Self::new(reqwest::Url::parse(&url)?))
    }

    /// The base URL.
    pub const fn url(&self) -> &reqwest::Url {
        &self.url
    }

    /// Get the client used to send requests.
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    async fn post_inner<T: Serialize + ?Sized>(
        &self,
        join: &'static str,
        body: &T,
    ) -> Result<(), ApiError> {
        // Append the path to the URL.
        let url = self
            .url
            .join(join)
            .inspect_err(|e| warn!(%e, "Failed to join URL. Not posting to listing API."))?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .inspect_err(|e| warn!(%e, "Failed to post to listing API"))?;

        check_status(response).await.map(drop)
    }

    async fn get_inner<T: DeserializeOwned>(&self, join: &'static str) -> Result<T, ApiError> {
        // Append the path to the URL.
        let url = self
            .url
            .join(join)
            .inspect_err(|e| warn!(%e, "Failed to join URL. Not querying listing API."))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| warn!(%e, "Failed to get object from listing API"))?;

        check_status(response)
            .await?
            .json::<T>()
            .await
            .inspect_err(|e| warn!(%e, "Failed to parse response from listing API"))
            .map_err(Into::into)
    }

    /// Fetch every listing record.
    #[instrument(skip_all)]
    pub async fn get_nfts(&self) -> Result<Vec<ListingRecord>, ApiError> {
        let response: NftsResponse = self.get_inner(NFTS).await?;
        Ok(response.nfts)
    }

    /// Upsert a single signed listing.
    #[instrument(skip_all, fields(tokenid = %listing.tokenid))]
    pub async fn post_order(&self, listing: &NewListing) -> Result<(), ApiError> {
        self.post_inner(ORDER, listing).await
    }

    /// Upsert a batch of signed listings. The backend applies all of them or
    /// none.
    #[instrument(skip_all, fields(count = listings.len()))]
    pub async fn post_orders(&self, listings: Vec<NewListing>) -> Result<(), ApiError> {
        self.post_inner(ORDERS, &OrdersRequest { orders: listings }).await
    }

    /// Record a completed sale.
    #[instrument(skip_all, fields(tokenid = %sale.tokenid))]
    pub async fn post_buy(&self, sale: &Sale) -> Result<(), ApiError> {
        self.post_inner(BUY, sale).await
    }
}

/// Turn a non-success response into an [`ApiError`] carrying the body's
/// error message.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_owned(),
    };
    warn!(%status, %message, "Listing API returned an error");
    Err(ApiError::from_status(status, message))
}
