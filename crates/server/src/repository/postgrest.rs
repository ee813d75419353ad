use super::{ListingRepository, MarketContracts, RepositoryError};
use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use reqwest::{header::HeaderValue, RequestBuilder, Response};
use serde_json::{json, Value};
use steptract_types::{compare_token_ids, ListingRecord, NewListing, Sale};
use tracing::{instrument, warn};
use url::Url;

/// The table holding one row per token.
const TABLE: &str = "rest/v1/metadata";

/// Upsert on the primary key without echoing rows back.
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=minimal";

/// Records in a Supabase table, reached through its PostgREST endpoint.
///
/// A batch upsert is one request, which PostgREST runs as one statement.
#[derive(Debug, Clone)]
pub struct PostgrestRepository {
    url: Url,
    key: String,
    client: reqwest::Client,
    contracts: MarketContracts,
}

impl PostgrestRepository {
    /// A repository for the Supabase project at `url`, authenticated with
    /// the service role `key`.
    pub fn new(url: Url, key: String, contracts: MarketContracts) -> Self {
        Self::new_with_client(url, key, contracts, reqwest::Client::new())
    }

    /// As [`Self::new`], sending requests with `client`.
    pub fn new_with_client(
        url: Url,
        key: String,
        contracts: MarketContracts,
        client: reqwest::Client,
    ) -> Self {
        let url = if url.path().ends_with('/') {
            url
        } else {
            let mut url = url;
            url.set_path(&format!("{}/", url.path()));
            url
        };
        Self { url, key, client, contracts }
    }

    fn table(&self) -> Result<Url, RepositoryError> {
        Ok(self.url.join(TABLE)?)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.key).bearer_auth(&self.key)
    }

    fn listing_row(&self, listing: &NewListing, at: DateTime<Utc>) -> Value {
        json!({
            "tokenid": listing.tokenid,
            "price": listing.price,
            "seller_address": lower(listing.seller_address),
            "buyer_address": null,
            "seaport_order": listing.seaport_order,
            "order_hash": listing.order_hash,
            "on_chain": false,
            "nft_contract": self.contracts.nft_contract.map(lower),
            "marketplace_contract": self.contracts.marketplace_contract.map(lower),
            "updatedat": at,
        })
    }
}

impl ListingRepository for PostgrestRepository {
    #[instrument(skip_all)]
    async fn all(&self) -> Result<Vec<ListingRecord>, RepositoryError> {
        let mut url = self.table()?;
        url.query_pairs_mut().append_pair("select", "*").append_pair("order", "tokenid.asc");

        let response = check(self.authed(self.client.get(url)).send().await?).await?;
        let mut records: Vec<ListingRecord> = response.json().await?;
        // text ordering in the table puts "10" before "9"
        records.sort_by(|a, b| compare_token_ids(&a.tokenid, &b.tokenid));
        Ok(records)
    }

    #[instrument(skip_all, fields(count = listings.len()))]
    async fn upsert(
        &self,
        listings: Vec<NewListing>,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut url = self.table()?;
        url.query_pairs_mut().append_pair("on_conflict", "tokenid");
        let rows: Vec<Value> = listings.iter().map(|l| self.listing_row(l, at)).collect();

        let request = self
            .authed(self.client.post(url))
            .header("Prefer", HeaderValue::from_static(MERGE_DUPLICATES))
            .json(&rows);
        check(request.send().await?).await.map(drop)
    }

    #[instrument(skip_all, fields(tokenid = %sale.tokenid))]
    async fn mark_sold(&self, sale: Sale, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut url = self.table()?;
        url.query_pairs_mut().append_pair("tokenid", &format!("eq.{}", sale.tokenid));
        let body = json!({
            "buyer_address": lower(sale.buyer_address),
            "seller_address": null,
            "price": 0,
            "seaport_order": null,
            "order_hash": null,
            "on_chain": true,
            "updatedat": at,
        });

        let request = self
            .authed(self.client.patch(url))
            .header("Prefer", HeaderValue::from_static("return=representation"))
            .json(&body);
        let updated: Vec<Value> = check(request.send().await?).await?.json().await?;
        if updated.is_empty() {
            return Err(RepositoryError::NotFound(sale.tokenid));
        }
        Ok(())
    }
}

/// Addresses are stored lowercase.
fn lower(address: Address) -> String {
    format!("{address:#x}")
}

async fn check(response: Response) -> Result<Response, RepositoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: Value = response.json().await.unwrap_or_default();
    let message = body["message"].as_str().unwrap_or("request failed").to_owned();
    warn!(%status, %message, "store request failed");
    Err(RepositoryError::Store { status: status.as_u16(), message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_the_base_url() {
        let repo = PostgrestRepository::new(
            "https://abc.supabase.co/project".parse().unwrap(),
            "key".into(),
            MarketContracts::default(),
        );
        assert_eq!(
            repo.table().unwrap().as_str(),
            "https://abc.supabase.co/project/rest/v1/metadata"
        );
    }

    #[test]
    fn rows_are_lowercase() {
        let repo = PostgrestRepository::new(
            "https://abc.supabase.co".parse().unwrap(),
            "key".into(),
            MarketContracts {
                nft_contract: Some(Address::repeat_byte(0xab)),
                ..Default::default()
            },
        );
        let listing = NewListing {
            tokenid: "1".into(),
            price: rust_decimal::Decimal::ONE,
            seller_address: Address::repeat_byte(0xcd),
            seaport_order: json!({}),
            order_hash: Default::default(),
        };
        let row = repo.listing_row(&listing, Utc::now());
        assert_eq!(row["seller_address"], format!("0x{}", "cd".repeat(20)));
        assert_eq!(row["nft_contract"], format!("0x{}", "ab".repeat(20)));
        assert_eq!(row["marketplace_contract"], Value::Null);
        assert_eq!(row["on_chain"], false);
    }
}
