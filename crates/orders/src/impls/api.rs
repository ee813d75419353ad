use crate::ListingStore;
use steptract_api::{ApiError, MarketApi};
use steptract_types::{ListingRecord, NewListing, Sale};

impl ListingStore for MarketApi {
    type Error = ApiError;

    async fn fetch_listings(&self) -> Result<Vec<ListingRecord>, Self::Error> {
        self.get_nfts().await
    }

    async fn upsert_listings(&self, listings: Vec<NewListing>) -> Result<(), Self::Error> {
        self.post_orders(listings).await
    }

    async fn record_sale(&self, sale: Sale) -> Result<(), Self::Error> {
        self.post_buy(&sale).await
    }
}
