//! Builders for signed listings.
use alloy::primitives::{utils::parse_ether, U256};
use chrono::Utc;
use rust_decimal::Decimal;
use steptract_constants::{test_utils::TEST_MARKET, MarketConstants};
use steptract_types::{
    ListingRecord, NewListing, OrderParameters, SeaportOrder, SeaportSigner, TypedDataSigner,
};

/// Builder for signed test listings.
#[derive(Debug, Clone)]
pub struct TestOrderBuilder {
    constants: MarketConstants,
    token_id: u64,
    price: Decimal,
    window: Option<(u64, u64)>,
    counter: U256,
    salt: U256,
}

impl TestOrderBuilder {
    /// A listing of `token_id` for one native unit on [`TEST_MARKET`],
    /// valid for an hour around now.
    pub fn new(token_id: u64) -> Self {
        Self {
            constants: TEST_MARKET,
            token_id,
            price: Decimal::ONE,
            window: None,
            counter: U256::ZERO,
            salt: U256::from(token_id),
        }
    }

    /// Use the provided market constants.
    pub fn with_constants(mut self, constants: MarketConstants) -> Self {
        self.constants = constants;
        self
    }

    /// Set the price in whole native units.
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    /// Set the validity window.
    pub fn with_window(mut self, start: u64, end: u64) -> Self {
        self.window = Some((start, end));
        self
    }

    /// Set the Seaport counter.
    pub fn with_counter(mut self, counter: U256) -> Self {
        self.counter = counter;
        self
    }

    /// The unsigned order for `offerer`.
    pub fn parameters(&self, offerer: alloy::primitives::Address) -> OrderParameters {
        let now = Utc::now().timestamp() as u64;
        let (start, end) = self.window.unwrap_or((now - 60, now + 3600));
        let wei = parse_ether(&self.price.to_string()).unwrap();
        OrderParameters::native_listing(
            offerer,
            self.constants.collection(),
            U256::from(self.token_id),
            wei,
        )
        .with_window(start, end)
        .with_salt(self.salt)
        .with_conduit_key(self.constants.conduit_key())
        .with_counter(self.counter)
    }

    /// Sign the order.
    pub async fn sign<S: TypedDataSigner>(&self, signer: S) -> SeaportOrder {
        let parameters = self.parameters(signer.address());
        SeaportSigner::for_market(signer, &self.constants)
            .sign_order(parameters)
            .await
            .expect("signing should succeed with test signer")
    }

    /// Sign the order and wrap it in a listed store record.
    pub async fn listed_record<S: TypedDataSigner>(&self, signer: S) -> ListingRecord {
        let order = self.sign(signer).await;
        let listing = NewListing::from_order(&order, self.token_id.to_string(), self.price)
            .expect("signed orders serialize");
        let mut record = ListingRecord::new(self.token_id.to_string());
        record.apply_listing(&listing, Utc::now());
        record.nft_contract = Some(self.constants.collection());
        record.marketplace_contract = Some(self.constants.seaport());
        record
    }
}
