use serde::{Deserialize, Serialize};
use steptract_types::{ListingRecord, NewListing};

/// Body of `GET /api/nfts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftsResponse {
    /// Every record, ordered by token id.
    pub nfts: Vec<ListingRecord>,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersRequest {
    /// Listings to upsert together.
    pub orders: Vec<NewListing>,
}

/// Body of a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Always true.
    pub success: bool,
}

impl SuccessResponse {
    /// The success body.
    pub const OK: Self = Self { success: true };
}

/// Body of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable description of the failure.
    #[serde(alias = "message")]
    pub error: String,
}

impl ErrorResponse {
    /// Create an error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
