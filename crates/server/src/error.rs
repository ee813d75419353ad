use crate::RepositoryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use steptract_api::types::ErrorResponse;
use tracing::warn;

/// A failed request, rendered as `{ "error": ".." }` with a matching status.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The request body is missing data or could not be parsed.
    #[error("{0}")]
    BadRequest(String),
    /// The repository failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServerError {
    /// A 400 with `message`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// The response status.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(%status, error = %self, "request failed");
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
