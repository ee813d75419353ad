use reqwest::StatusCode;

/// Errors returned by the [`MarketApi`] client.
///
/// [`MarketApi`]: crate::client::MarketApi
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The backend rejected the request body.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The backend failed to complete the request.
    #[error("server error: {0}")]
    Server(String),
    /// Any other non-success status.
    #[error("unexpected status {status}: {message}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The error message from the body, or the status reason.
        message: String,
    },

    /// An error occurred while parsing the URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// An error occurred while contacting the backend.
    #[error("error contacting listing API: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl ApiError {
    /// Map a non-success status and its error message.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::BadRequest(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            status if status.is_server_error() => Self::Server(message),
            status => Self::Status { status: status.as_u16(), message },
        }
    }

    /// True if the backend reported a missing record.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_statuses() {
        let msg = || "boom".to_owned();
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, msg()),
            ApiError::BadRequest(_)
        ));
        assert!(ApiError::from_status(StatusCode::NOT_FOUND, msg()).is_not_found());
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, msg()),
            ApiError::Server(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::CONFLICT, msg()),
            ApiError::Status { status: 409, .. }
        ));
    }
}
