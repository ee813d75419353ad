use crate::ParseChainError;

/// Error type for loading [`MarketConstants`] from the environment.
///
/// [`MarketConstants`]: crate::MarketConstants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset, empty, or not unicode.
    #[error("environment variable {0} is not set")]
    Missing(String),
    /// A variable is set but its value could not be parsed.
    #[error("environment variable {key} is invalid: {reason}")]
    Invalid {
        /// The variable name.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// `MARKET_CHAIN` names no preset.
    #[error(transparent)]
    Chain(#[from] ParseChainError),
}

impl ConfigError {
    /// `key` is not set.
    pub fn missing(key: &str) -> Self {
        Self::Missing(key.to_owned())
    }

    /// `key` holds a value that failed to parse with `reason`.
    pub fn invalid(key: &str, reason: impl ToString) -> Self {
        Self::Invalid { key: key.to_owned(), reason: reason.to_string() }
    }
}
