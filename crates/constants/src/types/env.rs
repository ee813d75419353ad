//! Helpers for loading configuration values from the environment.
//!
//! Empty values count as unset. Set values that fail to parse are errors
//! naming the variable.

use crate::ConfigError;
use alloy::primitives::{Address, B256};
use std::{env, str::FromStr};

/// Load a variable, treating empty values as unset.
pub fn load_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

/// Load a required variable.
pub fn load_string(key: &str) -> Result<String, ConfigError> {
    load_string_opt(key).ok_or_else(|| ConfigError::missing(key))
}

/// Load and parse an optional variable.
pub fn load_parsed_opt<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    load_string_opt(key)
        .map(|v| v.parse::<T>().map_err(|e| ConfigError::invalid(key, e)))
        .transpose()
}

/// Load an optional integer.
pub fn load_u64_opt(key: &str) -> Result<Option<u64>, ConfigError> {
    load_parsed_opt(key)
}

/// Load an optional address.
pub fn load_address_opt(key: &str) -> Result<Option<Address>, ConfigError> {
    load_parsed_opt(key)
}

/// Load an optional 32-byte value.
pub fn load_b256_opt(key: &str) -> Result<Option<B256>, ConfigError> {
    load_parsed_opt(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_and_invalid_values() {
        assert_eq!(load_u64_opt("STEPTRACT_TEST_UNSET_CHAIN_ID"), Ok(None));
        assert_eq!(
            load_string("STEPTRACT_TEST_UNSET_CHAIN_ID"),
            Err(ConfigError::missing("STEPTRACT_TEST_UNSET_CHAIN_ID"))
        );
        assert!(matches!(
            load_parsed_opt::<u64>("PATH"),
            Err(ConfigError::Invalid { key, .. }) if key == "PATH"
        ));
    }
}
