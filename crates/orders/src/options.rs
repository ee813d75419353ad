use core::time::Duration;

/// Default validity of a listing: 30 days.
const DEFAULT_VALIDITY_SECS: u64 = 30 * 24 * 60 * 60;

/// Default bound on a single store or RPC round trip.
const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on waiting for a transaction to be mined.
const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Options for configuring the [`Lister`](crate::Lister).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOptions {
    /// Seconds between an order's start time and its end time.
    validity_secs: u64,
    /// Seconds subtracted from the current time to get the start time.
    backdate_secs: u64,
    /// Bound on each store call and permission check.
    network_timeout: Duration,
    /// Bound on waiting for the approval transaction.
    confirmation_timeout: Duration,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingOptions {
    /// Create a new [`ListingOptions`] with default values.
    pub const fn new() -> Self {
        Self {
            validity_secs: DEFAULT_VALIDITY_SECS,
            backdate_secs: 0,
            network_timeout: DEFAULT_NETWORK_TIMEOUT,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    /// Set the validity window.
    pub const fn with_validity_secs(mut self, secs: u64) -> Self {
        self.validity_secs = secs;
        self
    }

    /// Set the start time backdate.
    pub const fn with_backdate_secs(mut self, secs: u64) -> Self {
        self.backdate_secs = secs;
        self
    }

    /// Set the network timeout.
    pub const fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout = timeout;
        self
    }

    /// Set the confirmation timeout.
    pub const fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Seconds between an order's start time and its end time.
    pub const fn validity_secs(&self) -> u64 {
        self.validity_secs
    }

    /// Seconds subtracted from the current time to get the start time.
    pub const fn backdate_secs(&self) -> u64 {
        self.backdate_secs
    }

    /// Bound on each store call and permission check.
    pub const fn network_timeout(&self) -> Duration {
        self.network_timeout
    }

    /// Bound on waiting for the approval transaction.
    pub const fn confirmation_timeout(&self) -> Duration {
        self.confirmation_timeout
    }

    /// The `(start, end)` window of an order created at `now`.
    pub const fn window(&self, now: u64) -> (u64, u64) {
        let start = now.saturating_sub(self.backdate_secs);
        (start, start.saturating_add(self.validity_secs))
    }
}

/// Options for configuring the [`Fulfiller`](crate::Fulfiller).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfillmentOptions {
    /// Gas limit as a percentage of the estimate. Clamped to 120..=140.
    gas_multiplier_percent: u64,
    /// Gas limit used when estimation fails.
    fallback_gas_limit: u64,
    /// Bound on each store call and gas estimate.
    network_timeout: Duration,
    /// Bound on waiting for the settlement transaction.
    confirmation_timeout: Duration,
}

impl Default for FulfillmentOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl FulfillmentOptions {
    /// Lowest accepted gas multiplier.
    pub const MIN_GAS_MULTIPLIER_PERCENT: u64 = 120;
    /// Highest accepted gas multiplier.
    pub const MAX_GAS_MULTIPLIER_PERCENT: u64 = 140;

    /// Create a new [`FulfillmentOptions`] with default values.
    pub const fn new() -> Self {
        Self {
            gas_multiplier_percent: 130,
            fallback_gas_limit: 1_000_000,
            network_timeout: DEFAULT_NETWORK_TIMEOUT,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    /// Set the gas multiplier, clamped to the accepted range.
    pub const fn with_gas_multiplier_percent(mut self, percent: u64) -> Self {
        self.gas_multiplier_percent = if percent < Self::MIN_GAS_MULTIPLIER_PERCENT {
            Self::MIN_GAS_MULTIPLIER_PERCENT
        } else if percent > Self::MAX_GAS_MULTIPLIER_PERCENT {
            Self::MAX_GAS_MULTIPLIER_PERCENT
        } else {
            percent
        };
        self
    }

    /// Set the fallback gas limit.
    pub const fn with_fallback_gas_limit(mut self, gas: u64) -> Self {
        self.fallback_gas_limit = gas;
        self
    }

    /// Set the network timeout.
    pub const fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout = timeout;
        self
    }

    /// Set the confirmation timeout.
    pub const fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Gas limit as a percentage of the estimate.
    pub const fn gas_multiplier_percent(&self) -> u64 {
        self.gas_multiplier_percent
    }

    /// Gas limit used when estimation fails.
    pub const fn fallback_gas_limit(&self) -> u64 {
        self.fallback_gas_limit
    }

    /// Bound on each store call and gas estimate.
    pub const fn network_timeout(&self) -> Duration {
        self.network_timeout
    }

    /// Bound on waiting for the settlement transaction.
    pub const fn confirmation_timeout(&self) -> Duration {
        self.confirmation_timeout
    }
}
