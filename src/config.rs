// src/config.rs

//! Configuration types for the token bucket limiter

// dependencies
use crate::errors::ConfigError;

/// Default refill rate: one token per minute.
pub const DEFAULT_RATE: f64 = 1.0 / 60.0;

/// Default bucket size.
pub const DEFAULT_MAX_CAPACITY: f64 = 1.0;

/// Configuration for limiter behavior
#[derive(Debug, Clone, PartialEq)]
pub struct LimiterConfig {
    pub(crate) max_capacity: f64,
    pub(crate) rate_per_second: f64,
}

impl LimiterConfig {
    /// Create a new configuration with capacity and rate settings
    pub fn new(max_capacity: f64, rate_per_second: f64) -> Self {
        Self {
            max_capacity,
            rate_per_second,
        }
    }

    /// Builder-style: set the bucket size
    pub fn max_capacity(mut self, max_capacity: f64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Builder-style: set tokens added per second
    pub fn rate(mut self, rate_per_second: f64) -> Self {
        self.rate_per_second = rate_per_second;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // is_finite also rejects NaN
        if !self.rate_per_second.is_finite() || self.rate_per_second <= 0.0 {
            return Err(ConfigError::InvalidRate(self.rate_per_second));
        }
        if !self.max_capacity.is_finite() || self.max_capacity < 1.0 {
            return Err(ConfigError::InvalidCapacity(self.max_capacity));
        }
        Ok(())
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAPACITY, DEFAULT_RATE)
    }
}
