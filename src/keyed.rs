// src/keyed.rs

// one token bucket per key, e.g. per client or per upstream host

// dependencies
use crate::clock::{Clock, TokioClock};
use crate::config::LimiterConfig;
use crate::errors::LimiterError;
use crate::token_bucket::TokenBucketLimiter;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A set of independent token buckets sharing one configuration.
/// K is the type used to identify callers (e.g., String, u64, etc.).
/// C is the clock type, defaulting to TokioClock; each bucket gets a clone.
/// Buckets are created on first use and live in a `DashMap`.
#[derive(Debug)]
pub struct KeyedLimiter<K, C = TokioClock>
where
    K: Hash + Eq + Clone,
    C: Clock + Clone,
{
    config: LimiterConfig,
    buckets: DashMap<K, Arc<TokenBucketLimiter<C>>>,
    clock: C,
}

impl<K, C> KeyedLimiter<K, C>
where
    K: Hash + Eq + Clone,
    C: Clock + Clone,
{
    pub fn with_config(config: LimiterConfig, clock: C) -> Result<Self, LimiterError> {
        config.validate()?;
        Ok(Self {
            config,
            buckets: DashMap::new(),
            clock,
        })
    }

    pub fn rate(&self) -> f64 {
        self.config.rate_per_second
    }

    pub fn max_capacity(&self) -> f64 {
        self.config.max_capacity
    }

    /// Wait for a token from `key`'s bucket.
    /// Callers with different keys never wait on each other.
    pub async fn acquire(&self, key: K) -> Result<(), LimiterError> {
        let bucket = self.bucket(key);
        bucket.acquire().await
    }

    /// Take a token from `key`'s bucket if one is available right now.
    pub fn try_acquire(&self, key: K) -> bool {
        self.bucket(key).try_acquire()
    }

    /// Drop buckets that are unused and untouched for at least `max_idle`.
    /// Returns how many were removed.
    ///
    /// With `max_idle >= max_capacity / rate` a removed bucket had already
    /// refilled completely, so recreating it later changes nothing.
    pub fn cleanup_idle(&self, max_idle: Duration) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| {
            // another strong reference means a caller is between lookup and acquire
            Arc::strong_count(bucket) > 1 || !bucket.is_idle_for(max_idle)
        });
        let removed = before.saturating_sub(self.buckets.len());
        debug!(removed, remaining = self.buckets.len(), "cleaned up idle buckets");
        removed
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.buckets.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    // the map guard is released before returning, never held across an await
    fn bucket(&self, key: K) -> Arc<TokenBucketLimiter<C>> {
        if let Some(bucket) = self.buckets.get(&key) {
            return Arc::clone(bucket.value());
        }
        match self.buckets.entry(key) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                // config was validated in with_config
                let bucket = Arc::new(TokenBucketLimiter::from_validated(
                    &self.config,
                    self.clock.clone(),
                ));
                entry.insert(Arc::clone(&bucket));
                bucket
            }
        }
    }
}
