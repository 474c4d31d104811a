//! Failed-login tracking and admission delay for authentication endpoints

use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::ThrottleConfig;
use crate::error::ThrottleError;
use crate::redact::redact;

/// Failure entry for a single key. An entry exists only for keys with at
/// least one recorded failure, so the count and timestamp are always
/// present together.
#[derive(Debug, Clone)]
struct FailureEntry {
    count: u32,
    last_attempt: Instant,
}

/// One throttling table, keyed by identity string
#[derive(Debug, Default)]
struct AttemptTable {
    entries: DashMap<String, FailureEntry>,
}

impl AttemptTable {
    /// Increment the failure count and refresh the timestamp in one
    /// per-key critical section. The entry guard holds the shard write
    /// lock, so concurrent callers never lose an increment and never
    /// observe a count without its paired timestamp.
    fn record(&self, key: &str) -> u32 {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(FailureEntry {
                count: 0,
                last_attempt: now,
            });
        entry.count += 1;
        entry.last_attempt = now;
        entry.count
    }

    /// Remaining cooldown for a key; zero for keys with no failures.
    ///
    /// The nominal cooldown grows by `backoff_per_failure` with every
    /// recorded failure (clamped to `max_backoff` when configured), and
    /// the remaining wait counts down from the most recent failure.
    fn delay(&self, key: &str, config: &ThrottleConfig) -> Duration {
        let Some(entry) = self.entries.get(key) else {
            return Duration::ZERO;
        };

        let mut nominal = config
            .backoff_per_failure
            .checked_mul(entry.count)
            .unwrap_or(Duration::MAX);
        if let Some(cap) = config.max_backoff {
            nominal = nominal.min(cap);
        }

        nominal.saturating_sub(entry.last_attempt.elapsed())
    }

    fn count(&self, key: &str) -> u32 {
        self.entries.get(key).map_or(0, |entry| entry.count)
    }

    /// Remove the entry whole. Idempotent: unknown keys are a no-op.
    fn reset(&self, key: &str) {
        self.entries.remove(key);
    }

    fn counts(&self) -> HashMap<String, u32> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().count))
            .collect()
    }
}

/// Point-in-time view of both tables for diagnostics/admin display
#[derive(Debug, Clone, Serialize)]
pub struct ThrottleSnapshot {
    /// Failure counts keyed by account identity
    pub accounts: HashMap<String, u32>,
    /// Failure counts keyed by source address
    pub addresses: HashMap<String, u32>,
}

/// Tracks failed login attempts and computes admission delays.
///
/// Two independent tables: one keyed by account identity, one by source
/// network address. Account throttling slows credential guessing against a
/// single user; address throttling slows a single source hammering many
/// accounts and additionally gates the CAPTCHA requirement. A caller
/// enforcing both policies takes the larger of the two delays rather than
/// their sum, and consults `requires_captcha` for the address only.
///
/// The caller queries the delay before attempting verification, records a
/// failure after a rejected attempt, and resets on success. Recording into
/// the account and address tables are separate, explicit calls: the engine
/// never mirrors a failure from one dimension into the other.
pub struct ThrottleTracker {
    config: ThrottleConfig,
    accounts: AttemptTable,
    addresses: AttemptTable,
}

impl ThrottleTracker {
    /// Create a tracker with the given policy
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            accounts: AttemptTable::default(),
            addresses: AttemptTable::default(),
        }
    }

    /// Record a failed attempt against an account identity and return the
    /// updated failure count
    pub fn record_account_failure(&self, account: &str) -> Result<u32, ThrottleError> {
        validate_key(account)?;

        let count = self.accounts.record(account);
        debug!(
            account = %redact(account),
            failures = count,
            "Recorded failed login attempt for account"
        );
        Ok(count)
    }

    /// Record a failed attempt against a source address and return the
    /// updated failure count
    pub fn record_address_failure(&self, address: &str) -> Result<u32, ThrottleError> {
        validate_key(address)?;

        let count = self.addresses.record(address);
        if count == self.config.captcha_threshold.saturating_add(1) {
            warn!(
                address = %address,
                failures = count,
                "Address crossed CAPTCHA threshold"
            );
        } else {
            debug!(
                address = %address,
                failures = count,
                "Recorded failed login attempt for address"
            );
        }
        Ok(count)
    }

    /// Remaining wait before the next attempt for an account is permitted;
    /// zero if the account has no recorded failures
    pub fn account_delay(&self, account: &str) -> Result<Duration, ThrottleError> {
        validate_key(account)?;
        Ok(self.accounts.delay(account, &self.config))
    }

    /// Remaining wait before the next attempt from an address is permitted;
    /// zero if the address has no recorded failures
    pub fn address_delay(&self, address: &str) -> Result<Duration, ThrottleError> {
        validate_key(address)?;
        Ok(self.addresses.delay(address, &self.config))
    }

    /// Whether attempts from this address must pass a CAPTCHA: true iff
    /// its failure count strictly exceeds the configured threshold
    pub fn requires_captcha(&self, address: &str) -> Result<bool, ThrottleError> {
        validate_key(address)?;
        Ok(self.addresses.count(address) > self.config.captcha_threshold)
    }

    /// Clear the failure history for an account (e.g. after successful
    /// login). Resetting an unknown account is a no-op.
    pub fn reset_account(&self, account: &str) -> Result<(), ThrottleError> {
        validate_key(account)?;

        self.accounts.reset(account);
        debug!(account = %redact(account), "Cleared failed login state for account");
        Ok(())
    }

    /// Clear the failure history for an address. Resetting an unknown
    /// address is a no-op.
    pub fn reset_address(&self, address: &str) -> Result<(), ThrottleError> {
        validate_key(address)?;

        self.addresses.reset(address);
        debug!(address = %address, "Cleared failed login state for address");
        Ok(())
    }

    /// Snapshot of the account-keyed failure counts. Not a live view:
    /// there is no freshness guarantee beyond the moment of the call.
    pub fn account_failure_counts(&self) -> HashMap<String, u32> {
        self.accounts.counts()
    }

    /// Snapshot of the address-keyed failure counts
    pub fn address_failure_counts(&self) -> HashMap<String, u32> {
        self.addresses.counts()
    }

    /// Snapshot of both tables for diagnostics display
    pub fn snapshot(&self) -> ThrottleSnapshot {
        ThrottleSnapshot {
            accounts: self.accounts.counts(),
            addresses: self.addresses.counts(),
        }
    }

    /// Get the current configuration
    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }
}

impl Default for ThrottleTracker {
    fn default() -> Self {
        Self::new(ThrottleConfig::default())
    }
}

fn validate_key(key: &str) -> Result<(), ThrottleError> {
    if key.is_empty() {
        return Err(ThrottleError::InvalidKey);
    }
    Ok(())
}
