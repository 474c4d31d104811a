//! Throttling policy configuration

use std::env;
use std::time::Duration;

/// Failure count above which an address must pass a CAPTCHA
pub const DEFAULT_CAPTCHA_THRESHOLD: u32 = 5;

/// Nominal cooldown added per recorded failure, in milliseconds
pub const DEFAULT_BACKOFF_MS: u64 = 2000;

/// Throttling policy, fixed at construction time
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Failure counts strictly above this require a CAPTCHA
    pub captcha_threshold: u32,

    /// Nominal cooldown added per recorded failure
    pub backoff_per_failure: Duration,

    /// Ceiling on the nominal cooldown; `None` leaves escalation uncapped
    pub max_backoff: Option<Duration>,
}

impl ThrottleConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        Self {
            captcha_threshold: env::var("LOGIN_THROTTLE_CAPTCHA_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CAPTCHA_THRESHOLD),

            backoff_per_failure: env::var("LOGIN_THROTTLE_BACKOFF_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_millis(DEFAULT_BACKOFF_MS)),

            max_backoff: env::var("LOGIN_THROTTLE_MAX_BACKOFF_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            captcha_threshold: DEFAULT_CAPTCHA_THRESHOLD,
            backoff_per_failure: Duration::from_millis(DEFAULT_BACKOFF_MS),
            max_backoff: None,
        }
    }
}
