//! Error types for the throttling engine

use thiserror::Error;

/// Errors that can occur in the throttling engine
#[derive(Error, Debug)]
pub enum ThrottleError {
    /// An operation received an empty identity key. Empty keys are a caller
    /// programming error: coercing them into a shared bucket would merge
    /// unrelated identities' failure histories.
    #[error("identity key must not be empty")]
    InvalidKey,
}
