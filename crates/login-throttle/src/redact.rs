//! Identity redaction for log output
//!
//! Account identities are personal data, so log events carry only a masked
//! form. Source addresses are not redacted.

/// Mask an account identity, keeping only its first character
pub fn redact(identity: &str) -> String {
    match identity.chars().next() {
        Some(first) => format!("{first}***"),
        None => "***".to_string(),
    }
}
