//! URL input validation.
//!
//! Runs before any network activity so user typos never leave the machine.

use thiserror::Error;

/// Schemes a URL must start with to be accepted.
pub const ACCEPTED_SCHEMES: [&str; 2] = ["http://", "https://"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("no URL supplied")]
    MissingInput,
    #[error("URL must start with http:// or https://: {0}")]
    MalformedScheme(String),
}

/// Check that `raw` is present and starts with an accepted scheme.
///
/// The input is returned unchanged on success; no trimming or normalisation happens here.
pub fn validate_url(raw: &str) -> Result<&str, InputError> {
    if raw.is_empty() {
        return Err(InputError::MissingInput);
    }

    if !ACCEPTED_SCHEMES.iter().any(|scheme| raw.starts_with(scheme)) {
        return Err(InputError::MalformedScheme(raw.to_string()));
    }

    Ok(raw)
}
