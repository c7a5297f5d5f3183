//! Claim codec error types

use thiserror::Error;

pub type ClaimResult<T> = Result<T, ClaimError>;

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Claim payload too short: {0} bytes, need at least 4")]
    Truncated(usize),

    #[error("Invalid version prefix: {0}")]
    InvalidPrefix(String),

    #[error("Base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
}
