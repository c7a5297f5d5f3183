//! Signing error types

use thiserror::Error;

pub type SigningResult<T> = Result<T, SigningError>;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Key id must not be empty")]
    EmptyKeyId,

    #[error("Signing secret must not be empty")]
    EmptySecret,

    #[error("Signing secret is not valid base64: {0}")]
    SecretEncoding(#[from] base64::DecodeError),

    #[error("Request body is streaming; only buffered bodies can be signed")]
    StreamingBody,

    #[error("Date header is not valid ASCII")]
    InvalidDateHeader,

    #[error("Signed header value rejected: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
