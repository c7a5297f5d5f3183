//! Signing identity: key id plus shared HMAC secret

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroizing;

use crate::error::{SigningError, SigningResult};

/// The identity a client signs requests with.
///
/// Held for the lifetime of the HTTP handler and shared read-only across
/// concurrent signing calls. The secret is zeroized on drop and redacted
/// from `Debug`; it is never serialized or logged.
#[derive(Clone)]
pub struct Credentials {
    key_id: String,
    secret: Zeroizing<Vec<u8>>,
}

impl Credentials {
    /// Build credentials from a raw secret. An empty key id or secret is a
    /// configuration error and is rejected here rather than at sign time.
    pub fn new(key_id: impl Into<String>, secret: Vec<u8>) -> SigningResult<Self> {
        let key_id = key_id.into();
        if key_id.is_empty() {
            return Err(SigningError::EmptyKeyId);
        }
        if secret.is_empty() {
            return Err(SigningError::EmptySecret);
        }
        Ok(Self {
            key_id,
            secret: Zeroizing::new(secret),
        })
    }

    /// Build credentials from a base64-encoded secret, the form issued by
    /// the service console.
    pub fn from_base64(key_id: impl Into<String>, secret: &str) -> SigningResult<Self> {
        Self::new(key_id, BASE64.decode(secret)?)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
