//! Deterministic request signing

use crate::canonical::{authorization_header, body_digest, canonical_string, hmac_base64};
use crate::credentials::Credentials;

/// The headers a signed request must carry.
///
/// `date` and `digest` hold exactly the values that were signed; attaching
/// different ones would invalidate the signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedHeaders {
    /// The Date header value covered by the signature.
    pub date: String,
    /// The Digest header value, present iff the request has a body.
    pub digest: Option<String>,
    /// The full Authorization header value, `Signature` scheme included.
    pub authorization: String,
}

/// Signs outgoing requests with a shared HMAC-SHA256 secret.
///
/// Signing is pure computation: for a fixed method, target, date, body and
/// credentials the output is byte-identical on every call.
pub struct RequestSigner {
    credentials: Credentials,
}

impl RequestSigner {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn key_id(&self) -> &str {
        self.credentials.key_id()
    }

    /// Sign one request. `target` is the path plus query exactly as it will
    /// go on the wire; `date` is the Date header value that will be sent.
    pub fn sign(&self, method: &str, target: &str, date: &str, body: Option<&[u8]>) -> SignedHeaders {
        let digest = body.map(body_digest);
        let canonical = canonical_string(method, target, date, digest.as_deref());
        let signature = hmac_base64(self.credentials.secret(), &canonical);
        tracing::trace!(method, target, signed_digest = digest.is_some(), "signed request");
        SignedHeaders {
            date: date.to_string(),
            digest,
            authorization: authorization_header(
                self.credentials.key_id(),
                body.is_some(),
                &signature,
            ),
        }
    }
}
