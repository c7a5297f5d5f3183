//! Canonical signing string and header construction
//!
//! The wire format follows HTTP Signature-style authentication: the signed
//! text covers the request target, the Date header, and (when a body is
//! present) a SHA-256 body digest, newline-joined in that order.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Authorization header scheme.
pub const SIGNATURE_SCHEME: &str = "Signature";

/// The only algorithm this client emits.
pub const ALGORITHM: &str = "hmac-sha256";

/// The Digest header value for a request body: `sha-256=<base64(SHA-256(body))>`.
pub fn body_digest(body: &[u8]) -> String {
    format!("sha-256={}", BASE64.encode(Sha256::digest(body)))
}

/// Build the canonical signing string. The digest line appears only when a
/// body digest was computed, and must carry the exact transmitted value.
pub(crate) fn canonical_string(
    method: &str,
    target: &str,
    date: &str,
    digest: Option<&str>,
) -> String {
    let mut canonical = format!(
        "(request-target): {} {}\ndate: {}",
        method.to_lowercase(),
        target,
        date
    );
    if let Some(digest) = digest {
        canonical.push_str("\ndigest: ");
        canonical.push_str(digest);
    }
    canonical
}

/// HMAC-SHA256 over the canonical string, base64-encoded.
pub(crate) fn hmac_base64(secret: &[u8], message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(message.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Assemble the Authorization header value, scheme included.
pub(crate) fn authorization_header(key_id: &str, with_digest: bool, signature: &str) -> String {
    let headers = if with_digest {
        "(request-target) date digest"
    } else {
        "(request-target) date"
    };
    format!(
        "{SIGNATURE_SCHEME} keyId=\"{}\",algorithm=\"{ALGORITHM}\",headers=\"{headers}\",signature=\"{signature}\"",
        urlencoding::encode(key_id),
    )
}
