//! tessera-signing: authenticated requests for the tessera API
//!
//! Every API call is authenticated with an HTTP Signature-style
//! Authorization header: an HMAC-SHA256 over the request target, the Date
//! header, and a SHA-256 body digest when a body is present. This crate
//! holds the signing identity ([`Credentials`]), the deterministic signer
//! ([`RequestSigner`]), and a [`SigningClient`] that signs and forwards
//! requests over a wrapped `reqwest::Client`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tessera_signing::{Credentials, SigningClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::from_base64("svc-1", "AAAAAAAAAAAAAAAAAAAAAA==")?;
//! let client = SigningClient::new(credentials);
//!
//! let response = client
//!     .send(client.http().get("https://api.tessera.dev/accounts"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod canonical;
mod client;
mod credentials;
mod error;
mod signer;

pub use canonical::{body_digest, ALGORITHM, SIGNATURE_SCHEME};
pub use client::{imf_fixdate, SigningClient};
pub use credentials::Credentials;
pub use error::{SigningError, SigningResult};
pub use signer::{RequestSigner, SignedHeaders};
