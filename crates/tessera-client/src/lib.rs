//! tessera-client: high-level client for the tessera authorization service
//!
//! Builds on [`tessera_signing`] for authenticated transport and
//! [`tessera_claims`] for the claim codec. The [`Service`] object caches
//! everything derived from one schema manifest (masks, resource positions,
//! system permission sets) and evaluates access; a [`Session`] scopes that
//! evaluation to one principal's claims; the [`ApiClient`] talks to the
//! manifest, profile and permissions endpoints.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tessera_client::{ApiClient, Service};
//! use tessera_signing::{Credentials, SigningClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::from_base64("svc-1", "AAAAAAAAAAAAAAAAAAAAAA==")?;
//! let api = ApiClient::new(SigningClient::new(credentials), "https://api.tessera.dev");
//!
//! let manifest = api
//!     .fetch_manifest("ledger-api", "1.0")
//!     .await?
//!     .ok_or("no matching artifact version")?;
//! let service = Service::from_manifest(
//!     "https://api.tessera.dev",
//!     "ledger-api",
//!     "1.0",
//!     Default::default(),
//!     manifest,
//! );
//!
//! let profile = api.load_account(&service, service.account_id()).await?;
//! let session = service.session(Some(profile.claims));
//! if session.has_permissions("ledger", "accounts", "read") {
//!     // proceed
//! }
//! # Ok(())
//! # }
//! ```

mod api;
mod error;
mod manifest;
mod service;
mod session;
mod state;

pub use api::{ApiClient, Assertion, PermissionEntry, Profile};
pub use error::{ClientError, ClientResult};
pub use manifest::{AccessMask, Manifest, ResourceGrant, ServiceGrant};
pub use service::{Registration, Service, ServiceRegistration};
pub use session::Session;
pub use state::{ClaimResponse, ServiceState};
