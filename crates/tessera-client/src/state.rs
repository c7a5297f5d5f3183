//! Serializable snapshots for cache persistence

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::manifest::Manifest;

/// A persisted snapshot of the service's cached authorization state.
///
/// Written with [`crate::Service::to_state`] and restored with
/// [`crate::Service::from_state`], so a process can come back up without
/// refetching the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceState {
    pub uri: String,
    pub artifact: String,
    pub schema: String,
    pub manifest: Manifest,
    pub user: HashMap<String, String>,
    pub account_id: Uuid,
}

/// The claims loaded for an account, suitable for caching as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub issuer: String,
    pub accountability: Uuid,
    pub display: String,
    /// Claim values keyed by fully-qualified name (issuer + claim key).
    pub claims: HashMap<String, String>,
}
