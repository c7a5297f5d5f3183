//! Authorization schema manifest
//!
//! The manifest describes one artifact version of the authorization schema:
//! the named access levels and their masks, and for each service the claim
//! it is granted under plus the bit position and mask of every resource.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named access level and the permission mask it requires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessMask {
    pub key: String,
    pub mask: u32,
}

/// The claim layout for one resource within a service grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGrant {
    pub name: String,
    pub resource_id: Uuid,
    /// Bit offset of this resource's permission bits within the claim.
    pub position: usize,
    /// Mask of permission bits grantable for this resource.
    pub mask: u32,
    /// Subset of `mask` reserved for privileged principals.
    pub restricted: u32,
}

/// One service's permission claim within the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceGrant {
    pub name: String,
    pub authority: String,
    pub claim: String,
    /// Claim naming the primary subject, when the service requires one.
    pub subject: Option<String>,
    /// Claim naming the tenant, when the service is multi-tenanted.
    pub tenant: Option<String>,
    /// Schema version these positions and masks were assigned against.
    pub version: u32,
    /// Bit high-water mark: the claim vector length for this service.
    pub hwm: usize,
    pub permissions: Vec<ResourceGrant>,
}

/// The full authorization schema for one artifact version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub authority: String,
    pub account_id: Uuid,
    pub permissions: Vec<AccessMask>,
    pub services: Vec<ServiceGrant>,
}
