//! tessera-claims: bit-packed permission claims
//!
//! The claim codec used by the tessera authorization service: a claim is a
//! compact bit vector carrying a 32-bit schema version followed by
//! per-resource permission masks at schema-assigned positions. This crate
//! provides the write side ([`ClaimBits`]), the read side ([`Permissions`]),
//! and a concurrent registry of observed claim versions
//! ([`ClaimVersionRegistry`]) used for cache-invalidation decisions.
//!
//! ## Example
//!
//! ```rust
//! use tessera_claims::{ClaimBits, Permissions};
//!
//! // Grant rw- (mask 6) to the resource at bit 40, under schema version 3
//! let mut bits = ClaimBits::new(64);
//! bits.set_version(3);
//! bits.set_permissions(40, 6);
//!
//! let claim = Permissions::from_bytes(bits.as_bytes()).unwrap();
//! assert_eq!(claim.version(), 3);
//! assert!(claim.has_permissions(3, 40, 6));
//! assert!(!claim.has_permissions(3, 40, 1));
//! ```

mod bits;
mod error;
mod permissions;
mod registry;

pub use bits::{mask_width, ClaimBits, VERSION_BITS};
pub use error::{ClaimError, ClaimResult};
pub use permissions::Permissions;
pub use registry::{
    version_from_prefix, version_prefix, ClaimVersionRegistry, PermissionClaim, PREFIX_LEN,
};
