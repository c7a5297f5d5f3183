//! Concurrent registry of observed claim versions

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dashmap::DashMap;

use crate::error::{ClaimError, ClaimResult};

/// Length of a claim version prefix: the first six base64 characters of the
/// little-endian version bytes, which is exactly the 32-bit version with no
/// padding spillover.
pub const PREFIX_LEN: usize = 6;

/// The version prefix a claim value carries when issued at `version`.
pub fn version_prefix(version: u32) -> String {
    let mut encoded = BASE64.encode(version.to_le_bytes());
    encoded.truncate(PREFIX_LEN);
    encoded
}

/// Recover the version encoded in a claim value prefix.
pub fn version_from_prefix(prefix: &str) -> ClaimResult<u32> {
    if prefix.len() != PREFIX_LEN {
        return Err(ClaimError::InvalidPrefix(prefix.to_string()));
    }
    let bytes = BASE64.decode(format!("{prefix}=="))?;
    let bytes: [u8; 4] = bytes
        .try_into()
        .map_err(|_| ClaimError::InvalidPrefix(prefix.to_string()))?;
    Ok(u32::from_le_bytes(bytes))
}

/// The versions observed for one permission claim.
///
/// `key` and `prefix` are fixed at registration; `versions` maps a claim
/// discriminator (the version prefix carried by an issued claim value) to
/// the version most recently recorded for it. Records are shared across
/// callers, so all version observations land in one place.
pub struct PermissionClaim {
    key: String,
    prefix: String,
    versions: DashMap<String, u32>,
}

impl PermissionClaim {
    fn new(key: &str, prefix: &str) -> Self {
        Self {
            key: key.to_string(),
            prefix: prefix.to_string(),
            versions: DashMap::new(),
        }
    }

    /// The claim key this record tracks.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The prefix of claim values issued at the currently loaded version.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether a claim value was issued at the currently loaded version.
    pub fn covers(&self, value: &str) -> bool {
        value.starts_with(&self.prefix)
    }

    /// Record the version observed for a discriminator. Unconditional
    /// last-write-wins; monotonicity is the caller's concern.
    pub fn record_version(&self, discriminator: &str, version: u32) {
        self.versions.insert(discriminator.to_string(), version);
    }

    /// The version most recently recorded for a discriminator, if any.
    pub fn version(&self, discriminator: &str) -> Option<u32> {
        self.versions.get(discriminator).map(|entry| *entry)
    }
}

impl std::fmt::Debug for PermissionClaim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionClaim")
            .field("key", &self.key)
            .field("prefix", &self.prefix)
            .field("versions", &self.versions.len())
            .finish()
    }
}

/// A concurrent index of claim version records, scoped by `(key, prefix)`.
///
/// Explicitly constructed and owned by the client context rather than held
/// in a process-wide static, so tests and embedders control its lifecycle.
/// Entries persist for the registry's lifetime; there is no eviction.
#[derive(Default)]
pub struct ClaimVersionRegistry {
    entries: DashMap<(String, String), Arc<PermissionClaim>>,
}

impl ClaimVersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared record for a key/prefix pair, creating it on first
    /// registration. Every caller for the same pair gets the same record.
    pub fn register(&self, key: &str, prefix: &str) -> Arc<PermissionClaim> {
        self.entries
            .entry((key.to_string(), prefix.to_string()))
            .or_insert_with(|| Arc::new(PermissionClaim::new(key, prefix)))
            .clone()
    }

    /// Look up an existing record without creating one.
    pub fn get(&self, key: &str, prefix: &str) -> Option<Arc<PermissionClaim>> {
        self.entries
            .get(&(key.to_string(), prefix.to_string()))
            .map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_returns_shared_record() {
        let registry = ClaimVersionRegistry::new();
        let a = registry.register("roles", "BwAAAA");
        let b = registry.register("roles", "BwAAAA");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_pairs_get_distinct_records() {
        let registry = ClaimVersionRegistry::new();
        let a = registry.register("roles", "BwAAAA");
        let b = registry.register("roles", "AQAAAA");
        let c = registry.register("scopes", "BwAAAA");
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_record_and_lookup() {
        let registry = ClaimVersionRegistry::new();
        let record = registry.register("roles", "BwAAAA");
        assert_eq!(record.version("AQAAAA"), None);
        record.record_version("AQAAAA", 1);
        assert_eq!(record.version("AQAAAA"), Some(1));
        // Last write wins, no ordering enforced
        record.record_version("AQAAAA", 9);
        record.record_version("AQAAAA", 4);
        assert_eq!(record.version("AQAAAA"), Some(4));
    }

    #[test]
    fn test_covers() {
        let record = PermissionClaim::new("roles", "BwAAAA");
        assert!(record.covers("BwAAAAEAAQ=="));
        assert!(!record.covers("AQAAAAEAAQ=="));
    }

    #[test]
    fn test_version_prefix_roundtrip() {
        for version in [0, 1, 7, 16_909_060, u32::MAX] {
            let prefix = version_prefix(version);
            assert_eq!(prefix.len(), PREFIX_LEN);
            assert_eq!(version_from_prefix(&prefix).unwrap(), version);
        }
    }

    #[test]
    fn test_known_prefixes() {
        assert_eq!(version_prefix(7), "BwAAAA");
        assert_eq!(version_prefix(1), "AQAAAA");
        assert_eq!(version_from_prefix("BwAAAA").unwrap(), 7);
    }

    #[test]
    fn test_bad_prefix_rejected() {
        assert!(matches!(
            version_from_prefix("short"),
            Err(ClaimError::InvalidPrefix(_))
        ));
        assert!(version_from_prefix("!!!!!!").is_err());
    }

    #[test]
    fn test_concurrent_writers_do_not_lose_updates() {
        let registry = Arc::new(ClaimVersionRegistry::new());
        let record = registry.register("roles", "BwAAAA");

        let writers: Vec<_> = (0..8u32)
            .map(|w| {
                let record = record.clone();
                std::thread::spawn(move || {
                    let discriminator = version_prefix(w % 2);
                    for round in 0..1_000u32 {
                        record.record_version(&discriminator, w * 10_000 + round);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        // Both discriminators retain a value written by some writer
        for d in [version_prefix(0), version_prefix(1)] {
            let v = record.version(&d).unwrap();
            assert_eq!(v % 10_000, 999);
        }
    }

    #[test]
    fn test_concurrent_registration_converges() {
        let registry = Arc::new(ClaimVersionRegistry::new());
        let records: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.register("roles", "BwAAAA"))
            })
            .map(|handle| handle.join().unwrap())
            .collect();
        for record in &records[1..] {
            assert!(Arc::ptr_eq(&records[0], record));
        }
    }
}
