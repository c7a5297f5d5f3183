//! Cached authorization state and access evaluation

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tessera_claims::{version_prefix, ClaimBits, ClaimVersionRegistry, PermissionClaim, Permissions};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::manifest::Manifest;
use crate::session::Session;
use crate::state::ServiceState;

/// Where one resource's permission bits live for one schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub resource_id: Uuid,
    pub version: u32,
    pub position: usize,
    pub mask: u32,
}

/// A service's claim and its resources, as registered in the schema.
#[derive(Debug, Clone)]
pub struct ServiceRegistration {
    pub name: String,
    /// Fully-qualified claim name (authority + claim key).
    pub claim: String,
    /// Resource identifiers by resource name.
    pub resources: HashMap<String, Uuid>,
    /// Fully-qualified subject claim, when the service requires one.
    pub subject: Option<String>,
    /// Fully-qualified tenant claim, when the service is multi-tenanted.
    pub tenant: Option<String>,
}

/// The main client-side service object: all cached state derived from the
/// authorization schema manifest.
///
/// Everything except the registration index is immutable after
/// construction; the index grows as older claim versions are lazily loaded.
pub struct Service {
    uri: String,
    artifact: String,
    schema: String,
    authority: String,
    account_id: Uuid,
    user: HashMap<String, String>,
    manifest: Manifest,
    masks: HashMap<String, u32>,
    services: HashMap<String, ServiceRegistration>,
    claims: HashMap<String, Arc<PermissionClaim>>,
    permissions: HashMap<String, Permissions>,
    restricted: HashMap<String, Permissions>,
    registrations: DashMap<(Uuid, u32), Registration>,
    registry: ClaimVersionRegistry,
}

impl Service {
    /// Build the cached state for one schema manifest.
    pub fn from_manifest(
        uri: impl Into<String>,
        artifact: impl Into<String>,
        schema: impl Into<String>,
        user: HashMap<String, String>,
        manifest: Manifest,
    ) -> Self {
        let registry = ClaimVersionRegistry::new();
        let registrations = DashMap::new();
        let mut masks = HashMap::new();
        let mut services = HashMap::new();
        let mut claims = HashMap::new();
        let mut permissions = HashMap::new();
        let mut restricted = HashMap::new();

        for access in &manifest.permissions {
            masks.insert(access.key.clone(), access.mask);
        }

        for grant in &manifest.services {
            let len = grant.hwm.max(32);
            let mut system = ClaimBits::new(len);
            system.set_version(grant.version);
            let mut worker = ClaimBits::new(len);
            worker.set_version(grant.version);

            let mut resources = HashMap::with_capacity(grant.permissions.len());
            let mut include = false;
            for child in &grant.permissions {
                resources.insert(child.name.clone(), child.resource_id);
                system.set_permissions(child.position, child.mask);
                // The unrestricted subset of this resource's mask
                let mask = child.mask & (child.mask ^ child.restricted);
                if mask > 0 {
                    include = true;
                    worker.set_permissions(child.position, mask);
                }
                registrations.insert(
                    (child.resource_id, grant.version),
                    Registration {
                        resource_id: child.resource_id,
                        version: grant.version,
                        position: child.position,
                        mask: child.mask,
                    },
                );
            }

            let key = format!("{}{}", grant.authority, grant.claim);
            services.insert(
                grant.name.clone(),
                ServiceRegistration {
                    name: grant.name.clone(),
                    claim: key.clone(),
                    resources,
                    subject: grant
                        .subject
                        .as_ref()
                        .map(|s| format!("{}{}", grant.authority, s)),
                    tenant: grant
                        .tenant
                        .as_ref()
                        .map(|t| format!("{}{}", grant.authority, t)),
                },
            );

            let prefix = version_prefix(grant.version);
            claims.insert(key.clone(), registry.register(&grant.claim, &prefix));
            permissions.insert(key.clone(), Permissions::new(grant.version, system));
            if include {
                restricted.insert(key, Permissions::new(grant.version, worker));
            }
        }

        tracing::debug!(
            services = services.len(),
            claims = claims.len(),
            "loaded authorization schema"
        );

        Self {
            uri: uri.into(),
            artifact: artifact.into(),
            schema: schema.into(),
            authority: manifest.authority.clone(),
            account_id: manifest.account_id,
            user,
            manifest,
            masks,
            services,
            claims,
            permissions,
            restricted,
            registrations,
            registry,
        }
    }

    /// Restore a service from a persisted snapshot, rejecting snapshots
    /// taken for a different artifact or schema version.
    pub fn from_state(state: ServiceState, artifact: &str, schema: &str) -> ClientResult<Self> {
        if state.artifact != artifact || state.schema != schema {
            return Err(ClientError::StateMismatch {
                expected: format!("{artifact}@{schema}"),
                found: format!("{}@{}", state.artifact, state.schema),
            });
        }
        Ok(Self::from_manifest(
            state.uri,
            state.artifact,
            state.schema,
            state.user,
            state.manifest,
        ))
    }

    /// Snapshot the current state for persistence.
    pub fn to_state(&self) -> ServiceState {
        ServiceState {
            uri: self.uri.clone(),
            artifact: self.artifact.clone(),
            schema: self.schema.clone(),
            manifest: self.manifest.clone(),
            user: self.user.clone(),
            account_id: self.account_id,
        }
    }

    /// Evaluate access to a resource for a permissions claim.
    ///
    /// The access name resolves to a mask, the resource and claim version
    /// resolve to a registration, and the claim must grant every bit of the
    /// mask at the registered position. Unknown access names, unregistered
    /// resources and version mismatches all deny.
    pub fn check_access(&self, permissions: &Permissions, access: &str, resource_id: Uuid) -> bool {
        let Some(mask) = self.masks.get(access).copied() else {
            return false;
        };
        let Some(registration) = self
            .registrations
            .get(&(resource_id, permissions.version()))
            .map(|entry| *entry)
        else {
            return false;
        };
        if registration.mask & mask != mask {
            return false;
        }
        mask == 0 || permissions.has_permissions(registration.version, registration.position, mask)
    }

    /// Create an authorization session for a principal's claims. The map
    /// holds claim values keyed by fully-qualified name, as produced by an
    /// account load.
    pub fn session(&self, principal: Option<HashMap<String, String>>) -> Session<'_> {
        Session::new(self, principal)
    }

    /// Record a registration discovered by a lazy claim-version load.
    pub fn record_registration(&self, registration: Registration) {
        self.registrations
            .insert((registration.resource_id, registration.version), registration);
    }

    /// The issuing authority.
    pub fn issuer(&self) -> &str {
        &self.authority
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    /// The system user's claims.
    pub fn user(&self) -> &HashMap<String, String> {
        &self.user
    }

    /// All registered service claims, by service name.
    pub fn registrations(&self) -> &HashMap<String, ServiceRegistration> {
        &self.services
    }

    /// Claim version records by fully-qualified claim name.
    pub fn claims(&self) -> &HashMap<String, Arc<PermissionClaim>> {
        &self.claims
    }

    /// Full system permissions by fully-qualified claim name.
    pub fn permissions(&self) -> &HashMap<String, Permissions> {
        &self.permissions
    }

    /// The non-privileged subset of system permissions.
    pub fn restricted(&self) -> &HashMap<String, Permissions> {
        &self.restricted
    }

    pub fn registry(&self) -> &ClaimVersionRegistry {
        &self.registry
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::manifest::{AccessMask, ResourceGrant, ServiceGrant};

    pub(crate) fn accounts_id() -> Uuid {
        Uuid::parse_str("7d4ef233-dd9a-4e1f-ad23-43c1a2309f47").unwrap()
    }

    pub(crate) fn audit_id() -> Uuid {
        Uuid::parse_str("f2a1a5a8-3c6e-4b11-9d5e-0d4b5a8a2f10").unwrap()
    }

    pub(crate) fn dashboards_id() -> Uuid {
        Uuid::parse_str("ba8ff6ed-1c24-4b36-9cc4-7f0f81a0f2bd").unwrap()
    }

    pub(crate) fn manifest() -> Manifest {
        Manifest {
            authority: "https://id.tessera.dev/".to_string(),
            account_id: Uuid::parse_str("3b3f6f5e-8f2b-4b88-9c21-9a28f8c6e1aa").unwrap(),
            permissions: vec![
                AccessMask { key: "execute".into(), mask: 1 },
                AccessMask { key: "write".into(), mask: 2 },
                AccessMask { key: "read".into(), mask: 4 },
                AccessMask { key: "admin".into(), mask: 7 },
                AccessMask { key: "none".into(), mask: 0 },
            ],
            services: vec![
                ServiceGrant {
                    name: "ledger".into(),
                    authority: "https://id.tessera.dev/".into(),
                    claim: "ledger.permissions".into(),
                    subject: Some("user_id".into()),
                    tenant: None,
                    version: 3,
                    hwm: 40,
                    permissions: vec![
                        ResourceGrant {
                            name: "accounts".into(),
                            resource_id: accounts_id(),
                            position: 32,
                            mask: 7,
                            restricted: 1,
                        },
                        ResourceGrant {
                            name: "audit".into(),
                            resource_id: audit_id(),
                            position: 35,
                            mask: 4,
                            restricted: 4,
                        },
                    ],
                },
                ServiceGrant {
                    name: "metrics".into(),
                    authority: "https://id.tessera.dev/".into(),
                    claim: "metrics.permissions".into(),
                    subject: None,
                    tenant: None,
                    version: 1,
                    hwm: 34,
                    permissions: vec![ResourceGrant {
                        name: "dashboards".into(),
                        resource_id: dashboards_id(),
                        position: 32,
                        mask: 3,
                        restricted: 0,
                    }],
                },
            ],
        }
    }

    pub(crate) fn service() -> Service {
        Service::from_manifest(
            "https://api.tessera.dev/",
            "ledger-api",
            "1.0",
            HashMap::new(),
            manifest(),
        )
    }

    fn ledger_claim() -> &'static str {
        "https://id.tessera.dev/ledger.permissions"
    }

    #[test]
    fn test_full_permissions_grant_everything_registered() {
        let service = service();
        let perms = &service.permissions()[ledger_claim()];
        assert_eq!(perms.version(), 3);
        assert!(service.check_access(perms, "admin", accounts_id()));
        assert!(service.check_access(perms, "read", accounts_id()));
        assert!(service.check_access(perms, "read", audit_id()));
    }

    #[test]
    fn test_mask_must_be_registered_for_resource() {
        let service = service();
        let perms = &service.permissions()[ledger_claim()];
        // Only "read" (mask 4) is registered for the audit resource
        assert!(!service.check_access(perms, "write", audit_id()));
        assert!(!service.check_access(perms, "admin", audit_id()));
    }

    #[test]
    fn test_restricted_subset_excludes_privileged_bits() {
        let service = service();
        let restricted = &service.restricted()[ledger_claim()];
        // accounts: mask 7, restricted 1 -> worker grant is rw- (6)
        assert!(service.check_access(restricted, "read", accounts_id()));
        assert!(service.check_access(restricted, "write", accounts_id()));
        assert!(!service.check_access(restricted, "execute", accounts_id()));
        assert!(!service.check_access(restricted, "admin", accounts_id()));
    }

    #[test]
    fn test_fully_restricted_resource_absent_from_worker_claim() {
        let service = service();
        let restricted = &service.restricted()[ledger_claim()];
        // audit: mask 4, restricted 4 -> nothing grantable to workers
        assert!(!service.check_access(restricted, "read", audit_id()));
    }

    #[test]
    fn test_unknown_access_and_resource_deny() {
        let service = service();
        let perms = &service.permissions()[ledger_claim()];
        assert!(!service.check_access(perms, "unknown", accounts_id()));
        assert!(!service.check_access(perms, "read", Uuid::nil()));
    }

    #[test]
    fn test_zero_mask_grants_when_registered() {
        let service = service();
        let perms = &service.permissions()[ledger_claim()];
        assert!(service.check_access(perms, "none", accounts_id()));
    }

    #[test]
    fn test_version_mismatch_denies_until_lazy_loaded() {
        let service = service();
        let mut bits = ClaimBits::new(40);
        bits.set_version(2);
        bits.set_permissions(32, 7);
        let stale = Permissions::new(2, bits);

        assert!(!service.check_access(&stale, "read", accounts_id()));

        // A lazy load registers the older version's layout
        service.record_registration(Registration {
            resource_id: accounts_id(),
            version: 2,
            position: 32,
            mask: 7,
        });
        assert!(service.check_access(&stale, "read", accounts_id()));
    }

    #[test]
    fn test_registry_seeded_per_service_claim() {
        let service = service();
        let record = service.registry().get("ledger.permissions", &version_prefix(3));
        assert!(record.is_some());
        assert!(Arc::ptr_eq(
            &record.unwrap(),
            &service.claims()[ledger_claim()]
        ));
    }

    #[test]
    fn test_state_roundtrip() {
        let service = service();
        let encoded = serde_json::to_vec(&service.to_state()).unwrap();
        let state: ServiceState = serde_json::from_slice(&encoded).unwrap();
        let restored = Service::from_state(state, "ledger-api", "1.0").unwrap();
        let perms = &restored.permissions()[ledger_claim()];
        assert!(restored.check_access(perms, "admin", accounts_id()));
    }

    #[test]
    fn test_state_mismatch_rejected() {
        let state = service().to_state();
        assert!(matches!(
            Service::from_state(state, "other-api", "1.0"),
            Err(ClientError::StateMismatch { .. })
        ));
    }
}
