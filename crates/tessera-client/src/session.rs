//! Per-principal authorization sessions

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, FixedOffset};
use tessera_claims::Permissions;
use uuid::Uuid;

use crate::service::{Service, ServiceRegistration};

/// A stateful cache of authorization data for one principal.
///
/// Claim values decode from base64 into [`Permissions`] at most once per
/// session; service registrations resolve at most once, including the
/// negative case of a service whose subject or tenant claim the principal
/// does not carry.
pub struct Session<'a> {
    service: &'a Service,
    principal: Option<HashMap<String, String>>,
    registrations: RwLock<HashMap<String, Option<ServiceRegistration>>>,
    cache: RwLock<HashMap<String, Option<Permissions>>>,
}

impl<'a> Session<'a> {
    pub(crate) fn new(service: &'a Service, principal: Option<HashMap<String, String>>) -> Self {
        Self {
            service,
            principal,
            registrations: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Check whether the principal has a level of access to a resource.
    pub fn has_permissions(&self, service: &str, resource: &str, access: &str) -> bool {
        let memoized = self
            .registrations
            .read()
            .unwrap()
            .get(service)
            .cloned();
        let registration = match memoized {
            Some(resolved) => resolved,
            None => {
                let resolved = self.resolve_registration(service);
                self.registrations
                    .write()
                    .unwrap()
                    .insert(service.to_string(), resolved.clone());
                resolved
            }
        };

        let Some(registration) = registration else {
            return false;
        };
        let Some(resource_id) = registration.resources.get(resource) else {
            return false;
        };
        let Some(permissions) = self.permissions_for(&registration.claim) else {
            return false;
        };
        self.service.check_access(&permissions, access, *resource_id)
    }

    /// A service is usable only when the principal carries its subject and
    /// tenant claims, where required.
    fn resolve_registration(&self, service: &str) -> Option<ServiceRegistration> {
        let active = self.service.registrations().get(service)?;
        let subject_ok = active
            .subject
            .as_deref()
            .is_none_or(|claim| self.get_str(claim).is_some());
        let tenant_ok = active
            .tenant
            .as_deref()
            .is_none_or(|claim| self.get_str(claim).is_some());
        (subject_ok && tenant_ok).then(|| active.clone())
    }

    fn permissions_for(&self, claim: &str) -> Option<Permissions> {
        if let Some(cached) = self
            .cache
            .read()
            .unwrap()
            .get(claim)
        {
            return cached.clone();
        }
        let decoded = self
            .get_str(claim)
            .and_then(|value| Permissions::from_base64(value).ok());
        self.cache
            .write()
            .unwrap()
            .insert(claim.to_string(), decoded.clone());
        decoded
    }

    /// Escalate to the full system permission set.
    ///
    /// Subject and tenant gating still applies; only the claim lookup is
    /// bypassed. Create a fresh session to drop the escalation.
    pub fn escalate_privileges(&self) {
        let mut cache = self.cache.write().unwrap();
        for (claim, permissions) in self.service.permissions() {
            cache.insert(claim.clone(), Some(permissions.clone()));
        }
    }

    /// Fetch a single string-valued claim by fully-qualified name.
    pub fn get_str(&self, claim: &str) -> Option<&str> {
        self.principal.as_ref()?.get(claim).map(String::as_str)
    }

    /// Fetch a boolean-valued claim; `None` when absent or unparseable.
    pub fn get_bool(&self, claim: &str) -> Option<bool> {
        self.get_str(claim)?.parse().ok()
    }

    /// Fetch an integer-valued claim; `None` when absent or unparseable.
    pub fn get_i64(&self, claim: &str) -> Option<i64> {
        self.get_str(claim)?.parse().ok()
    }

    /// Fetch a float-valued claim; `None` when absent or unparseable.
    pub fn get_f64(&self, claim: &str) -> Option<f64> {
        self.get_str(claim)?.parse().ok()
    }

    /// Fetch a UUID-valued claim; `None` when absent or unparseable.
    pub fn get_uuid(&self, claim: &str) -> Option<Uuid> {
        Uuid::parse_str(self.get_str(claim)?).ok()
    }

    /// Fetch an RFC 3339 datetime-valued claim; `None` when absent or
    /// unparseable.
    pub fn get_datetime(&self, claim: &str) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(self.get_str(claim)?).ok()
    }
}
