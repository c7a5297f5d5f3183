//! API client for the tessera authorization service

use std::collections::HashMap;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tessera_signing::SigningClient;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::manifest::Manifest;
use crate::service::{Registration, Service};
use crate::state::ClaimResponse;
use tessera_claims::{version_from_prefix, PREFIX_LEN};

/// An account profile returned by a profile refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub authority: String,
    pub account_id: Uuid,
    pub display: String,
    pub assertions: Vec<Assertion>,
}

/// One claim asserted for an account.
#[derive(Debug, Clone, Deserialize)]
pub struct Assertion {
    pub issuer: String,
    pub key: String,
    pub value: String,
}

/// The claim layout of one resource, as served for a historic version.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionEntry {
    pub resource_id: Uuid,
    pub position: usize,
    pub mask: u32,
}

#[derive(Serialize)]
struct RefreshRequest {
    account_id: Uuid,
}

/// Thin REST client over a [`SigningClient`].
pub struct ApiClient {
    client: SigningClient,
    base: String,
}

impl ApiClient {
    pub fn new(client: SigningClient, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the schema manifest for an artifact version, or `None` when no
    /// matching version exists.
    pub async fn fetch_manifest(
        &self,
        artifact: &str,
        schema: &str,
    ) -> ClientResult<Option<Manifest>> {
        let response = self
            .client
            .send(
                self.client
                    .http()
                    .get(format!("{}/manifest", self.base))
                    .query(&[("artifact", artifact), ("schema", schema)]),
            )
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(json_or_error(response).await?))
    }

    /// Reload the full claim profile for an account.
    pub async fn refresh_profile(&self, account_id: Uuid) -> ClientResult<Profile> {
        let response = self
            .client
            .send(
                self.client
                    .http()
                    .post(format!("{}/profile", self.base))
                    .json(&RefreshRequest { account_id }),
            )
            .await?;
        json_or_error(response).await
    }

    /// Fetch the resource layout for a historic claim version.
    pub async fn fetch_permissions(
        &self,
        key: &str,
        version: u32,
    ) -> ClientResult<Vec<PermissionEntry>> {
        let response = self
            .client
            .send(
                self.client
                    .http()
                    .get(format!("{}/permissions", self.base))
                    .query(&[("key", key.to_string()), ("version", version.to_string())]),
            )
            .await?;
        json_or_error(response).await
    }

    /// Load all claims for an account.
    ///
    /// Claim values issued under a version the service has not seen yet
    /// trigger a lazy permissions fetch, so later `check_access` calls can
    /// evaluate claims granted against older schema versions.
    pub async fn load_account(
        &self,
        service: &Service,
        account_id: Uuid,
    ) -> ClientResult<ClaimResponse> {
        let profile = self.refresh_profile(account_id).await?;
        let mut claims = HashMap::with_capacity(profile.assertions.len());
        for assertion in &profile.assertions {
            let key = format!("{}{}", assertion.issuer, assertion.key);
            self.track_version(service, &key, &assertion.value).await?;
            claims.insert(key, assertion.value.clone());
        }
        Ok(ClaimResponse {
            success: true,
            issuer: profile.authority,
            accountability: account_id,
            display: profile.display,
            claims,
        })
    }

    /// Load authorization claims from a cached response.
    ///
    /// Returns `None` when the payload does not parse. An API call is made
    /// only for permission claims carrying an unregistered version prefix.
    pub async fn load_cached(
        &self,
        service: &Service,
        utf8_json: &[u8],
    ) -> ClientResult<Option<ClaimResponse>> {
        let Ok(response) = serde_json::from_slice::<ClaimResponse>(utf8_json) else {
            return Ok(None);
        };
        for (key, value) in &response.claims {
            self.track_version(service, key, value).await?;
        }
        Ok(Some(response))
    }

    /// Record the claim version a value was issued under, fetching its
    /// resource layout on first sight.
    async fn track_version(&self, service: &Service, key: &str, value: &str) -> ClientResult<()> {
        let Some(record) = service.claims().get(key) else {
            return Ok(());
        };
        if record.covers(value) {
            return Ok(());
        }
        let Some(prefix) = value.get(..PREFIX_LEN) else {
            return Ok(());
        };
        if record.version(prefix).is_some() {
            return Ok(());
        }

        let version = version_from_prefix(prefix)?;
        tracing::debug!(key, version, "loading permissions for unseen claim version");
        for entry in self.fetch_permissions(record.key(), version).await? {
            service.record_registration(Registration {
                resource_id: entry.resource_id,
                version,
                position: entry.position,
                mask: entry.mask,
            });
        }
        record.record_version(prefix, version);
        Ok(())
    }
}

async fn json_or_error<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        });
    }
    Ok(response.json().await?)
}
