// ── Backend facade ──
//
// Owns the shared HTTP client and vends typed resource clients and
// bindings. Cheap to clone; screens each hold their own handle.

use std::sync::Arc;

use biodesk_api::{ApiClient, Health, ResourceClient};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::binding::Binding;
use crate::config::BackendConfig;
use crate::entity::{Entity, EntityKind};
use crate::error::CoreError;
use crate::form::Payload;
use crate::with_entity;

/// Handle to one biobank backend.
#[derive(Clone)]
pub struct Backend {
    api: ApiClient,
    config: Arc<BackendConfig>,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("url", &self.config.url.as_str())
            .finish_non_exhaustive()
    }
}

impl Backend {
    /// Build the HTTP client for `config`. No request is sent.
    pub fn new(config: BackendConfig) -> Result<Self, CoreError> {
        let api = ApiClient::new(config.url.as_str(), &config.transport())?;
        info!(url = %config.url, "backend configured");
        Ok(Self::from_api(api, config))
    }

    /// Wrap an existing client, e.g. one pointed at a mock server.
    pub fn from_api(api: ApiClient, config: BackendConfig) -> Self {
        Self {
            api,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Initial page size for tables.
    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    pub fn resource<E: Entity>(&self) -> ResourceClient<E> {
        ResourceClient::new(self.api.clone())
    }

    // ── Bindings ─────────────────────────────────────────────────────

    /// Whole collection, defaulting to an empty list while loading.
    pub fn collection<E: Entity>(&self) -> Binding<Vec<E>> {
        let client = self.resource::<E>();
        Binding::fixed(E::ENDPOINT, move || {
            let client = client.clone();
            async move { client.list_all().await.map_err(CoreError::from) }
        })
        .with_default(Vec::new())
    }

    /// One record, re-fetched whenever `key` changes. `None` keeps the
    /// binding idle.
    pub fn record<E: Entity>(&self, key: watch::Receiver<Option<String>>) -> Binding<E> {
        let client = self.resource::<E>();
        Binding::derived(
            E::ENDPOINT,
            key,
            |key: &Option<String>| key.clone(),
            move |key: String| {
                let client = client.clone();
                async move { client.get(&key).await.map_err(CoreError::from) }
            },
        )
    }

    /// Like [`Backend::record`], but a 404 settles as `Ready(None)`.
    pub fn optional_record<E: Entity>(
        &self,
        key: watch::Receiver<Option<String>>,
    ) -> Binding<Option<E>> {
        let client = self.resource::<E>();
        Binding::derived(
            E::ENDPOINT,
            key,
            |key: &Option<String>| key.clone(),
            move |key: String| {
                let client = client.clone();
                async move {
                    match client.get(&key).await {
                        Ok(record) => Ok(Some(record)),
                        Err(e) if e.is_not_found() => {
                            debug!(endpoint = E::ENDPOINT, %key, "no record");
                            Ok(None)
                        }
                        Err(e) => Err(CoreError::from(e)),
                    }
                }
            },
        )
    }

    /// Record count for a dashboard card.
    pub fn count_binding(&self, kind: EntityKind) -> Binding<usize> {
        let backend = self.clone();
        Binding::fixed(kind.endpoint(), move || {
            let backend = backend.clone();
            async move { backend.count(kind).await }
        })
    }

    // ── One-shot calls ───────────────────────────────────────────────

    pub async fn count(&self, kind: EntityKind) -> Result<usize, CoreError> {
        with_entity!(kind, E => {
            let records = self.resource::<E>().list_all().await?;
            Ok(records.len())
        })
    }

    /// One server page of `E`.
    pub async fn list<E: Entity>(&self, offset: u32, limit: u32) -> Result<Vec<E>, CoreError> {
        Ok(self.resource::<E>().list(offset, limit).await?)
    }

    /// Every record of `E`, across server pages.
    pub async fn list_all<E: Entity>(&self) -> Result<Vec<E>, CoreError> {
        Ok(self.resource::<E>().list_all().await?)
    }

    pub async fn get<E: Entity>(&self, key: &str) -> Result<E, CoreError> {
        Ok(self.resource::<E>().get(key).await?)
    }

    /// Like [`Backend::get`], but a 404 yields `None`.
    pub async fn find<E: Entity>(&self, key: &str) -> Result<Option<E>, CoreError> {
        match self.resource::<E>().get(key).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn create<E: Entity>(&self, payload: &Payload) -> Result<E, CoreError> {
        let created = self.resource::<E>().create(payload).await?;
        info!(kind = ?E::KIND, key = %created.key(), "record created");
        Ok(created)
    }

    pub async fn update<E: Entity>(&self, key: &str, payload: &Payload) -> Result<E, CoreError> {
        let updated = self.resource::<E>().update(key, payload).await?;
        info!(kind = ?E::KIND, %key, "record updated");
        Ok(updated)
    }

    /// Delete by key. An acknowledgement of `ok: false` is an error.
    pub async fn delete<E: Entity>(&self, key: &str) -> Result<(), CoreError> {
        let ack = self.resource::<E>().delete(key).await?;
        if !ack.ok {
            return Err(CoreError::Rejected {
                message: format!("{} {key} was not deleted", E::KIND.singular()),
            });
        }
        info!(kind = ?E::KIND, %key, "record deleted");
        Ok(())
    }

    pub async fn health(&self) -> Result<Health, CoreError> {
        Ok(self.api.health().await?)
    }
}
