// Generic CRUD client over one entity collection.
//
// Every collection the backend exposes speaks the same five verbs, so a
// single client parameterised by the record type covers all of them.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ApiClient, Error};

/// Largest `limit` the backend accepts on list endpoints.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A record type served from `<base>/<ENDPOINT>`.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection path segment, e.g. `"liquid-biopsies"`.
    const ENDPOINT: &'static str;
}

/// Acknowledgement returned by `DELETE <base>/<endpoint>/<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAck {
    pub ok: bool,
}

/// CRUD client for a single [`Resource`] collection.
///
/// One round trip per call: no retries, no caching. Backend failures are
/// returned unchanged as [`Error::Api`] or [`Error::Transport`].
pub struct ResourceClient<T> {
    api: ApiClient,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Resource> fmt::Debug for ResourceClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("endpoint", &T::ENDPOINT)
            .field("base_url", &self.api.base_url().as_str())
            .finish()
    }
}

impl<T: Resource> ResourceClient<T> {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            _record: PhantomData,
        }
    }

    /// Collection path segment this client talks to.
    pub fn endpoint(&self) -> &'static str {
        T::ENDPOINT
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// `GET <base>/<endpoint>?offset=&limit=`
    pub async fn list(&self, offset: u32, limit: u32) -> Result<Vec<T>, Error> {
        self.api
            .get_with_params(
                self.api.url(&[T::ENDPOINT]),
                &[("offset", offset.to_string()), ("limit", limit.to_string())],
            )
            .await
    }

    /// Walk every page of the collection at the backend's maximum page size.
    pub async fn list_all(&self) -> Result<Vec<T>, Error> {
        self.api
            .paginate_all(MAX_PAGE_SIZE, |offset, limit| self.list(offset, limit))
            .await
    }

    /// `GET <base>/<endpoint>/<id>`
    ///
    /// Fails with [`Error::InvalidArgument`] before touching the network
    /// when `id` is empty or whitespace.
    pub async fn get(&self, id: &str) -> Result<T, Error> {
        if id.trim().is_empty() {
            return Err(Error::InvalidArgument {
                message: "ID is required".into(),
            });
        }
        self.api.get(self.api.url(&[T::ENDPOINT, id])).await
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// `POST <base>/<endpoint>` with a full or partial record body.
    pub async fn create<B: Serialize + Sync + ?Sized>(&self, payload: &B) -> Result<T, Error> {
        self.api.post(self.api.url(&[T::ENDPOINT]), payload).await
    }

    /// `PATCH <base>/<endpoint>/<id>` with the fields to change.
    pub async fn update<B: Serialize + Sync + ?Sized>(
        &self,
        id: &str,
        payload: &B,
    ) -> Result<T, Error> {
        self.api
            .patch(self.api.url(&[T::ENDPOINT, id]), payload)
            .await
    }

    /// `DELETE <base>/<endpoint>/<id>`
    pub async fn delete(&self, id: &str) -> Result<DeleteAck, Error> {
        self.api
            .delete_with_response(self.api.url(&[T::ENDPOINT, id]))
            .await
    }
}
