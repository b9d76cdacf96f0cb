// Async HTTP client for the biobank REST backend.
//
// Base path: whatever the deployment mounts the API under (typically `/api`).
// Every entity collection lives at `<base>/<endpoint>`.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::Error;

// ── Error response shape from the backend ────────────────────────────

/// FastAPI error envelope: `{"detail": "..."}` for handled errors,
/// `{"detail": [{"loc": [...], "msg": "..."}]}` for validation failures.
#[derive(Deserialize)]
struct ErrorResponse {
    detail: serde_json::Value,
}

impl ErrorResponse {
    fn message(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| {
                        let msg = item.get("msg")?.as_str()?;
                        let field = item
                            .get("loc")
                            .and_then(serde_json::Value::as_array)
                            .and_then(|loc| loc.last())
                            .map(|v| match v {
                                serde_json::Value::String(s) => s.clone(),
                                other => other.to_string(),
                            });
                        Some(match field {
                            Some(field) => format!("{field}: {msg}"),
                            None => msg.to_owned(),
                        })
                    })
                    .collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
            _ => None,
        }
    }
}

/// Response of the backend's liveness probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the biobank REST backend.
///
/// Cheap to clone: the underlying `reqwest::Client` shares one connection
/// pool across clones, so every [`ResourceClient`](crate::ResourceClient)
/// built from it reuses the same transport.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &crate::TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        Ok(Self { http, base_url })
    }

    /// The root every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append path segments to the base URL, percent-encoding each one.
    ///
    /// A trailing slash on the base is tolerated: `http://h/api` and
    /// `http://h/api/` both yield `http://h/api/<segments>`.
    pub(crate) fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Cannot-be-a-base URLs are rejected at construction.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn delete_with_response<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<T, Error> {
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|err| err.message())
            .unwrap_or_else(|| {
                if raw.trim().is_empty() {
                    status.to_string()
                } else {
                    raw.chars().take(500).collect()
                }
            });

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Collect all pages into a single `Vec<T>`.
    ///
    /// The backend returns bare arrays with no total count, so a page
    /// shorter than `limit` marks the end of the collection.
    pub async fn paginate_all<T, F, Fut>(&self, limit: u32, fetch: F) -> Result<Vec<T>, Error>
    where
        F: Fn(u32, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, Error>>,
    {
        let mut all = Vec::new();
        let mut offset: u32 = 0;
        let limit = limit.max(1);

        loop {
            let page = fetch(offset, limit).await?;
            let received = u32::try_from(page.len()).unwrap_or(u32::MAX);
            all.extend(page);

            if received < limit {
                break;
            }

            offset = offset.saturating_add(received);
        }

        Ok(all)
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── System ───────────────────────────────────────────────────────

    /// Liveness probe at `<base>/health`.
    pub async fn health(&self) -> Result<Health, Error> {
        self.get(self.url(&["health"])).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::from_reqwest(base, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn url_joins_with_and_without_trailing_slash() {
        for base in ["http://lab.local/api", "http://lab.local/api/"] {
            let url = client(base).url(&["patients", "N1"]);
            assert_eq!(url.as_str(), "http://lab.local/api/patients/N1");
        }
    }

    #[test]
    fn url_encodes_identifier_segments() {
        let url = client("http://lab.local/api").url(&["tumors", "BB/01 a"]);
        assert_eq!(url.path(), "/api/tumors/BB%2F01%20a");
    }

    #[test]
    fn rejects_non_base_urls() {
        let result = ApiClient::from_reqwest("mailto:lab@example.org", reqwest::Client::new());
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn validation_detail_is_flattened() {
        let err: ErrorResponse = serde_json::from_str(
            r#"{"detail":[{"loc":["body","nhc"],"msg":"field required","type":"missing"}]}"#,
        )
        .unwrap();
        assert_eq!(err.message().as_deref(), Some("nhc: field required"));
    }
}
