use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

use autobus_persistence::{KeyValueStore, StoreError, StoreResult};
use autobus_types::{ErrorResponse, PutValueRequest, StoredValue};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// [`KeyValueStore`] backed by the store server's `/storage` routes.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: Url,
}

impl HttpStore {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid store URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("Store URL {} cannot carry a path", base_url);
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    fn storage_url(&self, key: &str, shared: bool) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("storage").push(key);
        }
        url.query_pairs_mut()
            .append_pair("shared", if shared { "true" } else { "false" });
        url
    }

    async fn rejected(response: Response) -> StoreError {
        let status = response.status();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
        };
        StoreError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl KeyValueStore for HttpStore {
    async fn get(&self, key: &str, shared: bool) -> StoreResult<Option<String>> {
        let response = self
            .client
            .get(self.storage_url(key, shared))
            .send()
            .await
            .map_err(|e| StoreError::unavailable(format!("GET {key} failed"), e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: StoredValue = response
                    .json()
                    .await
                    .map_err(|e| StoreError::unavailable(format!("GET {key} returned bad body"), e))?;
                debug!("GET {} -> {} bytes", key, body.value.len());
                Ok(Some(body.value))
            }
            _ => Err(Self::rejected(response).await),
        }
    }

    async fn set(&self, key: &str, value: &str, shared: bool) -> StoreResult<()> {
        let response = self
            .client
            .put(self.storage_url(key, shared))
            .json(&PutValueRequest {
                value: value.to_string(),
            })
            .send()
            .await
            .map_err(|e| StoreError::unavailable(format!("PUT {key} failed"), e))?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_url() {
        let store = HttpStore::new("http://localhost:8080").unwrap();
        assert_eq!(
            store.storage_url("game:AB12CD", true).as_str(),
            "http://localhost:8080/storage/game:AB12CD?shared=true"
        );
    }

    #[test]
    fn test_storage_url_keeps_base_path() {
        let store = HttpStore::new("http://localhost:8080/autobus/").unwrap();
        assert_eq!(
            store.storage_url("prefs", false).as_str(),
            "http://localhost:8080/autobus/storage/prefs?shared=false"
        );
    }

    #[test]
    fn test_rejects_unusable_urls() {
        assert!(HttpStore::new("not a url").is_err());
        assert!(HttpStore::new("mailto:someone@example.com").is_err());
    }
}
