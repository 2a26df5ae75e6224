use serde::Deserialize;
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;

use autobus_persistence::KeyValueStore;
use autobus_types::{ErrorResponse, PutValueRequest, StoredValue};

pub mod config;

#[derive(Debug, Deserialize)]
struct StorageQuery {
    shared: Option<bool>,
}

impl StorageQuery {
    fn shared(&self) -> bool {
        self.shared.unwrap_or(true)
    }
}

pub fn create_routes(
    store: Arc<dyn KeyValueStore>,
    max_value_bytes: usize,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let store_filter = warp::any().map(move || store.clone());

    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let get_value = warp::path!("storage" / String)
        .and(warp::get())
        .and(warp::query::<StorageQuery>())
        .and(store_filter.clone())
        .and_then(handle_get_value);

    // Headroom over the value limit for the JSON envelope
    let body_limit = (max_value_bytes as u64).saturating_mul(2).saturating_add(1024);
    let put_value = warp::path!("storage" / String)
        .and(warp::put())
        .and(warp::query::<StorageQuery>())
        .and(warp::body::content_length_limit(body_limit))
        .and(warp::body::json::<PutValueRequest>())
        .and(store_filter.clone())
        .and(warp::any().map(move || max_value_bytes))
        .and_then(handle_put_value);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "PUT"]);

    health
        .or(get_value)
        .or(put_value)
        .with(cors)
        .with(warp::log("autobus_store"))
}

fn error_reply(
    message: impl Into<String>,
    status: StatusCode,
) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&ErrorResponse {
            error: message.into(),
        }),
        status,
    )
}

async fn handle_get_value(
    key: String,
    query: StorageQuery,
    store: Arc<dyn KeyValueStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let shared = query.shared();

    match store.get(&key, shared).await {
        Ok(Some(value)) => Ok(warp::reply::with_status(
            warp::reply::json(&StoredValue { key, value, shared }),
            StatusCode::OK,
        )),
        Ok(None) => Ok(error_reply("Key not found", StatusCode::NOT_FOUND)),
        Err(err) => {
            tracing::error!("Failed to read {}: {}", key, err);
            Ok(error_reply(
                "Failed to read value",
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn handle_put_value(
    key: String,
    query: StorageQuery,
    request: PutValueRequest,
    store: Arc<dyn KeyValueStore>,
    max_value_bytes: usize,
) -> Result<impl warp::Reply, warp::Rejection> {
    let shared = query.shared();

    if request.value.len() > max_value_bytes {
        tracing::warn!(
            "Rejected {} byte value for {} (limit {})",
            request.value.len(),
            key,
            max_value_bytes
        );
        return Ok(error_reply(
            format!("Value exceeds {max_value_bytes} bytes"),
            StatusCode::PAYLOAD_TOO_LARGE,
        ));
    }

    match store.set(&key, &request.value, shared).await {
        Ok(()) => {
            tracing::debug!("Stored {} (shared: {})", key, shared);
            Ok(warp::reply::with_status(
                warp::reply::json(&StoredValue {
                    key,
                    value: request.value,
                    shared,
                }),
                StatusCode::OK,
            ))
        }
        Err(err) => {
            tracing::error!("Failed to write {}: {}", key, err);
            Ok(error_reply(
                "Failed to write value",
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use autobus_persistence::MemoryStore;

    fn create_test_app() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone
    {
        create_routes(Arc::new(MemoryStore::new()), 1024)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), "OK");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let app = create_test_app();

        let response = warp::test::request()
            .method("GET")
            .path("/storage/game:NOPE00")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 404);
        let body: ErrorResponse = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body.error, "Key not found");
    }

    #[tokio::test]
    async fn test_shared_defaults_to_true() {
        let app = create_test_app();

        let response = warp::test::request()
            .method("PUT")
            .path("/storage/game:AB12CD")
            .json(&PutValueRequest {
                value: "{}".to_string(),
            })
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let stored: StoredValue = serde_json::from_slice(response.body()).unwrap();
        assert!(stored.shared);

        let response = warp::test::request()
            .method("GET")
            .path("/storage/game:AB12CD?shared=true")
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_oversized_value_is_rejected() {
        let app = create_test_app();

        let response = warp::test::request()
            .method("PUT")
            .path("/storage/big")
            .json(&PutValueRequest {
                value: "x".repeat(1025),
            })
            .reply(&app)
            .await;

        assert_eq!(response.status(), 413);
    }
}
