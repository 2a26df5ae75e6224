use std::net::SocketAddr;
use std::sync::Arc;

use autobus_client::{GameSession, HttpStore};
use autobus_persistence::{KeyValueStore, MemoryStore, RoomStore, StoreError};
use autobus_store_server::create_routes;

/// Serves the storage routes on an ephemeral port for the rest of the test
fn spawn_store_server(max_value_bytes: usize) -> (SocketAddr, MemoryStore) {
    let store = MemoryStore::new();
    let routes = create_routes(Arc::new(store.clone()), max_value_bytes);
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (addr, store)
}

fn http_store(addr: SocketAddr) -> HttpStore {
    HttpStore::new(&format!("http://{addr}")).unwrap()
}

#[tokio::test]
async fn test_missing_key_reads_as_absent() {
    let (addr, _) = spawn_store_server(1024);
    let store = http_store(addr);

    assert_eq!(store.get("game:NOPE00", true).await.unwrap(), None);
}

#[tokio::test]
async fn test_values_round_trip_per_namespace() {
    let (addr, backing) = spawn_store_server(1024);
    let store = http_store(addr);

    store.set("game:AB12CD", "{\"players\":[]}", true).await.unwrap();
    store.set("game:AB12CD", "mine", false).await.unwrap();

    assert_eq!(
        store.get("game:AB12CD", true).await.unwrap().as_deref(),
        Some("{\"players\":[]}")
    );
    assert_eq!(
        store.get("game:AB12CD", false).await.unwrap().as_deref(),
        Some("mine")
    );
    assert_eq!(backing.len(), 2);
}

#[tokio::test]
async fn test_oversized_value_is_rejected() {
    let (addr, backing) = spawn_store_server(16);
    let store = http_store(addr);

    let err = store.set("big", &"x".repeat(64), true).await.unwrap_err();
    assert!(matches!(err, StoreError::Rejected { status: 413, .. }));
    assert!(backing.is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() {
    // Bind and drop to find a port nothing listens on
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let store = http_store(addr);

    let err = store.get("game:AB12CD", true).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable { .. }));
}

#[tokio::test]
async fn test_sessions_play_over_http() {
    let (addr, backing) = spawn_store_server(64 * 1024);

    let mut host = GameSession::new(Arc::new(http_store(addr)));
    let code = host.create_room("Alice").await.unwrap();
    let mut bob = GameSession::new(Arc::new(http_store(addr)));
    bob.join_room(&code, "Bob").await.unwrap();

    let letter = host.start_round().await.unwrap();

    let record = RoomStore::new(Arc::new(backing))
        .get(&code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.players.len(), 2);
    assert!(record.is_playing);
    assert_eq!(record.current_letter, Some(letter));

    host.leave().await;
    bob.leave().await;
}
