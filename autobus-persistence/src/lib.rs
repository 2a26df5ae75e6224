pub mod cleanup;
pub mod connection;
pub mod entities;
pub mod error;
pub mod repositories;
pub mod room_store;
pub mod store;

pub use cleanup::StoreCleanup;
pub use error::{StoreError, StoreResult};
pub use room_store::RoomStore;
pub use store::{KeyValueStore, MemoryStore, Namespace};
