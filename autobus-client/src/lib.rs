pub mod clock;
pub mod config;
pub mod http_store;
pub mod session;
mod timers;

pub use clock::Clock;
pub use config::ClientConfig;
pub use http_store::HttpStore;
pub use session::{GameMode, GameSession, SessionSnapshot};
