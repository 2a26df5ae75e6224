pub mod game_events;
pub mod generation;
pub mod roster;
pub mod round_state;
pub mod scoring;

// Re-export main components
pub use game_events::*;
pub use generation::*;
pub use roster::*;
pub use round_state::*;
pub use scoring::*;
