//! Mindful Breaks - a work/break focus timer
//! 
//! This library provides the background timer controller (a small HTTP
//! daemon owning the persisted timer state and its alarm backstop) and the
//! popup controller that renders the countdown by polling it.

pub mod api;
pub mod clock;
pub mod config;
pub mod popup;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use popup::Popup;
pub use state::{AppState, SessionType, TimerState};
pub use utils::signals::shutdown_signal;
