//! State management module
//! 
//! This module contains the persisted timer record, the durable store it
//! lives in, and the controller that applies every transition.

pub mod app_state;
pub mod session_type;
pub mod store;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use session_type::SessionType;
pub use store::Store;
pub use timer_state::TimerState;
