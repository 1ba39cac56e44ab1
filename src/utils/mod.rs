//! Process utilities module
//! 
//! Shared helpers for the daemon and the popup commands.

pub mod signals;

pub use signals::shutdown_signal;
