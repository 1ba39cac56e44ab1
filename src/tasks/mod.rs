//! Background tasks module
//! 
//! This module contains background tasks that run alongside the HTTP server.

pub mod alarm_listener;
pub mod refresh_loop;

// Re-export main functions
pub use alarm_listener::alarm_listener_task;
pub use refresh_loop::refresh_loop_task;
