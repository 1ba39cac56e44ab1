//! Platform collaborators module
//! 
//! This module contains the alarm scheduler and the presentation services
//! used when a work session ends.

pub mod alarms;
pub mod presenter;

// Re-export main types
pub use alarms::{AlarmScheduler, WORK_SESSION_ALARM};
pub use presenter::{DesktopPresenter, NullPresenter, Presenter};
