//! Core kernel modules
//!
//! Contains the kernel context, the suspend/resume primitive, task
//! management, the scheduler and time management.

pub mod config;
pub mod error;
pub mod kernel;
pub mod pt;
pub mod sched;
pub mod task;
pub mod time;
pub mod types;
