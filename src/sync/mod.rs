//! Synchronization primitives
//!
//! Contains the counting semaphore.

#[cfg(feature = "sem")]
pub mod sem;
