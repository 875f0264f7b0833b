//! Logging macros for ESOS
//!
//! With the `defmt` feature the macros forward to defmt. A hosted build
//! (`std` without `defmt`) prints info, warnings and errors to stderr.
//! Otherwise every macro compiles to nothing, so format arguments must
//! stick to plain `{}` placeholders that both backends accept.

/// Debug message
#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

/// Info message
#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}

/// Error message
#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { defmt::error!($($arg)*) };
}

/// Trace message
#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { defmt::trace!($($arg)*) };
}

/// Warning message
#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

// Hosted build: stderr for the levels a user cares about
#[cfg(all(feature = "std", not(feature = "defmt")))]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { ::std::eprintln!("[esos INFO ] {}", ::core::format_args!($($arg)*)) };
}
#[cfg(all(feature = "std", not(feature = "defmt")))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { ::std::eprintln!("[esos WARN ] {}", ::core::format_args!($($arg)*)) };
}
#[cfg(all(feature = "std", not(feature = "defmt")))]
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { ::std::eprintln!("[esos ERROR] {}", ::core::format_args!($($arg)*)) };
}
#[cfg(all(feature = "std", not(feature = "defmt")))]
#[macro_export]
macro_rules! debug { ($($arg:tt)*) => {}; }
#[cfg(all(feature = "std", not(feature = "defmt")))]
#[macro_export]
macro_rules! trace { ($($arg:tt)*) => {}; }

// No-op versions when no backend is enabled
#[cfg(not(any(feature = "defmt", feature = "std")))]
#[macro_export]
macro_rules! debug { ($($arg:tt)*) => {}; }
#[cfg(not(any(feature = "defmt", feature = "std")))]
#[macro_export]
macro_rules! info { ($($arg:tt)*) => {}; }
#[cfg(not(any(feature = "defmt", feature = "std")))]
#[macro_export]
macro_rules! error { ($($arg:tt)*) => {}; }
#[cfg(not(any(feature = "defmt", feature = "std")))]
#[macro_export]
macro_rules! trace { ($($arg:tt)*) => {}; }
#[cfg(not(any(feature = "defmt", feature = "std")))]
#[macro_export]
macro_rules! warn { ($($arg:tt)*) => {}; }
