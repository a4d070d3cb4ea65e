//! `instutils` - OS utility primitives for installer scripts
//!
//! Detects the real Windows version and build number, even when a
//! compatibility shim makes the OS report an older release, and exposes the
//! results to installer scripts through a string stack.
//!
//! # Modules
//!
//! - `version`: probing, climbing and caching of the real OS version
//! - `sync`: the critical section guarding the process-wide cache
//! - `host`: installer stack marshalling and call dispatch
//! - `config`, `utils`: configuration, logging and verbose notices

// Module declarations
pub mod config;
pub mod error;
pub mod host;
pub mod sync;
pub mod utils;
pub mod version;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use error::{Result, UtilsError};
pub use version::{OsBuild, OsVersion, VersionDetector, VersionTuple};
