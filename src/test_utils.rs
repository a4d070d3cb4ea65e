//! Shared test utilities for `instutils` unit tests.
//!
//! Only compiled during testing (`#[cfg(test)]`).

use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes tests that modify the APPDATA environment variable
static APPDATA_LOCK: Mutex<()> = Mutex::new(());

/// Create a temporary test directory, removed when dropped
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// RAII guard pointing APPDATA at a temporary directory for one test
///
/// The original value is restored on drop. `APPDATA_LOCK` is held for the
/// guard's lifetime so no two tests rewrite the variable concurrently.
pub struct AppdataGuard {
    original: Option<String>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

#[expect(
    unsafe_code,
    reason = "Test-only code that modifies environment variables while holding APPDATA_LOCK"
)]
impl AppdataGuard {
    /// Set APPDATA to `temp_dir` until the guard is dropped
    pub fn new(temp_dir: &TempDir) -> Self {
        let lock = APPDATA_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let original = std::env::var("APPDATA").ok();
        // SAFETY: writers are serialized by APPDATA_LOCK and the value is
        // restored on drop
        unsafe {
            std::env::set_var("APPDATA", temp_dir.path());
        }
        Self {
            original,
            _lock: lock,
        }
    }
}

#[expect(
    unsafe_code,
    reason = "Test-only code that restores environment variables while holding APPDATA_LOCK"
)]
impl Drop for AppdataGuard {
    fn drop(&mut self) {
        // SAFETY: APPDATA_LOCK is still held by this guard
        match &self.original {
            Some(original) => unsafe { std::env::set_var("APPDATA", original) },
            None => unsafe { std::env::remove_var("APPDATA") },
        }
    }
}
