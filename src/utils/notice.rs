//! Verbose-mode diagnostics
//!
//! Internal failures are always logged. When the installer script has enabled
//! verbose mode, they are additionally shown to the user as a modal notice so
//! that script authors can see which API failed on a customer machine.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{UtilsError, get_user_friendly_error};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable verbose mode for the whole process
pub fn set_verbose(enabled: bool) {
    let previous = VERBOSE.swap(enabled, Ordering::Relaxed);
    if previous != enabled {
        tracing::info!("Verbose mode {}", if enabled { "enabled" } else { "disabled" });
    }
}

/// Whether verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Report an internal failure
///
/// Logged at warn level; shown as a modal notice only in verbose mode.
pub fn notify(title: &str, message: &str) {
    tracing::warn!("{title}: {message}");
    if is_verbose() {
        show_notice(title, message);
    }
}

/// Report an error through [`notify`] using its user-friendly rendering
pub fn notify_error(title: &str, error: &UtilsError) {
    notify(title, &get_user_friendly_error(error));
}

#[cfg(windows)]
fn show_notice(title: &str, message: &str) {
    use rfd::{MessageButtons, MessageDialog, MessageLevel};

    MessageDialog::new()
        .set_title(title)
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .set_level(MessageLevel::Warning)
        .show();
}

#[cfg(not(windows))]
fn show_notice(title: &str, message: &str) {
    eprintln!("{title}: {message}");
}
