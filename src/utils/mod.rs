//! Utility modules
//!
//! Provides logging setup and verbose-mode notices.

pub mod logging;
pub mod notice;

pub use logging::init_logging;
pub use notice::{is_verbose, set_verbose};
