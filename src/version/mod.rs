//! Real Windows version detection
//!
//! Windows may lie to a process about its own version: compatibility shims
//! make `GetVersionEx` report an older release. Installer scripts that need the
//! truth go through this module.
//!
//! # Architecture
//!
//! - `VersionSource`: answers "what do you report?" and "are you at least X?",
//!   backed by ntdll (`NativeSource`) or kernel32 (`StandardSource`)
//! - `climb`: turns reported lower bounds into the real version and build by
//!   probing upwards
//! - `VersionDetector`: caches the first successful detection, thread-safe,
//!   first writer wins
//! - `names`: display names for `(major, minor)` pairs
//!
//! # Example Usage
//!
//! ```no_run
//! use instutils::version::{VersionTuple, detector};
//!
//! let detector = detector::global();
//! let version = detector.real_os_version()?;
//! println!("Running on {} ({})", version.version, detector.real_os_name()?);
//!
//! let check = detector.verify_real_os_version(VersionTuple::new(6, 1, 0))?;
//! println!("Compared to Windows 7: {check}");
//! # Ok::<(), instutils::error::UtilsError>(())
//! ```

pub mod climb;
pub mod detector;
pub mod names;
pub mod source;
pub mod types;
#[cfg(windows)]
pub mod windows_api;

pub use detector::{CacheStats, DetectionState, VersionDetector};
pub use names::{UNKNOWN_NAME, friendly_name};
pub use source::{SimulatedSource, VersionSource, system_source};
pub use types::{Comparison, OsBuild, OsInfo, OsVersion, VersionTuple};
