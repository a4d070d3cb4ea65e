//! Version sources: where probes are answered
//!
//! A [`VersionSource`] answers two kinds of question about the running OS:
//! what it *claims* to be ([`VersionSource::os_info`]) and whether it is *at
//! least* a given version or build. Only the latter is trustworthy under a
//! compatibility shim, which is why the climbers in [`super::climb`] use the
//! claim as a starting point and the probes to correct it.
//!
//! On Windows, [`system_source`] selects the privileged `ntdll` source when its
//! entry points resolve and falls back to the documented kernel32 API
//! otherwise. The choice is made once per process.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::{Result, UtilsError};
use crate::version::types::{OsInfo, VER_NT_WORKSTATION, VER_PLATFORM_WIN32_NT, VersionTuple};

/// Answers version queries about the running OS
pub trait VersionSource: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// What the OS reports about itself
    fn os_info(&self) -> Result<OsInfo>;

    /// Whether the OS is an NT system of at least `version`
    ///
    /// Never fails: an API error is reported as a diagnostic and answers `false`.
    fn at_least_version(&self, version: VersionTuple) -> bool;

    /// Whether the OS build number is at least `build`
    fn at_least_build(&self, build: u32) -> bool;
}

/// The source selected for this process
///
/// The first call picks the best available implementation; later calls return
/// the same instance.
pub fn system_source() -> Arc<dyn VersionSource> {
    static SOURCE: OnceLock<Arc<dyn VersionSource>> = OnceLock::new();
    Arc::clone(SOURCE.get_or_init(select_source))
}

#[cfg(windows)]
fn select_source() -> Arc<dyn VersionSource> {
    use crate::version::windows_api::{NativeSource, StandardSource};

    if let Some(native) = NativeSource::load() {
        tracing::debug!("Using ntdll version source");
        Arc::new(native)
    } else {
        tracing::warn!("ntdll version API unavailable, falling back to VerifyVersionInfoW");
        Arc::new(StandardSource)
    }
}

#[cfg(not(windows))]
fn select_source() -> Arc<dyn VersionSource> {
    tracing::debug!("No version source on this platform");
    Arc::new(UnavailableSource)
}

/// Source used where the Windows version API does not exist
#[cfg(not(windows))]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSource;

#[cfg(not(windows))]
impl VersionSource for UnavailableSource {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn os_info(&self) -> Result<OsInfo> {
        Err(UtilsError::detection_failed(
            "Windows version API is not available on this platform",
        ))
    }

    fn at_least_version(&self, _version: VersionTuple) -> bool {
        false
    }

    fn at_least_build(&self, _build: u32) -> bool {
        false
    }
}

/// A scripted OS for tests, benchmarks and dry runs
///
/// Probes answer from the real version and build; [`VersionSource::os_info`]
/// answers from the reported values, which default to the real ones and can
/// be lowered with [`SimulatedSource::reporting`] to model a compatibility
/// shim. Every probe is counted.
#[derive(Debug)]
pub struct SimulatedSource {
    actual: VersionTuple,
    actual_build: u32,
    native_nt: bool,
    reported: Option<OsInfo>,
    probes: AtomicUsize,
}

impl SimulatedSource {
    /// An NT workstation running `actual` / `build` that reports the truth
    pub fn new(actual: impl Into<VersionTuple>, build: u32) -> Self {
        let actual = actual.into();
        Self {
            actual,
            actual_build: build,
            native_nt: true,
            reported: Some(OsInfo {
                version: actual,
                build,
                platform_id: VER_PLATFORM_WIN32_NT,
                product_type: VER_NT_WORKSTATION,
            }),
            probes: AtomicUsize::new(0),
        }
    }

    /// Report `version` / `build` instead of the real values
    #[must_use]
    pub fn reporting(mut self, version: impl Into<VersionTuple>, build: u32) -> Self {
        if let Some(info) = self.reported.as_mut() {
            info.version = version.into();
            info.build = build;
        }
        self
    }

    /// Report a different platform id
    #[must_use]
    pub fn with_platform_id(mut self, platform_id: u32) -> Self {
        if let Some(info) = self.reported.as_mut() {
            info.platform_id = platform_id;
        }
        self
    }

    /// Report a different product type
    #[must_use]
    pub fn with_product_type(mut self, product_type: u8) -> Self {
        if let Some(info) = self.reported.as_mut() {
            info.product_type = product_type;
        }
        self
    }

    /// Make every version probe fail, as on a non-NT system
    #[must_use]
    pub fn not_nt(mut self) -> Self {
        self.native_nt = false;
        self.with_platform_id(1)
    }

    /// Make the info call fail
    #[must_use]
    pub fn without_info(mut self) -> Self {
        self.reported = None;
        self
    }

    /// Number of probes answered so far
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::Relaxed)
    }

    /// Reset the probe counter
    pub fn reset_probe_count(&self) {
        self.probes.store(0, Ordering::Relaxed);
    }
}

impl VersionSource for SimulatedSource {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn os_info(&self) -> Result<OsInfo> {
        self.reported
            .ok_or_else(|| UtilsError::detection_failed("simulated info call failure"))
    }

    fn at_least_version(&self, version: VersionTuple) -> bool {
        self.probes.fetch_add(1, Ordering::Relaxed);
        self.native_nt && self.actual >= version
    }

    fn at_least_build(&self, build: u32) -> bool {
        self.probes.fetch_add(1, Ordering::Relaxed);
        self.actual_build >= build
    }
}
