//! Cached, thread-safe OS version detection
//!
//! [`VersionDetector`] owns a [`VersionSource`] and a cache holding at most one
//! detected version and one detected build number. Each slot goes through
//! `Uninitialized -> Detecting -> Cached` (see [`DetectionState`]):
//!
//! 1. the cache is checked inside the critical section,
//! 2. on a miss the climb is registered as in flight, the section is suspended
//!    and the climb runs unlocked,
//! 3. the section is resumed, the climb unregistered and the result committed,
//!    unless another thread committed first, in which case the local result is
//!    discarded and the cached one returned.
//!
//! Failed detections are not cached; the slot falls back to `Uninitialized`
//! once no other climb is in flight and the next call climbs again. Cached values
//! are never invalidated since the OS version cannot change at runtime.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::error::{Result, UtilsError};
use crate::sync::CriticalSection;
use crate::version::climb::{DEFAULT_BUILD_STEP, climb_build, climb_version};
use crate::version::names::friendly_name;
use crate::version::source::{VersionSource, system_source};
use crate::version::types::{
    Comparison, OsBuild, OsVersion, VER_NT_DOMAIN_CONTROLLER, VER_NT_SERVER, VER_NT_WORKSTATION,
    VersionTuple,
};

/// Counters describing the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Versions written to the cache (0 or 1)
    pub version_commits: usize,
    /// Build numbers written to the cache (0 or 1)
    pub build_commits: usize,
    /// Results thrown away because another thread committed first
    pub discarded: usize,
}

/// Detection state of one cache slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionState {
    /// Nothing detected yet and no climb running
    Uninitialized,
    /// At least one thread is climbing, nothing committed yet
    Detecting,
    /// A value has been committed
    Cached,
}

impl DetectionState {
    fn of<T>(slot: Option<T>, in_flight: usize) -> Self {
        match (slot, in_flight) {
            (Some(_), _) => Self::Cached,
            (None, 0) => Self::Uninitialized,
            (None, _) => Self::Detecting,
        }
    }
}

#[derive(Debug, Default)]
struct DetectionCache {
    version: Option<OsVersion>,
    build: Option<OsBuild>,
    /// Version climbs currently running unlocked
    version_climbs: usize,
    /// Build climbs currently running unlocked
    build_climbs: usize,
    stats: CacheStats,
}

/// First-writer-wins commit into a cache slot
///
/// Returns the cached value and whether `detected` became it.
fn commit<T: Copy + fmt::Debug>(
    slot: &mut Option<T>,
    detected: T,
    commits: &mut usize,
    discarded: &mut usize,
) -> (T, bool) {
    if let Some(winner) = *slot {
        debug!("Discarding {detected:?}, cache already holds {winner:?}");
        *discarded += 1;
        (winner, false)
    } else {
        *slot = Some(detected);
        *commits += 1;
        (detected, true)
    }
}

/// Detects and caches the real OS version and build number
pub struct VersionDetector {
    source: Arc<dyn VersionSource>,
    initial_build_step: u32,
    cache: CriticalSection<DetectionCache>,
}

impl VersionDetector {
    /// Create a detector over `source`
    pub fn new(source: Arc<dyn VersionSource>) -> Self {
        Self {
            source,
            initial_build_step: DEFAULT_BUILD_STEP,
            cache: CriticalSection::default(),
        }
    }

    /// Create a detector over the process-wide [`system_source`]
    pub fn system() -> Self {
        Self::new(system_source())
    }

    /// Set the initial step of the build climb
    #[must_use]
    pub fn with_initial_build_step(mut self, step: u32) -> Self {
        self.initial_build_step = step.max(1);
        self
    }

    /// Name of the underlying source
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// The real OS version
    pub fn real_os_version(&self) -> Result<OsVersion> {
        let mut cache = self.cache.enter();
        if let Some(cached) = cache.version {
            return Ok(cached);
        }
        cache.version_climbs += 1;

        let suspended = cache.suspend();
        let detected = climb_version(self.source.as_ref());
        let mut cache = suspended.resume();
        cache.version_climbs -= 1;
        let detected = detected?;

        let cache = &mut *cache;
        let (version, committed) = commit(
            &mut cache.version,
            detected,
            &mut cache.stats.version_commits,
            &mut cache.stats.discarded,
        );
        if committed {
            info!(
                "Detected Windows {} (override: {})",
                version.version, version.overridden
            );
        }
        Ok(version)
    }

    /// The real OS build number
    pub fn real_os_build(&self) -> Result<OsBuild> {
        let mut cache = self.cache.enter();
        if let Some(cached) = cache.build {
            return Ok(cached);
        }
        cache.build_climbs += 1;

        let suspended = cache.suspend();
        let detected = climb_build(self.source.as_ref(), self.initial_build_step);
        let mut cache = suspended.resume();
        cache.build_climbs -= 1;
        let detected = detected?;

        let cache = &mut *cache;
        let (build, committed) = commit(
            &mut cache.build,
            detected,
            &mut cache.stats.build_commits,
            &mut cache.stats.discarded,
        );
        if committed {
            info!(
                "Detected Windows build {} (override: {})",
                build.build, build.overridden
            );
        }
        Ok(build)
    }

    /// Compare the real OS version against `expected`
    pub fn verify_real_os_version(&self, expected: VersionTuple) -> Result<Comparison> {
        let detected = self.real_os_version()?;
        Ok(Comparison::of(&detected.version, &expected))
    }

    /// Compare the real OS build number against `expected`
    pub fn verify_real_os_build(&self, expected: u32) -> Result<Comparison> {
        let detected = self.real_os_build()?;
        Ok(Comparison::of(&detected.build, &expected))
    }

    /// Friendly name of the real OS version
    pub fn real_os_name(&self) -> Result<&'static str> {
        let detected = self.real_os_version()?;
        Ok(friendly_name(detected.version.major, detected.version.minor))
    }

    /// Whether the OS is a server edition (domain controllers included)
    ///
    /// Not cached; each call queries the source once.
    pub fn server_edition(&self) -> Result<bool> {
        let info = self.source.os_info()?;
        match info.product_type {
            VER_NT_WORKSTATION => Ok(false),
            VER_NT_DOMAIN_CONTROLLER | VER_NT_SERVER => Ok(true),
            other => Err(UtilsError::detection_failed(format!(
                "Unrecognized product type: {other}"
            ))),
        }
    }

    /// The cached version, if detection already completed
    pub fn cached_version(&self) -> Option<OsVersion> {
        self.cache.enter().version
    }

    /// The cached build number, if detection already completed
    pub fn cached_build(&self) -> Option<OsBuild> {
        self.cache.enter().build
    }

    /// State of the version slot
    pub fn version_state(&self) -> DetectionState {
        let cache = self.cache.enter();
        DetectionState::of(cache.version, cache.version_climbs)
    }

    /// State of the build slot
    pub fn build_state(&self) -> DetectionState {
        let cache = self.cache.enter();
        DetectionState::of(cache.build, cache.build_climbs)
    }

    /// Cache counters
    pub fn stats(&self) -> CacheStats {
        self.cache.enter().stats
    }
}

impl fmt::Debug for VersionDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionDetector")
            .field("source", &self.source.name())
            .field("initial_build_step", &self.initial_build_step)
            .finish_non_exhaustive()
    }
}

static GLOBAL: OnceLock<VersionDetector> = OnceLock::new();

/// Install the process-wide detector
///
/// Succeeds once, and only before the first call to [`global`]. On failure the
/// rejected detector is handed back.
pub fn install(detector: VersionDetector) -> std::result::Result<(), VersionDetector> {
    GLOBAL.set(detector)
}

/// The process-wide detector
///
/// Defaults to [`VersionDetector::system`] if nothing was installed.
pub fn global() -> &'static VersionDetector {
    GLOBAL.get_or_init(VersionDetector::system)
}
