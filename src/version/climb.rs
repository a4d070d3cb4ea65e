//! Version and build climbing
//!
//! The version API can only answer "is the OS at least X?". Starting from what
//! the OS reports (a lower bound, possibly lowered by a compatibility shim),
//! the climbers probe upwards until a probe fails:
//!
//! - major, minor and service pack are climbed one unit at a time, in that
//!   order, each climb resetting the components below it,
//! - the build number is climbed with a step that starts large and halves on
//!   every failed probe, so a range of tens of thousands of builds costs a few
//!   dozen probes.
//!
//! Both climbs stop at a ceiling; reaching it means the probes cannot be
//! trusted and is reported as [`UtilsError::DetectionOverflow`].

use tracing::debug;

use crate::error::{Result, UtilsError};
use crate::version::source::VersionSource;
use crate::version::types::{
    BUILD_CEILING, OsBuild, OsInfo, OsVersion, VERSION_CEILING, VersionTuple,
};

/// Version adopted when the OS does not report the NT platform but passes this probe
pub const LEGACY_BASELINE: VersionTuple = VersionTuple::new(4, 0, 0);

/// Initial step of the build climb
pub const DEFAULT_BUILD_STEP: u32 = 4096;

/// Query the reported OS info, substituting the legacy baseline off-NT
///
/// Returns the info and whether it was overridden.
fn reported_info<S: VersionSource + ?Sized>(source: &S) -> Result<(OsInfo, bool)> {
    let info = source.os_info()?;
    if info.is_nt() {
        return Ok((info, false));
    }

    debug!(
        "OS reports platform id {}, probing legacy baseline {}",
        info.platform_id, LEGACY_BASELINE
    );
    if source.at_least_version(LEGACY_BASELINE) {
        Ok((
            OsInfo {
                version: LEGACY_BASELINE,
                build: 0,
                ..info
            },
            true,
        ))
    } else {
        Err(UtilsError::UnsupportedPlatform)
    }
}

/// Climb one version component from `current` in steps of one
///
/// Returns the highest value accepted by `probe`, or `None` if `current + 1`
/// was already rejected.
fn climb_component(
    current: u32,
    component: &'static str,
    mut probe: impl FnMut(u32) -> bool,
) -> Result<Option<u32>> {
    let mut value = current;
    while value < VERSION_CEILING && probe(value + 1) {
        value += 1;
    }

    if value >= VERSION_CEILING {
        return Err(UtilsError::DetectionOverflow(component));
    }
    if value == current {
        return Ok(None);
    }
    debug!("Climbed {component} from {current} to {value}");
    Ok(Some(value))
}

/// Determine the real OS version
pub fn climb_version<S: VersionSource + ?Sized>(source: &S) -> Result<OsVersion> {
    let (info, mut overridden) = reported_info(source)?;
    let mut version = info.version;
    debug!(
        "Climbing version from reported {} via {}",
        version,
        source.name()
    );

    if let Some(major) = climb_component(version.major, "major version", |next| {
        source.at_least_version(VersionTuple::new(next, 0, 0))
    })? {
        version = VersionTuple::new(major, 0, 0);
        overridden = true;
    }

    let major = version.major;
    if let Some(minor) = climb_component(version.minor, "minor version", |next| {
        source.at_least_version(VersionTuple::new(major, next, 0))
    })? {
        version.minor = minor;
        version.servicepack = 0;
        overridden = true;
    }

    let minor = version.minor;
    if let Some(servicepack) = climb_component(version.servicepack, "service pack", |next| {
        source.at_least_version(VersionTuple::new(major, minor, next))
    })? {
        version.servicepack = servicepack;
        overridden = true;
    }

    Ok(OsVersion {
        version,
        overridden,
    })
}

/// Determine the real OS build number
///
/// `initial_step` values below one are treated as one.
pub fn climb_build<S: VersionSource + ?Sized>(source: &S, initial_step: u32) -> Result<OsBuild> {
    let (info, mut overridden) = reported_info(source)?;
    let reported = info.build;
    let mut build = reported;
    let mut step = initial_step.max(1);

    loop {
        if build >= BUILD_CEILING {
            return Err(UtilsError::DetectionOverflow("build number"));
        }
        let next = build.saturating_add(step).min(BUILD_CEILING);
        if source.at_least_build(next) {
            build = next;
            overridden = true;
        } else if step > 1 {
            step /= 2;
        } else {
            break;
        }
    }

    if build != reported {
        debug!("Climbed build number from {reported} to {build}");
    }
    Ok(OsBuild { build, overridden })
}
