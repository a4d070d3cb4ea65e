//! Integration tests for real OS version detection
//!
//! These tests drive [`VersionDetector`] through simulated sources that model
//! compatibility shims, broken probe APIs and legacy platforms.

use instutils::error::UtilsError;
use instutils::version::types::{BUILD_CEILING, OsInfo, VER_NT_SERVER, VER_PLATFORM_WIN32_NT};
use instutils::version::{
    Comparison, DetectionState, SimulatedSource, UNKNOWN_NAME, VersionDetector, VersionSource,
    VersionTuple, friendly_name,
};
use std::sync::Arc;

/// A source whose probes always succeed, as a broken API might
struct AlwaysYes;

impl VersionSource for AlwaysYes {
    fn name(&self) -> &'static str {
        "always-yes"
    }

    fn os_info(&self) -> instutils::Result<OsInfo> {
        Ok(OsInfo {
            version: VersionTuple::new(6, 1, 0),
            build: 7601,
            platform_id: VER_PLATFORM_WIN32_NT,
            product_type: 1,
        })
    }

    fn at_least_version(&self, _version: VersionTuple) -> bool {
        true
    }

    fn at_least_build(&self, _build: u32) -> bool {
        true
    }
}

fn shimmed_windows7() -> Arc<SimulatedSource> {
    Arc::new(SimulatedSource::new((6, 1, 0), 7601).reporting((5, 1, 3), 2600))
}

/// Test that a shimmed Windows 7 is detected as 6.1 SP0
#[test]
fn test_detects_through_compatibility_shim() {
    let detector = VersionDetector::new(shimmed_windows7());

    let version = detector.real_os_version().expect("Detection should succeed");
    assert_eq!(version.version, VersionTuple::new(6, 1, 0));
    assert!(version.overridden, "Reported 5.1 must be flagged as overridden");

    let build = detector.real_os_build().expect("Build detection should succeed");
    assert_eq!(build.build, 7601);
    assert!(build.overridden);

    assert_eq!(detector.real_os_name().unwrap(), "Windows 7");
}

/// Test that repeated calls return the cached result without probing again
#[test]
fn test_detection_is_idempotent() {
    let source = shimmed_windows7();
    let detector = VersionDetector::new(source.clone());

    assert_eq!(detector.version_state(), DetectionState::Uninitialized);
    let first = detector.real_os_version().unwrap();
    assert_eq!(detector.version_state(), DetectionState::Cached);

    let probes = source.probe_count();
    let second = detector.real_os_version().unwrap();
    let third = detector.real_os_version().unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(source.probe_count(), probes, "Cached calls must not probe");
    assert_eq!(detector.stats().version_commits, 1);
}

/// Test that a source answering yes to everything is reported, not looped on
#[test]
fn test_always_true_probe_overflows() {
    let detector = VersionDetector::new(Arc::new(AlwaysYes));

    let result = detector.real_os_version();
    assert!(
        matches!(result, Err(UtilsError::DetectionOverflow("major version"))),
        "Expected major version overflow, got {result:?}"
    );

    let result = detector.real_os_build();
    assert!(
        matches!(result, Err(UtilsError::DetectionOverflow("build number"))),
        "Expected build number overflow, got {result:?}"
    );

    // Failures are not cached
    assert_eq!(detector.cached_version(), None);
    assert_eq!(detector.version_state(), DetectionState::Uninitialized);
}

/// Test that every initial step converges on the same build
#[test]
fn test_build_climb_converges_for_every_initial_step() {
    for shift in 0..=16 {
        let step = 1u32 << shift;
        let source = Arc::new(SimulatedSource::new((6, 1, 0), 7601).reporting((6, 0, 0), 0));
        let detector = VersionDetector::new(source.clone()).with_initial_build_step(step);

        let build = detector.real_os_build().unwrap();
        assert_eq!(build.build, 7601, "Initial step {step} converged on the wrong build");
        if step >= 16 {
            assert!(
                source.probe_count() < 7601,
                "Initial step {step} used {} probes",
                source.probe_count()
            );
        }
    }
}

/// Test that the default step finds high builds in few probes
#[test]
fn test_build_climb_is_cheap_with_default_step() {
    let source = Arc::new(SimulatedSource::new((10, 0, 0), 26100).reporting((6, 2, 0), 9200));
    let detector = VersionDetector::new(source.clone());

    assert_eq!(detector.real_os_build().unwrap().build, 26100);
    assert!(source.probe_count() < 64, "Used {} probes", source.probe_count());
}

/// Test the build climb at the top of the range
#[test]
fn test_build_at_ceiling_overflows() {
    let source = Arc::new(SimulatedSource::new((10, 0, 0), BUILD_CEILING));
    let detector = VersionDetector::new(source);
    assert!(matches!(
        detector.real_os_build(),
        Err(UtilsError::DetectionOverflow(_))
    ));
}

/// Test verify orderings for versions and builds
#[test]
fn test_verify_orderings() {
    let detector = VersionDetector::new(Arc::new(
        SimulatedSource::new((6, 1, 1), 7601).reporting((6, 0, 0), 6002),
    ));

    let cases = [
        (VersionTuple::new(6, 1, 1), Comparison::Ok),
        (VersionTuple::new(6, 1, 0), Comparison::Newer),
        (VersionTuple::new(6, 0, 2), Comparison::Newer),
        (VersionTuple::new(5, 9, 9), Comparison::Newer),
        (VersionTuple::new(6, 1, 2), Comparison::Older),
        (VersionTuple::new(6, 2, 0), Comparison::Older),
        (VersionTuple::new(10, 0, 0), Comparison::Older),
    ];
    for (expected, comparison) in cases {
        assert_eq!(
            detector.verify_real_os_version(expected).unwrap(),
            comparison,
            "Comparing against {expected}"
        );
    }

    assert_eq!(detector.verify_real_os_build(7601).unwrap(), Comparison::Ok);
    assert_eq!(detector.verify_real_os_build(7600).unwrap(), Comparison::Newer);
    assert_eq!(detector.verify_real_os_build(9200).unwrap(), Comparison::Older);
}

/// Test that non-NT platforms fall back to the legacy baseline
#[test]
fn test_legacy_platform_baseline() {
    let detector = VersionDetector::new(Arc::new(
        SimulatedSource::new((4, 0, 6), 1381).with_platform_id(1),
    ));
    let version = detector.real_os_version().unwrap();
    assert_eq!(version.version, VersionTuple::new(4, 0, 6));
    assert!(version.overridden);
    assert_eq!(detector.real_os_build().unwrap().build, 1381);

    let detector = VersionDetector::new(Arc::new(SimulatedSource::new((4, 10, 0), 1998).not_nt()));
    assert!(matches!(
        detector.real_os_version(),
        Err(UtilsError::UnsupportedPlatform)
    ));
}

/// Test that an info call failure surfaces as a detection failure
#[test]
fn test_info_failure() {
    let detector = VersionDetector::new(Arc::new(
        SimulatedSource::new((6, 1, 0), 7601).without_info(),
    ));
    assert!(matches!(
        detector.real_os_version(),
        Err(UtilsError::DetectionFailed(_))
    ));
    assert!(detector.server_edition().is_err());
}

/// Test the server classifier
#[test]
fn test_server_edition() {
    let workstation = VersionDetector::new(Arc::new(SimulatedSource::new((6, 1, 0), 7601)));
    assert!(!workstation.server_edition().unwrap());

    let server = VersionDetector::new(Arc::new(
        SimulatedSource::new((6, 1, 0), 7601).with_product_type(VER_NT_SERVER),
    ));
    assert!(server.server_edition().unwrap());
}

/// Test friendly names for known and unknown pairs
#[test]
fn test_friendly_names() {
    assert_eq!(friendly_name(5, 1), "Windows XP");
    assert_eq!(friendly_name(6, 0), "Windows Vista");
    assert_eq!(friendly_name(6, 1), "Windows 7");
    assert_eq!(friendly_name(6, 3), "Windows 8.1");
    assert_eq!(friendly_name(10, 0), "Windows 10");
    assert_eq!(friendly_name(7, 0), UNKNOWN_NAME);
    assert_eq!(friendly_name(6, 9), UNKNOWN_NAME);
}

/// Test that the global detector reports failure where the API is missing
#[test]
#[cfg(not(windows))]
fn test_global_detector_fails_off_windows() {
    let detector = instutils::version::detector::global();
    assert_eq!(detector.source_name(), "unavailable");
    assert!(matches!(
        detector.real_os_version(),
        Err(UtilsError::DetectionFailed(_))
    ));
    assert!(matches!(
        detector.real_os_build(),
        Err(UtilsError::DetectionFailed(_))
    ));
}

/// Test that real detection is stable on Windows
#[test]
#[cfg(windows)]
fn test_global_detector_on_windows() {
    let detector = instutils::version::detector::global();
    let version = detector.real_os_version().expect("Detection should succeed");
    assert!(version.version >= VersionTuple::new(6, 1, 0));
    assert_eq!(detector.real_os_version().unwrap(), version);
    assert!(detector.real_os_build().unwrap().build >= 7601);
}
