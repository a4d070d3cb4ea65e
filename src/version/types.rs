//! Version data model

use std::fmt;

/// Highest value accepted for the major, minor and service pack components
pub const VERSION_CEILING: u32 = 0xFFFF;

/// Highest build number the build climb will reach
pub const BUILD_CEILING: u32 = i32::MAX.unsigned_abs();

/// `dwPlatformId` value of the Windows NT family
pub const VER_PLATFORM_WIN32_NT: u32 = 2;

/// `wProductType` value of a workstation edition
pub const VER_NT_WORKSTATION: u8 = 1;
/// `wProductType` value of a domain controller
pub const VER_NT_DOMAIN_CONTROLLER: u8 = 2;
/// `wProductType` value of a server edition
pub const VER_NT_SERVER: u8 = 3;

/// A `(major, minor, service pack)` version triple
///
/// Ordering is lexicographic, major first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionTuple {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Service pack major version
    pub servicepack: u32,
}

impl VersionTuple {
    /// Create a new version tuple
    pub const fn new(major: u32, minor: u32, servicepack: u32) -> Self {
        Self {
            major,
            minor,
            servicepack,
        }
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.servicepack > 0 {
            write!(f, " SP{}", self.servicepack)?;
        }
        Ok(())
    }
}

impl From<(u32, u32, u32)> for VersionTuple {
    fn from((major, minor, servicepack): (u32, u32, u32)) -> Self {
        Self::new(major, minor, servicepack)
    }
}

/// Detected OS version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsVersion {
    /// The real version
    pub version: VersionTuple,
    /// Whether the real version differs from what the OS reported
    pub overridden: bool,
}

/// Detected OS build number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsBuild {
    /// The real build number
    pub build: u32,
    /// Whether the real build differs from what the OS reported
    pub overridden: bool,
}

/// What the OS reports about itself through an info call
///
/// Under a compatibility shim these values may be lower than the truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OsInfo {
    /// Reported version triple
    pub version: VersionTuple,
    /// Reported build number
    pub build: u32,
    /// Reported platform id (`VER_PLATFORM_WIN32_NT` on every supported system)
    pub platform_id: u32,
    /// Reported product type (`VER_NT_*`)
    pub product_type: u8,
}

impl OsInfo {
    /// Whether the reported platform is the Windows NT family
    pub fn is_nt(&self) -> bool {
        self.platform_id == VER_PLATFORM_WIN32_NT
    }
}

/// Outcome of comparing the detected value against an expected one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// The running OS is older than expected
    Older,
    /// The running OS matches exactly
    Ok,
    /// The running OS is newer than expected
    Newer,
}

impl Comparison {
    /// Compare a detected value against the expected one
    pub fn of<T: Ord>(detected: &T, expected: &T) -> Self {
        match detected.cmp(expected) {
            std::cmp::Ordering::Less => Self::Older,
            std::cmp::Ordering::Equal => Self::Ok,
            std::cmp::Ordering::Greater => Self::Newer,
        }
    }

    /// The string handed back to installer scripts
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Older => "older",
            Self::Ok => "ok",
            Self::Newer => "newer",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_ordering_is_lexicographic() {
        assert!(VersionTuple::new(6, 1, 0) > VersionTuple::new(6, 0, 9));
        assert!(VersionTuple::new(10, 0, 0) > VersionTuple::new(6, 3, 0));
        assert!(VersionTuple::new(5, 1, 3) < VersionTuple::new(5, 2, 0));
    }

    #[test]
    fn test_comparison_strings() {
        let seven = VersionTuple::new(6, 1, 0);
        assert_eq!(Comparison::of(&seven, &VersionTuple::new(6, 0, 0)).as_str(), "newer");
        assert_eq!(Comparison::of(&seven, &seven).as_str(), "ok");
        assert_eq!(
            Comparison::of(&VersionTuple::new(5, 1, 0), &VersionTuple::new(6, 0, 0)).as_str(),
            "older"
        );
        assert_eq!(Comparison::of(&7601_u32, &7600_u32), Comparison::Newer);
    }

    #[test]
    fn test_tuple_display() {
        assert_eq!(VersionTuple::new(6, 1, 0).to_string(), "6.1");
        assert_eq!(VersionTuple::new(5, 1, 3).to_string(), "5.1 SP3");
    }

    #[test]
    fn test_os_info_platform() {
        let info = OsInfo {
            platform_id: VER_PLATFORM_WIN32_NT,
            ..OsInfo::default()
        };
        assert!(info.is_nt());
        assert!(!OsInfo::default().is_nt());
    }
}
