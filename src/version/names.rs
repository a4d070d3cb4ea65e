//! Friendly names for known Windows versions

use tracing::debug;

/// Returned for versions missing from the table
pub const UNKNOWN_NAME: &str = "unknown";

/// `(major, minor)` to display name
///
/// Windows 11 and Server 2016+ still report 10.0; telling them apart needs the
/// build number.
const FRIENDLY_NAMES: &[(u32, u32, &str)] = &[
    (3, 10, "Windows NT 3.1"),
    (3, 50, "Windows NT 3.5"),
    (3, 51, "Windows NT 3.51"),
    (4, 0, "Windows NT 4.0"),
    (5, 0, "Windows 2000"),
    (5, 1, "Windows XP"),
    (5, 2, "Windows XP x64"),
    (6, 0, "Windows Vista"),
    (6, 1, "Windows 7"),
    (6, 2, "Windows 8"),
    (6, 3, "Windows 8.1"),
    (6, 4, "Windows 10 Preview"),
    (10, 0, "Windows 10"),
];

/// Look up the display name of a `(major, minor)` pair
///
/// Never fails; unknown pairs yield [`UNKNOWN_NAME`].
pub fn friendly_name(major: u32, minor: u32) -> &'static str {
    FRIENDLY_NAMES
        .iter()
        .find(|&&(ma, mi, _)| ma == major && mi == minor)
        .map_or_else(
            || {
                debug!("No friendly name for Windows {major}.{minor}");
                UNKNOWN_NAME
            },
            |&(_, _, name)| name,
        )
}
