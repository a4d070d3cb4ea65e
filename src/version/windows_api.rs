//! Windows version API bindings
//!
//! Two [`VersionSource`] implementations over the Win32 version API:
//!
//! - [`NativeSource`]: `RtlGetVersion` and `RtlVerifyVersionInfo` from
//!   `ntdll.dll`. These bypass the compatibility layer, so they report the real
//!   version even when the process runs under a shim. Both entry points are
//!   resolved once in [`NativeSource::load`].
//! - [`StandardSource`]: the documented `GetVersionExW` and `VerifyVersionInfoW`
//!   from kernel32, used when the ntdll entry points cannot be resolved.
//!
//! Every verification call only supports "greater or equal" style comparisons,
//! hence the climbing in [`super::climb`].

use std::mem::{size_of, transmute};

use windows::Win32::Foundation::ERROR_OLD_WIN_VERSION;
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};
use windows::Win32::System::SystemInformation::{
    GetVersionExW, OSVERSIONINFOEXW, OSVERSIONINFOW, VER_BUILDNUMBER, VER_FLAGS, VER_MAJORVERSION,
    VER_MINORVERSION, VER_PLATFORMID, VER_SERVICEPACKMAJOR, VerSetConditionMask,
    VerifyVersionInfoW,
};
use windows::core::{HSTRING, s};

use crate::error::{Result, UtilsError};
use crate::utils::notice;
use crate::version::source::VersionSource;
use crate::version::types::{OsInfo, VER_PLATFORM_WIN32_NT, VersionTuple};

/// `VER_EQUAL` condition
const VER_EQUAL: u8 = 1;
/// `VER_GREATER_EQUAL` condition
const VER_GREATER_EQUAL: u8 = 3;

const STATUS_SUCCESS: i32 = 0;
/// Returned by `RtlVerifyVersionInfo` when the OS is older than requested
#[expect(
    clippy::cast_possible_wrap,
    reason = "NTSTATUS values are defined as unsigned hex literals"
)]
const STATUS_REVISION_MISMATCH: i32 = 0xC000_0059_u32 as i32;

#[expect(
    clippy::cast_possible_truncation,
    reason = "size_of::<OSVERSIONINFOEXW>() is a compile-time constant that fits in u32"
)]
const VERSION_INFO_SIZE: u32 = size_of::<OSVERSIONINFOEXW>() as u32;

type RtlGetVersionFn = unsafe extern "system" fn(*mut OSVERSIONINFOEXW) -> i32;
type RtlVerifyVersionInfoFn = unsafe extern "system" fn(*mut OSVERSIONINFOEXW, u32, u64) -> i32;
type RawProc = unsafe extern "system" fn() -> isize;

/// A prepared verification call
struct VersionRequest {
    info: OSVERSIONINFOEXW,
    type_mask: VER_FLAGS,
    condition_mask: u64,
}

impl VersionRequest {
    /// "NT family, at least `version`"
    fn at_least_version(version: VersionTuple) -> Self {
        let info = OSVERSIONINFOEXW {
            dwOSVersionInfoSize: VERSION_INFO_SIZE,
            dwMajorVersion: version.major,
            dwMinorVersion: version.minor,
            wServicePackMajor: u16::try_from(version.servicepack).unwrap_or(u16::MAX),
            dwPlatformId: VER_PLATFORM_WIN32_NT,
            ..Default::default()
        };
        Self::new(
            info,
            &[
                (VER_MAJORVERSION, VER_GREATER_EQUAL),
                (VER_MINORVERSION, VER_GREATER_EQUAL),
                (VER_SERVICEPACKMAJOR, VER_GREATER_EQUAL),
                (VER_PLATFORMID, VER_EQUAL),
            ],
        )
    }

    /// "build number at least `build`"
    fn at_least_build(build: u32) -> Self {
        let info = OSVERSIONINFOEXW {
            dwOSVersionInfoSize: VERSION_INFO_SIZE,
            dwBuildNumber: build,
            ..Default::default()
        };
        Self::new(info, &[(VER_BUILDNUMBER, VER_GREATER_EQUAL)])
    }

    #[expect(unsafe_code, reason = "VerSetConditionMask is a pure Win32 helper")]
    fn new(info: OSVERSIONINFOEXW, conditions: &[(VER_FLAGS, u8)]) -> Self {
        let mut type_mask = VER_FLAGS(0);
        let mut condition_mask = 0_u64;
        for &(flag, condition) in conditions {
            type_mask = type_mask | flag;
            // SAFETY: VerSetConditionMask only computes a bit mask from its arguments
            condition_mask = unsafe { VerSetConditionMask(condition_mask, flag, condition) };
        }
        Self {
            info,
            type_mask,
            condition_mask,
        }
    }
}

fn os_info_from(info: &OSVERSIONINFOEXW) -> OsInfo {
    OsInfo {
        version: VersionTuple::new(
            info.dwMajorVersion,
            info.dwMinorVersion,
            u32::from(info.wServicePackMajor),
        ),
        build: info.dwBuildNumber,
        platform_id: info.dwPlatformId,
        product_type: info.wProductType,
    }
}

fn report_probe_failure(api: &str, detail: &str) {
    notice::notify("instutils", &format!("{api} failed: {detail}"));
}

/// Version source backed by the unfiltered ntdll entry points
pub struct NativeSource {
    get_version: RtlGetVersionFn,
    verify_version_info: RtlVerifyVersionInfoFn,
}

impl NativeSource {
    /// Resolve `RtlGetVersion` and `RtlVerifyVersionInfo`
    ///
    /// Returns `None` when either entry point is missing.
    #[expect(
        unsafe_code,
        reason = "Required for Windows FFI to resolve the ntdll version functions"
    )]
    pub fn load() -> Option<Self> {
        // SAFETY: both pointers come from GetProcAddress on ntdll and are
        // transmuted to their documented signatures
        unsafe {
            let ntdll = LoadLibraryW(&HSTRING::from("ntdll.dll")).ok()?;
            let get_version = GetProcAddress(ntdll, s!("RtlGetVersion"))?;
            let verify_version_info = GetProcAddress(ntdll, s!("RtlVerifyVersionInfo"))?;
            Some(Self {
                get_version: transmute::<RawProc, RtlGetVersionFn>(get_version),
                verify_version_info: transmute::<RawProc, RtlVerifyVersionInfoFn>(
                    verify_version_info,
                ),
            })
        }
    }

    #[expect(
        unsafe_code,
        reason = "Calls RtlVerifyVersionInfo with a correctly sized OSVERSIONINFOEXW"
    )]
    fn verify(&self, mut request: VersionRequest) -> bool {
        // SAFETY: request.info is a stack value with dwOSVersionInfoSize set
        let status = unsafe {
            (self.verify_version_info)(
                &raw mut request.info,
                request.type_mask.0,
                request.condition_mask,
            )
        };
        match status {
            STATUS_SUCCESS => true,
            STATUS_REVISION_MISMATCH => false,
            other => {
                report_probe_failure("RtlVerifyVersionInfo", &format!("status {other:#010x}"));
                false
            }
        }
    }
}

impl VersionSource for NativeSource {
    fn name(&self) -> &'static str {
        "ntdll"
    }

    #[expect(
        unsafe_code,
        reason = "Calls RtlGetVersion with a correctly sized OSVERSIONINFOEXW"
    )]
    fn os_info(&self) -> Result<OsInfo> {
        let mut info = OSVERSIONINFOEXW {
            dwOSVersionInfoSize: VERSION_INFO_SIZE,
            ..Default::default()
        };
        // SAFETY: info is a stack value with dwOSVersionInfoSize set
        let status = unsafe { (self.get_version)(&raw mut info) };
        if status != STATUS_SUCCESS {
            return Err(UtilsError::detection_failed(format!(
                "RtlGetVersion failed with status: {status:#010x}"
            )));
        }
        Ok(os_info_from(&info))
    }

    fn at_least_version(&self, version: VersionTuple) -> bool {
        self.verify(VersionRequest::at_least_version(version))
    }

    fn at_least_build(&self, build: u32) -> bool {
        self.verify(VersionRequest::at_least_build(build))
    }
}

/// Version source backed by the documented kernel32 API
///
/// `GetVersionExW` is subject to compatibility shims; `VerifyVersionInfoW` is
/// what makes the climb correct anyway.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardSource;

impl StandardSource {
    #[expect(
        unsafe_code,
        reason = "Calls VerifyVersionInfoW with a correctly sized OSVERSIONINFOEXW"
    )]
    fn verify(mut request: VersionRequest) -> bool {
        // SAFETY: request.info is a stack value with dwOSVersionInfoSize set
        let result = unsafe {
            VerifyVersionInfoW(
                &raw mut request.info,
                request.type_mask,
                request.condition_mask,
            )
        };
        match result {
            Ok(()) => true,
            Err(e) if e.code() == ERROR_OLD_WIN_VERSION.to_hresult() => false,
            Err(e) => {
                report_probe_failure("VerifyVersionInfoW", &e.to_string());
                false
            }
        }
    }
}

impl VersionSource for StandardSource {
    fn name(&self) -> &'static str {
        "kernel32"
    }

    #[expect(
        unsafe_code,
        reason = "Calls GetVersionExW with an OSVERSIONINFOEXW, which extends OSVERSIONINFOW"
    )]
    fn os_info(&self) -> Result<OsInfo> {
        let mut info = OSVERSIONINFOEXW {
            dwOSVersionInfoSize: VERSION_INFO_SIZE,
            ..Default::default()
        };
        // SAFETY: the size field tells GetVersionExW it may fill the extended layout
        unsafe { GetVersionExW((&raw mut info).cast::<OSVERSIONINFOW>()) }
            .map_err(|e| UtilsError::DetectionFailed(Box::new(e)))?;
        Ok(os_info_from(&info))
    }

    fn at_least_version(&self, version: VersionTuple) -> bool {
        Self::verify(VersionRequest::at_least_version(version))
    }

    fn at_least_build(&self, build: u32) -> bool {
        Self::verify(VersionRequest::at_least_build(build))
    }
}
