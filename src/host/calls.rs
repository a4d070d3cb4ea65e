//! Host call dispatch
//!
//! Each call pops all of its arguments in parameter order (the script pushes
//! them in reverse) before validating any of them, runs, and pushes its results
//! in reverse tuple order so the script pops them first-to-last. A failed call
//! pushes one [`ERROR_SENTINEL`] per result slot and raises a verbose notice,
//! so the stack depth after a call never depends on whether it succeeded.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, UtilsError};
use crate::host::stack::{ERROR_SENTINEL, HostStack, parse_uint};
use crate::utils::notice;
use crate::version::{VersionDetector, VersionTuple, friendly_name};

/// Calls an installer script can make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCall {
    /// Pushes override, service pack, minor, major
    GetRealOsVersion,
    /// Pushes override, build
    GetRealOsBuildNo,
    /// Pushes the friendly name of the real version
    GetRealOsName,
    /// Pops major, minor; pushes their friendly name
    GetOsFriendlyName,
    /// Pushes `"server"` or `"workstation"`
    GetOsEdition,
    /// Pops major, minor, service pack; pushes `"older"`, `"ok"` or `"newer"`
    VerifyRealOsVersion,
    /// Pops build; pushes `"older"`, `"ok"` or `"newer"`
    VerifyRealOsBuildNo,
    /// Turns verbose notices on
    EnableVerboseMode,
    /// Turns verbose notices off
    DisableVerboseMode,
    /// Pushes the library version
    GetLibVersion,
}

impl HostCall {
    /// Every call, in declaration order
    pub const ALL: [Self; 10] = [
        Self::GetRealOsVersion,
        Self::GetRealOsBuildNo,
        Self::GetRealOsName,
        Self::GetOsFriendlyName,
        Self::GetOsEdition,
        Self::VerifyRealOsVersion,
        Self::VerifyRealOsBuildNo,
        Self::EnableVerboseMode,
        Self::DisableVerboseMode,
        Self::GetLibVersion,
    ];

    /// The name scripts use for this call
    pub fn name(self) -> &'static str {
        match self {
            Self::GetRealOsVersion => "GetRealOsVersion",
            Self::GetRealOsBuildNo => "GetRealOsBuildNo",
            Self::GetRealOsName => "GetRealOsName",
            Self::GetOsFriendlyName => "GetOsFriendlyName",
            Self::GetOsEdition => "GetOsEdition",
            Self::VerifyRealOsVersion => "VerifyRealOsVersion",
            Self::VerifyRealOsBuildNo => "VerifyRealOsBuildNo",
            Self::EnableVerboseMode => "EnableVerboseMode",
            Self::DisableVerboseMode => "DisableVerboseMode",
            Self::GetLibVersion => "GetLibVersion",
        }
    }

    /// Number of values the call pops
    pub fn arg_count(self) -> usize {
        match self {
            Self::VerifyRealOsVersion => 3,
            Self::GetOsFriendlyName => 2,
            Self::VerifyRealOsBuildNo => 1,
            _ => 0,
        }
    }

    /// Number of values the call pushes, on success and on failure alike
    pub fn result_count(self) -> usize {
        match self {
            Self::GetRealOsVersion => 4,
            Self::GetRealOsBuildNo => 2,
            Self::EnableVerboseMode | Self::DisableVerboseMode => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for HostCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HostCall {
    type Err = UtilsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|call| call.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UtilsError::UnknownCall(s.to_string()))
    }
}

/// Run `call` against `detector`, exchanging values through `stack`
pub fn invoke(detector: &VersionDetector, call: HostCall, stack: &mut HostStack) {
    let outcome = stack
        .pop_many(call.arg_count())
        .and_then(|args| run(detector, call, &args));

    match outcome {
        Ok(results) => {
            debug_assert_eq!(results.len(), call.result_count());
            for value in results.into_iter().rev() {
                stack.push_str(value);
            }
        }
        Err(e) => {
            notice::notify_error(call.name(), &e);
            for _ in 0..call.result_count() {
                stack.push_str(ERROR_SENTINEL);
            }
        }
    }
}

/// Look up a call by name and [`invoke`] it
///
/// Unknown names push a single [`ERROR_SENTINEL`].
pub fn invoke_by_name(detector: &VersionDetector, name: &str, stack: &mut HostStack) {
    match name.parse() {
        Ok(call) => invoke(detector, call, stack),
        Err(e) => {
            notice::notify_error(name, &e);
            stack.push_str(ERROR_SENTINEL);
        }
    }
}

/// Parse every argument, first popped first
fn uint_args<const N: usize>(args: &[String]) -> Result<[u32; N]> {
    let mut values = [0; N];
    for (value, raw) in values.iter_mut().zip(args) {
        *value = parse_uint(raw)?;
    }
    Ok(values)
}

fn flag(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}

/// Run `call` with its popped `args`, returning results in tuple order
fn run(detector: &VersionDetector, call: HostCall, args: &[String]) -> Result<Vec<String>> {
    let results = match call {
        HostCall::GetRealOsVersion => {
            let detected = detector.real_os_version()?;
            vec![
                detected.version.major.to_string(),
                detected.version.minor.to_string(),
                detected.version.servicepack.to_string(),
                flag(detected.overridden),
            ]
        }
        HostCall::GetRealOsBuildNo => {
            let detected = detector.real_os_build()?;
            vec![detected.build.to_string(), flag(detected.overridden)]
        }
        HostCall::GetRealOsName => vec![detector.real_os_name()?.to_string()],
        HostCall::GetOsFriendlyName => {
            let [major, minor] = uint_args(args)?;
            vec![friendly_name(major, minor).to_string()]
        }
        HostCall::GetOsEdition => {
            let edition = if detector.server_edition()? {
                "server"
            } else {
                "workstation"
            };
            vec![edition.to_string()]
        }
        HostCall::VerifyRealOsVersion => {
            let [major, minor, servicepack] = uint_args(args)?;
            let comparison =
                detector.verify_real_os_version(VersionTuple::new(major, minor, servicepack))?;
            vec![comparison.as_str().to_string()]
        }
        HostCall::VerifyRealOsBuildNo => {
            let [build] = uint_args(args)?;
            vec![detector.verify_real_os_build(build)?.as_str().to_string()]
        }
        HostCall::EnableVerboseMode => {
            notice::set_verbose(true);
            Vec::new()
        }
        HostCall::DisableVerboseMode => {
            notice::set_verbose(false);
            Vec::new()
        }
        HostCall::GetLibVersion => vec![env!("CARGO_PKG_VERSION").to_string()],
    };
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SimulatedSource;
    use std::sync::Arc;

    fn windows7_detector() -> VersionDetector {
        VersionDetector::new(Arc::new(
            SimulatedSource::new((6, 1, 1), 7601).reporting((6, 0, 0), 6002),
        ))
    }

    #[test]
    fn test_call_names_round_trip() {
        for call in HostCall::ALL {
            assert_eq!(call.name().parse::<HostCall>().unwrap(), call);
        }
        assert_eq!(
            "getrealosversion".parse::<HostCall>().unwrap(),
            HostCall::GetRealOsVersion
        );
        assert!(matches!(
            "Frobnicate".parse::<HostCall>(),
            Err(UtilsError::UnknownCall(_))
        ));
    }

    #[test]
    fn test_version_push_order() {
        let detector = windows7_detector();
        let mut stack = HostStack::new();
        invoke(&detector, HostCall::GetRealOsVersion, &mut stack);
        assert_eq!(stack.drain(), vec!["6", "1", "1", "1"]);
    }

    #[test]
    fn test_build_push_order() {
        let detector = windows7_detector();
        let mut stack = HostStack::new();
        invoke(&detector, HostCall::GetRealOsBuildNo, &mut stack);
        assert_eq!(stack.drain(), vec!["7601", "1"]);
    }

    #[test]
    fn test_verify_pops_in_parameter_order() {
        let detector = windows7_detector();
        let mut stack = HostStack::new();
        // Script pushes service pack, minor, major
        stack.push_uint(0);
        stack.push_uint(1);
        stack.push_uint(6);
        invoke(&detector, HostCall::VerifyRealOsVersion, &mut stack);
        assert_eq!(stack.drain(), vec!["newer"]);
    }

    #[test]
    fn test_friendly_name_call() {
        let detector = windows7_detector();
        let mut stack = HostStack::new();
        stack.push_uint(1);
        stack.push_uint(6);
        invoke(&detector, HostCall::GetOsFriendlyName, &mut stack);
        assert_eq!(stack.drain(), vec!["Windows 7"]);
    }

    #[test]
    fn test_bad_argument_pushes_sentinel() {
        let detector = windows7_detector();
        let mut stack = HostStack::new();
        stack.push_str("not-a-build");
        invoke(&detector, HostCall::VerifyRealOsBuildNo, &mut stack);
        assert_eq!(stack.drain(), vec![ERROR_SENTINEL]);
    }

    #[test]
    fn test_failed_detection_keeps_stack_balanced() {
        let detector = VersionDetector::new(Arc::new(
            SimulatedSource::new((6, 1, 0), 7601).without_info(),
        ));
        let calls = HostCall::ALL.into_iter().filter(|call| {
            !matches!(
                call,
                HostCall::EnableVerboseMode | HostCall::DisableVerboseMode
            )
        });
        for call in calls {
            let mut stack = HostStack::new();
            stack.push_str("caller-owned");
            for _ in 0..call.arg_count() {
                stack.push_uint(1);
            }
            invoke(&detector, call, &mut stack);
            assert_eq!(stack.len(), call.result_count() + 1, "{call}");
            assert_eq!(
                stack.drain().last().map(String::as_str),
                Some("caller-owned")
            );
        }
    }

    #[test]
    fn test_version_failure_pushes_four_sentinels() {
        let detector = VersionDetector::new(Arc::new(
            SimulatedSource::new((6, 1, 0), 7601).without_info(),
        ));
        let mut stack = HostStack::new();
        invoke(&detector, HostCall::GetRealOsVersion, &mut stack);
        assert_eq!(stack.drain(), vec![ERROR_SENTINEL; 4]);

        invoke(&detector, HostCall::GetRealOsBuildNo, &mut stack);
        assert_eq!(stack.drain(), vec![ERROR_SENTINEL; 2]);
    }

    #[test]
    fn test_bad_argument_consumes_all_arguments() {
        let detector = windows7_detector();
        let mut stack = HostStack::new();
        stack.push_str("caller-owned");
        stack.push_uint(0);
        stack.push_uint(1);
        stack.push_str("x");
        invoke(&detector, HostCall::VerifyRealOsVersion, &mut stack);
        assert_eq!(stack.drain(), vec![ERROR_SENTINEL, "caller-owned"]);
    }

    #[test]
    fn test_negative_arguments_taken_by_magnitude() {
        let detector = windows7_detector();
        let mut stack = HostStack::new();
        stack.push_str("-7601");
        invoke(&detector, HostCall::VerifyRealOsBuildNo, &mut stack);
        assert_eq!(stack.drain(), vec!["ok"]);
    }

    #[test]
    fn test_lib_version() {
        let detector = windows7_detector();
        let mut stack = HostStack::new();
        invoke(&detector, HostCall::GetLibVersion, &mut stack);
        assert_eq!(stack.drain(), vec![env!("CARGO_PKG_VERSION")]);
    }

    #[test]
    fn test_unknown_call_pushes_sentinel() {
        let detector = windows7_detector();
        let mut stack = HostStack::new();
        invoke_by_name(&detector, "ExecShellAsUser", &mut stack);
        assert_eq!(stack.drain(), vec![ERROR_SENTINEL]);
    }
}
