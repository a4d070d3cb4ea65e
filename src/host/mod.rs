//! Installer host binding
//!
//! Installer scripts talk to plugins through a shared string stack. This module
//! models that stack and maps the script-visible calls onto
//! [`crate::version::VersionDetector`].
//!
//! # Stack conventions
//!
//! - Arguments are popped in parameter order; scripts push them in reverse.
//!   All of a call's arguments are popped before any is validated, and a
//!   leading `-` is dropped from numbers.
//! - Results are pushed in reverse tuple order, so the first element of a
//!   result tuple is popped first. `GetRealOsVersion` leaves
//!   `major, minor, servicepack, override` to be popped in that order.
//! - Booleans travel as `"1"` / `"0"`.
//! - A failed call pushes one `"error"` per result slot, so a script pops the
//!   same number of values whether or not the call succeeded.

pub mod calls;
pub mod stack;

pub use calls::{HostCall, invoke, invoke_by_name};
pub use stack::{ERROR_SENTINEL, HostStack, parse_uint};
