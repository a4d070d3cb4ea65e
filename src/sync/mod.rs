//! Mutual exclusion for process-wide state
//!
//! The detection cache is shared by every thread of the installer process. It is
//! protected by a [`CriticalSection`], a `parking_lot` mutex wrapped so that:
//!
//! - acquisition is scoped: a [`SectionGuard`] releases on every exit path,
//! - long operations run unlocked through [`SectionGuard::suspend`], which
//!   consumes the guard and hands back a [`SuspendedSection`] that can only be
//!   turned back into a guard by [`SuspendedSection::resume`],
//! - misuse of the explicit `unlock`/`relock` pair (double release, re-entrant
//!   acquisition) is a fatal protocol violation instead of a silent deadlock.

pub mod critical_section;

pub use critical_section::{CriticalSection, SectionGuard, SuspendedSection};
