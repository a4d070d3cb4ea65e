//! Scoped critical section with suspend/resume support

use parking_lot::{Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::UtilsError;

/// Owner value meaning "nobody holds the section"
const NO_OWNER: usize = 0;

/// Returns a value unique to the calling thread for as long as it lives
///
/// The address of a thread-local is never zero, so it never collides with
/// [`NO_OWNER`].
fn thread_token() -> usize {
    thread_local! {
        static TOKEN: u8 = const { 0 };
    }
    TOKEN.with(|token| std::ptr::from_ref(token) as usize)
}

/// Raises the non-continuable fault for a broken lock protocol
#[cold]
#[track_caller]
fn protocol_violation(what: &'static str) -> ! {
    let error = UtilsError::ProtocolViolation(what);
    tracing::error!("{error}");
    panic!("{error}");
}

/// Process-wide critical section guarding a value of type `T`
pub struct CriticalSection<T> {
    inner: Mutex<T>,
    /// Token of the owning thread, [`NO_OWNER`] when released
    owner: AtomicUsize,
}

impl<T> CriticalSection<T> {
    /// Create a new, released critical section
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
            owner: AtomicUsize::new(NO_OWNER),
        }
    }

    /// Enter the critical section, blocking until it is available
    ///
    /// # Panics
    ///
    /// Panics with a protocol violation if the calling thread already holds
    /// the section.
    #[track_caller]
    pub fn enter(&self) -> SectionGuard<'_, T> {
        SectionGuard {
            section: self,
            guard: Some(self.acquire()),
        }
    }

    /// Whether any thread currently holds the section
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    #[track_caller]
    fn acquire(&self) -> MutexGuard<'_, T> {
        let me = thread_token();
        if self.owner.load(Ordering::Acquire) == me {
            protocol_violation("re-entrant acquisition by the owning thread");
        }
        let guard = self.inner.lock();
        self.owner.store(me, Ordering::Release);
        guard
    }

    fn release(&self, guard: MutexGuard<'_, T>) {
        // Clear the owner before the mutex can be handed to the next thread
        self.owner.store(NO_OWNER, Ordering::Release);
        drop(guard);
    }
}

impl<T: Default> Default for CriticalSection<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Proof that the current thread holds a [`CriticalSection`]
///
/// The section is released when the guard is dropped. [`SectionGuard::unlock`]
/// and [`SectionGuard::relock`] allow an explicit release while keeping the
/// guard around; every access to the protected value in between is a
/// protocol violation.
pub struct SectionGuard<'a, T> {
    section: &'a CriticalSection<T>,
    guard: Option<MutexGuard<'a, T>>,
}

impl<'a, T> SectionGuard<'a, T> {
    /// Release the section without giving up the guard
    ///
    /// # Panics
    ///
    /// Panics with a protocol violation if the section is already released.
    #[track_caller]
    pub fn unlock(&mut self) {
        match self.guard.take() {
            Some(guard) => self.section.release(guard),
            None => protocol_violation("release without acquisition"),
        }
    }

    /// Re-acquire a section previously released with [`SectionGuard::unlock`]
    ///
    /// # Panics
    ///
    /// Panics with a protocol violation if the section is still held.
    #[track_caller]
    pub fn relock(&mut self) {
        if self.guard.is_some() {
            protocol_violation("re-acquisition without release");
        }
        self.guard = Some(self.section.acquire());
    }

    /// Whether this guard currently holds the section
    pub fn is_held(&self) -> bool {
        self.guard.is_some()
    }

    /// Release the section for the duration of a long operation
    ///
    /// The returned token is the only way back into the section, so a
    /// suspended section cannot be released twice or accessed by mistake.
    #[track_caller]
    pub fn suspend(mut self) -> SuspendedSection<'a, T> {
        self.unlock();
        SuspendedSection {
            section: self.section,
        }
    }
}

impl<T> Deref for SectionGuard<'_, T> {
    type Target = T;

    #[track_caller]
    fn deref(&self) -> &T {
        match &self.guard {
            Some(guard) => &**guard,
            None => protocol_violation("access to a released section"),
        }
    }
}

impl<T> DerefMut for SectionGuard<'_, T> {
    #[track_caller]
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.guard {
            Some(guard) => &mut **guard,
            None => protocol_violation("access to a released section"),
        }
    }
}

impl<T> Drop for SectionGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            self.section.release(guard);
        }
    }
}

/// A critical section released by [`SectionGuard::suspend`]
#[must_use = "a suspended section must be resumed to access the protected value"]
pub struct SuspendedSection<'a, T> {
    section: &'a CriticalSection<T>,
}

impl<'a, T> SuspendedSection<'a, T> {
    /// Re-enter the section
    #[track_caller]
    pub fn resume(self) -> SectionGuard<'a, T> {
        self.section.enter()
    }
}
