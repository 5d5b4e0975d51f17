// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The primitive thread, mutex and condition variable API.
//!
//! These are thin, platform independent functions over the native backend. Nothing in here owns
//! its primitives: callers are responsible for initializing, pairing lock/unlock and destroying
//! them, which is why most of this module is `unsafe`. The types in the crate root
//! ([`Thread`](crate::Thread), [`Mutex`](crate::Mutex), [`Condvar`](crate::Condvar)) wrap this
//! API with ownership.
//!
//! Only thread creation reports failure. Every other operation mirrors a native call that
//! cannot fail when its contract is upheld.

use crate::error::CreateError;
use crate::sys::{Backend, Native, NativeCond, NativeMutex, NativeThread};
pub use crate::sys::RawHandle;
use crate::trampoline;
use core::alloc::GlobalAlloc;
use core::cell::UnsafeCell;
use core::ffi::c_void;
use core::fmt;
use core::marker::PhantomPinned;
use core::mem::MaybeUninit;
use core::time::Duration;
use std::alloc::System;

/// Untyped thread entry point, see [`create_raw`].
pub type RawEntry = unsafe fn(*mut c_void);

/// Handle to a native thread that has not been joined or detached yet.
///
/// A `RawThread` is not `Clone`: [`join`] and [`detach`] consume it, so join capability has
/// exactly one owner at any time. Dropping it without either leaves the thread running
/// undetached, leaking its OS resources.
#[must_use = "a RawThread must be passed to `join` or `detach`"]
pub struct RawThread(NativeThread);

impl RawThread {
    /// Returns the native thread identifier (`pthread_t` on unix, the thread `HANDLE` on
    /// windows).
    ///
    /// The identifier stays owned by this `RawThread`. It must not be joined, detached or closed
    /// through the native API.
    #[must_use]
    pub fn as_raw(&self) -> RawHandle {
        self.0.as_raw()
    }
}

impl fmt::Debug for RawThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawThread").finish_non_exhaustive()
    }
}

/// Starts a new thread that calls `entry(arg)`.
///
/// `entry` is invoked exactly once, with exactly `arg`. The start record carrying both is
/// allocated from the system allocator; use [`create_in`] to pick another.
///
/// # Errors
///
/// - [`CreateError::OutOfMemory`] if the start record could not be allocated. No OS thread was
///   requested.
/// - [`CreateError::CreationFailed`] if the OS refused to create the thread. `arg` has been
///   dropped.
pub fn create<T>(entry: fn(T), arg: T) -> Result<RawThread, CreateError>
where
    T: Send + 'static,
{
    create_in(entry, arg, &System)
}

/// Like [`create`] but allocates the start record from `alloc`.
///
/// Only the start record goes through `alloc`; the OS allocates the thread itself.
///
/// # Errors
///
/// See [`create`].
pub fn create_in<T, A>(entry: fn(T), arg: T, alloc: &'static A) -> Result<RawThread, CreateError>
where
    T: Send + 'static,
    A: GlobalAlloc + Sync + 'static,
{
    trampoline::spawn::<Native, T, A>(entry, arg, alloc).map(RawThread)
}

/// Starts a new thread that calls `entry(arg)` on an untyped argument pointer.
///
/// Pair this with [`thread_entry!`](crate::thread_entry) to get a typed body without any
/// function pointer casts.
///
/// # Errors
///
/// See [`create`].
///
/// # Safety
///
/// `entry` must be safe to call with `arg` from the new thread, and whatever `arg` points to
/// must stay valid until `entry` returned.
pub unsafe fn create_raw(entry: RawEntry, arg: *mut c_void) -> Result<RawThread, CreateError> {
    struct Start {
        entry: RawEntry,
        arg: *mut c_void,
    }

    // Safety: the caller of `create_raw` vouched for `arg` being usable from the new thread
    unsafe impl Send for Start {}

    fn run(start: Start) {
        // Safety: ensured by the caller of `create_raw`
        unsafe {
            (start.entry)(start.arg);
        }
    }

    create(run, Start { entry, arg })
}

/// Blocks until `thread` has finished running, then releases it.
pub fn join(thread: RawThread) {
    Native::join(thread.0);
}

/// Gives up the ability to join `thread`. Its resources are released by the OS once it exits.
pub fn detach(thread: RawThread) {
    Native::detach(thread.0);
}

/// Suspends the calling thread for at least `millis` milliseconds.
pub fn sleep(millis: u32) {
    Native::sleep(Duration::from_millis(u64::from(millis)));
}

/// Storage for a native mutex.
///
/// A `RawMutex` starts out uninitialized. It must be initialized with [`mutex_init`] before use
/// and must not move between [`mutex_init`] and [`mutex_destroy`].
pub struct RawMutex {
    inner: UnsafeCell<MaybeUninit<NativeMutex>>,
    _pinned: PhantomPinned,
}

// Safety: the native mutex is designed to be shared between threads, all accesses go through
// the native API.
unsafe impl Send for RawMutex {}
// Safety: see above
unsafe impl Sync for RawMutex {}

impl RawMutex {
    #[must_use]
    pub const fn uninit() -> Self {
        Self {
            inner: UnsafeCell::new(MaybeUninit::uninit()),
            _pinned: PhantomPinned,
        }
    }

    fn as_ptr(&self) -> *mut NativeMutex {
        self.inner.get().cast()
    }
}

impl fmt::Debug for RawMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawMutex").finish_non_exhaustive()
    }
}

/// Storage for a native condition variable.
///
/// A `RawCondvar` starts out uninitialized. It must be initialized with [`cond_init`] before use
/// and must not move between [`cond_init`] and [`cond_destroy`].
pub struct RawCondvar {
    inner: UnsafeCell<MaybeUninit<NativeCond>>,
    _pinned: PhantomPinned,
}

// Safety: the native condition variable is designed to be shared between threads, all accesses
// go through the native API.
unsafe impl Send for RawCondvar {}
// Safety: see above
unsafe impl Sync for RawCondvar {}

impl RawCondvar {
    #[must_use]
    pub const fn uninit() -> Self {
        Self {
            inner: UnsafeCell::new(MaybeUninit::uninit()),
            _pinned: PhantomPinned,
        }
    }

    fn as_ptr(&self) -> *mut NativeCond {
        self.inner.get().cast()
    }
}

impl fmt::Debug for RawCondvar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCondvar").finish_non_exhaustive()
    }
}

/// Initializes `mutex`.
///
/// # Safety
///
/// `mutex` must not be initialized already and must not move until [`mutex_destroy`].
pub unsafe fn mutex_init(mutex: &RawMutex) {
    // Safety: ensured by caller
    unsafe {
        Native::mutex_init(mutex.as_ptr());
    }
}

/// Locks `mutex`, blocking until it is available.
///
/// The mutex is not reentrant: locking it again from the thread that holds it blocks forever on
/// POSIX and follows the Win32 critical section contract on windows.
///
/// # Safety
///
/// `mutex` must be initialized.
pub unsafe fn mutex_lock(mutex: &RawMutex) {
    // Safety: ensured by caller
    unsafe {
        Native::mutex_lock(mutex.as_ptr());
    }
}

/// Locks `mutex` if it is available, without blocking. Returns `true` if the mutex was acquired.
///
/// A mutex already held by the calling thread is reported as unavailable on every platform.
///
/// # Safety
///
/// `mutex` must be initialized.
#[must_use]
pub unsafe fn mutex_trylock(mutex: &RawMutex) -> bool {
    // Safety: ensured by caller
    unsafe { Native::mutex_trylock(mutex.as_ptr()) }
}

/// Unlocks `mutex`.
///
/// # Safety
///
/// `mutex` must be initialized and locked by the calling thread.
pub unsafe fn mutex_unlock(mutex: &RawMutex) {
    // Safety: ensured by caller
    unsafe {
        Native::mutex_unlock(mutex.as_ptr());
    }
}

/// Destroys `mutex`, returning it to the uninitialized state.
///
/// # Safety
///
/// `mutex` must be initialized and unlocked.
pub unsafe fn mutex_destroy(mutex: &RawMutex) {
    // Safety: ensured by caller
    unsafe {
        Native::mutex_destroy(mutex.as_ptr());
    }
}

/// Initializes `cond`.
///
/// # Safety
///
/// `cond` must not be initialized already and must not move until [`cond_destroy`].
pub unsafe fn cond_init(cond: &RawCondvar) {
    // Safety: ensured by caller
    unsafe {
        Native::cond_init(cond.as_ptr());
    }
}

/// Atomically unlocks `mutex` and blocks until `cond` is signaled, then locks `mutex` again.
///
/// No wakeup that happens after `mutex` was released is missed. Wakeups may be spurious though,
/// callers must re-check their condition in a loop.
///
/// # Safety
///
/// `cond` and `mutex` must be initialized and `mutex` must be locked by the calling thread. All
/// threads blocked on `cond` at the same time must wait with the same `mutex`.
pub unsafe fn cond_wait(cond: &RawCondvar, mutex: &RawMutex) {
    // Safety: ensured by caller
    unsafe {
        Native::cond_wait(cond.as_ptr(), mutex.as_ptr());
    }
}

/// Wakes at most one thread blocked on `cond`. Which one is up to the OS.
///
/// # Safety
///
/// `cond` must be initialized.
pub unsafe fn cond_signal(cond: &RawCondvar) {
    // Safety: ensured by caller
    unsafe {
        Native::cond_signal(cond.as_ptr());
    }
}

/// Wakes all threads blocked on `cond`.
///
/// # Safety
///
/// `cond` must be initialized.
pub unsafe fn cond_broadcast(cond: &RawCondvar) {
    // Safety: ensured by caller
    unsafe {
        Native::cond_broadcast(cond.as_ptr());
    }
}

/// Destroys `cond`, returning it to the uninitialized state.
///
/// # Safety
///
/// `cond` must be initialized and no thread may be blocked on it.
pub unsafe fn cond_destroy(cond: &RawCondvar) {
    // Safety: ensured by caller
    unsafe {
        Native::cond_destroy(cond.as_ptr());
    }
}
