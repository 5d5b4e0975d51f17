// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Native threading backends.
//!
//! Exactly one [`Backend`] is compiled per target and exported as [`Native`]: POSIX threads on
//! unix, Win32 threads on windows.

use core::ffi::c_void;
use core::time::Duration;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub(crate) use unix::Pthreads as Native;
        pub use unix::RawHandle;
    } else if #[cfg(windows)] {
        mod windows;
        pub(crate) use windows::Win32 as Native;
        pub use windows::RawHandle;
    } else {
        compile_error!("unsupported target: hilo requires a unix or windows host");
    }
}

pub(crate) type NativeThread = <Native as Backend>::Thread;
pub(crate) type NativeMutex = <Native as Backend>::Mutex;
pub(crate) type NativeCond = <Native as Backend>::Cond;

/// Code that runs first on a freshly created OS thread.
///
/// Backends monomorphize their OS-specific start routine over `E`, so the only thing crossing
/// the OS boundary is the context pointer.
pub(crate) trait Entry {
    /// # Safety
    ///
    /// `ctx` must be the pointer handed to [`Backend::spawn`] and must not be used again by
    /// anyone else.
    unsafe fn enter(ctx: *mut c_void);
}

/// The capability set every platform provides, mapped 1:1 onto native facilities.
///
/// None of the synchronization operations report errors: they mirror native calls whose only
/// failure modes are contract violations by the caller.
pub(crate) trait Backend {
    type Thread: Send;
    type Mutex;
    type Cond;

    /// Starts a new thread running `E::enter(ctx)`.
    ///
    /// # Errors
    ///
    /// Returns the OS error code if the thread could not be created. In that case `E::enter`
    /// is never called and `ctx` is still owned by the caller.
    ///
    /// # Safety
    ///
    /// `ctx` must be valid to pass to `E::enter` from another thread.
    unsafe fn spawn<E: Entry>(ctx: *mut c_void) -> Result<Self::Thread, i32>;

    fn join(thread: Self::Thread);
    fn detach(thread: Self::Thread);
    fn sleep(duration: Duration);

    /// # Safety
    ///
    /// `mutex` must point to writable memory that is not an initialized mutex and that will not
    /// move until [`Backend::mutex_destroy`] is called.
    unsafe fn mutex_init(mutex: *mut Self::Mutex);
    /// # Safety
    ///
    /// `mutex` must be initialized.
    unsafe fn mutex_lock(mutex: *mut Self::Mutex);
    /// Acquires the mutex if nobody holds it, including the calling thread. Returns whether it
    /// was acquired.
    ///
    /// # Safety
    ///
    /// `mutex` must be initialized.
    unsafe fn mutex_trylock(mutex: *mut Self::Mutex) -> bool;
    /// # Safety
    ///
    /// `mutex` must be initialized and locked by the calling thread.
    unsafe fn mutex_unlock(mutex: *mut Self::Mutex);
    /// # Safety
    ///
    /// `mutex` must be initialized and unlocked, and not be used again until re-initialized.
    unsafe fn mutex_destroy(mutex: *mut Self::Mutex);

    /// # Safety
    ///
    /// `cond` must point to writable memory that is not an initialized condition variable and
    /// that will not move until [`Backend::cond_destroy`] is called.
    unsafe fn cond_init(cond: *mut Self::Cond);
    /// # Safety
    ///
    /// `cond` and `mutex` must be initialized and `mutex` must be locked by the calling thread.
    unsafe fn cond_wait(cond: *mut Self::Cond, mutex: *mut Self::Mutex);
    /// # Safety
    ///
    /// `cond` must be initialized.
    unsafe fn cond_signal(cond: *mut Self::Cond);
    /// # Safety
    ///
    /// `cond` must be initialized.
    unsafe fn cond_broadcast(cond: *mut Self::Cond);
    /// # Safety
    ///
    /// `cond` must be initialized, no thread may be blocked on it, and it must not be used again
    /// until re-initialized.
    unsafe fn cond_destroy(cond: *mut Self::Cond);
}
