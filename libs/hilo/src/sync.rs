// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::raw::{self, RawCondvar, RawMutex};
use core::fmt;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use static_assertions::{assert_impl_all, assert_not_impl_any};

/// An owned native mutex.
///
/// The native mutex is initialized on construction and destroyed on drop. It lives on the heap
/// so that moving a `Mutex` never moves the native object.
///
/// Unlike `std::sync::Mutex` this type does not protect any data by itself; it is a plain lock
/// to be paired with [`LockGuard`] or the unsafe [`Mutex::unlock`].
///
/// A `Mutex` dropped while still locked (e.g. after leaking its [`LockGuard`]) cannot be destroyed
/// safely. Its native mutex is leaked instead.
pub struct Mutex {
    raw: ManuallyDrop<Box<RawMutex>>,
}
assert_impl_all!(Mutex: Send, Sync);
assert_not_impl_any!(Mutex: Clone);

impl Mutex {
    #[must_use]
    pub fn new() -> Self {
        let raw = Box::new(RawMutex::uninit());
        // Safety: freshly allocated and never initialized. The box keeps the address stable
        // until `drop` destroys it.
        unsafe { raw::mutex_init(&raw) };
        Self {
            raw: ManuallyDrop::new(raw),
        }
    }

    /// Blocks until the mutex is acquired.
    ///
    /// Prefer [`Mutex::guard`], which releases the mutex on every exit path of its scope.
    pub fn lock(&self) {
        // Safety: initialized in `new`
        unsafe { raw::mutex_lock(&self.raw) };
    }

    /// Releases the mutex.
    ///
    /// # Safety
    ///
    /// The calling thread must hold the mutex through a previous [`Mutex::lock`].
    pub unsafe fn unlock(&self) {
        // Safety: initialized in `new`, held as ensured by caller
        unsafe { raw::mutex_unlock(&self.raw) };
    }

    /// Acquires the mutex for the lifetime of the returned guard.
    pub fn guard(&self) -> LockGuard<'_> {
        LockGuard::new(self)
    }

    /// Acquires the mutex if it is available right now.
    ///
    /// Returns `None` if any thread holds it, the calling thread included.
    pub fn try_guard(&self) -> Option<LockGuard<'_>> {
        // Safety: initialized in `new`
        unsafe { raw::mutex_trylock(&self.raw) }.then(|| LockGuard {
            mutex: self,
            _not_send: PhantomData,
        })
    }

    /// Returns the initialized native mutex, e.g. to pass it to [`raw::cond_wait`].
    #[must_use]
    pub fn native_handle(&self) -> &RawMutex {
        &self.raw
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Mutex {
    fn drop(&mut self) {
        // Safety: initialized in `new`
        if unsafe { raw::mutex_trylock(&self.raw) } {
            // Safety: acquired right above. With exclusive access nobody can lock it in between,
            // so it is destroyed unlocked and the box is freed exactly once.
            unsafe {
                raw::mutex_unlock(&self.raw);
                raw::mutex_destroy(&self.raw);
                ManuallyDrop::drop(&mut self.raw);
            }
        } else {
            // destroying a locked native mutex is undefined, leave it allocated forever
            tracing::warn!("dropped a locked mutex, leaking its native mutex");
        }
    }
}

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex").finish_non_exhaustive()
    }
}

/// Scoped lock on a [`Mutex`].
///
/// The mutex is acquired in [`LockGuard::new`] and released when the guard is dropped, so it is
/// released on normal return, early return and unwinding alike. The guard is bound to the thread
/// that acquired the mutex.
#[must_use = "if unused the Mutex will immediately unlock"]
pub struct LockGuard<'a> {
    mutex: &'a Mutex,
    _not_send: PhantomData<*mut ()>,
}
assert_not_impl_any!(LockGuard<'static>: Send, Clone);

impl<'a> LockGuard<'a> {
    pub fn new(mutex: &'a Mutex) -> Self {
        mutex.lock();
        Self {
            mutex,
            _not_send: PhantomData,
        }
    }

    /// Returns the mutex this guard holds.
    #[must_use]
    pub fn mutex(&self) -> &'a Mutex {
        self.mutex
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        // Safety: acquired in `new` on this thread (guards are not `Send`)
        unsafe { self.mutex.unlock() };
    }
}

impl fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("mutex", &self.mutex)
            .finish()
    }
}

/// An owned native condition variable.
///
/// A `Condvar` is not tied to one mutex: every wait names the mutex it cooperates with. All
/// threads waiting at the same time must use the same mutex though; waiting concurrently with
/// guards of two different mutexes is undefined on POSIX. Pair each `Condvar` with a single
/// `Mutex` to stay clear of this.
///
/// Wakeups can be spurious, so always wait in a loop that re-checks the condition:
///
/// ```
/// # use hilo::{Condvar, Mutex, Thread};
/// # use std::sync::Arc;
/// # use std::sync::atomic::{AtomicBool, Ordering};
/// let pair = Arc::new((Mutex::new(), Condvar::new(), AtomicBool::new(false)));
///
/// let mut thread = Thread::new({
///     let pair = pair.clone();
///     move || {
///         let (mutex, cond, ready) = &*pair;
///         let _guard = mutex.guard();
///         ready.store(true, Ordering::Relaxed);
///         cond.signal();
///     }
/// });
///
/// let (mutex, cond, ready) = &*pair;
/// let mut guard = mutex.guard();
/// while !ready.load(Ordering::Relaxed) {
///     cond.wait(&mut guard);
/// }
/// drop(guard);
/// thread.join();
/// ```
pub struct Condvar {
    raw: Box<RawCondvar>,
}
assert_impl_all!(Condvar: Send, Sync);
assert_not_impl_any!(Condvar: Clone);

impl Condvar {
    #[must_use]
    pub fn new() -> Self {
        let raw = Box::new(RawCondvar::uninit());
        // Safety: freshly allocated and never initialized. The box keeps the address stable
        // until `drop` destroys it.
        unsafe { raw::cond_init(&raw) };
        Self { raw }
    }

    /// Releases the mutex held by `guard`, blocks until woken, then reacquires the mutex.
    ///
    /// Every thread blocked on this condition variable at the same time must wait with a guard
    /// of the same [`Mutex`].
    pub fn wait(&self, guard: &mut LockGuard<'_>) {
        // Safety: both primitives are initialized and the guard proves the calling thread holds
        // the mutex.
        unsafe { raw::cond_wait(&self.raw, guard.mutex.native_handle()) };
    }

    /// Like [`Condvar::wait`] for a mutex locked with [`Mutex::lock`].
    ///
    /// # Safety
    ///
    /// The calling thread must hold `mutex`, and every thread blocked on this condition variable
    /// at the same time must wait with the same `mutex`.
    pub unsafe fn wait_raw(&self, mutex: &Mutex) {
        // Safety: both primitives are initialized, `mutex` is held as ensured by caller
        unsafe { raw::cond_wait(&self.raw, mutex.native_handle()) };
    }

    /// Wakes up at most one waiting thread.
    pub fn signal(&self) {
        // Safety: initialized in `new`
        unsafe { raw::cond_signal(&self.raw) };
    }

    /// Wakes up all waiting threads.
    pub fn broadcast(&self) {
        // Safety: initialized in `new`
        unsafe { raw::cond_broadcast(&self.raw) };
    }

    #[must_use]
    pub fn native_handle(&self) -> &RawCondvar {
        &self.raw
    }
}

impl Default for Condvar {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Condvar {
    fn drop(&mut self) {
        // Safety: initialized in `new`. A waiter borrows the condvar, so with exclusive access
        // there can be none left.
        unsafe { raw::cond_destroy(&self.raw) };
    }
}

impl fmt::Debug for Condvar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condvar").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Thread;
    use core::mem;
    use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn guard_releases_on_scope_exit() {
        let mutex = Mutex::new();
        {
            let _guard = mutex.guard();
        }
        // would deadlock if the guard had not released the mutex
        let _guard = LockGuard::new(&mutex);
    }

    #[test]
    fn guard_releases_on_early_return() {
        fn locked_then_bail(mutex: &Mutex, bail: bool) -> Result<(), ()> {
            let _guard = mutex.guard();
            if bail {
                return Err(());
            }
            Ok(())
        }

        let mutex = Mutex::new();
        assert!(locked_then_bail(&mutex, true).is_err());
        assert!(locked_then_bail(&mutex, false).is_ok());
        mutex.lock();
        // Safety: locked right above
        unsafe { mutex.unlock() };
    }

    #[test]
    fn guard_releases_on_unwind() {
        let mutex = Mutex::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = mutex.guard();
            panic!("unwinding with the lock held");
        }));
        assert!(result.is_err());

        let _guard = mutex.guard();
    }

    #[test]
    fn moving_a_mutex_keeps_it_usable() {
        let mutex = Mutex::new();
        mutex.lock();
        let moved = mutex;
        // Safety: locked before the move, the native object did not move
        unsafe { moved.unlock() };
        let _guard = moved.guard();
    }

    #[test]
    fn try_guard_fails_while_held() {
        let mutex = Mutex::new();

        let guard = mutex.guard();
        assert!(mutex.try_guard().is_none());
        drop(guard);

        let guard = mutex.try_guard();
        assert!(guard.is_some());
        drop(guard);

        let _guard = mutex.guard();
    }

    #[test]
    fn dropping_a_locked_mutex_leaks_it() {
        let mutex = Mutex::new();
        mutex.lock();
        drop(mutex);

        let mutex = Mutex::new();
        mem::forget(mutex.guard());
        drop(mutex);

        // unrelated mutexes keep working afterwards
        let mutex = Mutex::new();
        let _guard = mutex.guard();
    }

    #[test]
    fn dropping_a_mutex_locked_by_another_thread_leaks_it() {
        let shared = Arc::new(Mutex::new());

        let mut thread = Thread::new({
            let shared = shared.clone();
            move || mem::forget(shared.guard())
        });
        thread.join();

        let mutex = Arc::into_inner(shared).unwrap();
        assert!(mutex.try_guard().is_none());
        drop(mutex);
    }

    #[test]
    fn wait_raw_with_manual_locking() {
        let state = Arc::new((Mutex::new(), Condvar::new(), AtomicBool::new(false)));

        let mut thread = Thread::new({
            let state = state.clone();
            move || {
                let (mutex, cond, ready) = &*state;
                mutex.lock();
                ready.store(true, Ordering::Relaxed);
                cond.broadcast();
                // Safety: locked right above
                unsafe { mutex.unlock() };
            }
        });

        let (mutex, cond, ready) = &*state;
        mutex.lock();
        while !ready.load(Ordering::Relaxed) {
            // Safety: locked by this thread
            unsafe { cond.wait_raw(mutex) };
        }
        // Safety: still held after waiting
        unsafe { mutex.unlock() };
        thread.join();
    }

    #[test]
    fn signal_wakes_a_waiter() {
        let state = Arc::new((Mutex::new(), Condvar::new(), AtomicUsize::new(0)));

        let mut waiter = Thread::new({
            let state = state.clone();
            move || {
                let (mutex, cond, value) = &*state;
                let mut guard = mutex.guard();
                while value.load(Ordering::Relaxed) == 0 {
                    cond.wait(&mut guard);
                }
                value.store(2, Ordering::Relaxed);
            }
        });

        {
            let (mutex, cond, value) = &*state;
            let _guard = mutex.guard();
            value.store(1, Ordering::Relaxed);
            cond.signal();
        }

        waiter.join();
        assert_eq!(state.2.load(Ordering::Relaxed), 2);
    }
}
