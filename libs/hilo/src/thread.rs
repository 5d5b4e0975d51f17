// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::abort;
use crate::error::CreateError;
use crate::raw::{self, RawThread};
use crate::sys::{Backend, Native};
use core::alloc::GlobalAlloc;
use core::fmt;
use core::mem;
use core::time::Duration;
use static_assertions::{assert_impl_all, assert_not_impl_any};
use std::alloc::System;

/// A unit of work with all of its arguments bound, runnable exactly once.
trait Runnable: Send {
    fn run(self: Box<Self>);
}

impl<F> Runnable for F
where
    F: FnOnce() + Send,
{
    fn run(self: Box<Self>) {
        (*self)();
    }
}

fn run_holder(holder: Box<dyn Runnable>) {
    holder.run();
}

/// An owned OS thread.
///
/// A `Thread` is either *joinable*, meaning it is the sole owner of a running or finished OS
/// thread, or it owns nothing. It can be moved but not copied.
///
/// Before a joinable `Thread` goes away it must be [joined](Thread::join) or
/// [detached](Thread::detach). Dropping a joinable `Thread`, or assigning another `Thread` over
/// it, aborts the process.
///
/// ```
/// # use hilo::Thread;
/// # use std::sync::Arc;
/// # use std::sync::atomic::{AtomicUsize, Ordering};
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// let mut thread = Thread::with_arg(
///     |(hits, n): (Arc<AtomicUsize>, usize)| {
///         hits.fetch_add(n, Ordering::Relaxed);
///     },
///     (hits.clone(), 3),
/// );
/// thread.join();
///
/// assert_eq!(hits.load(Ordering::Relaxed), 3);
/// assert!(!thread.is_joinable());
/// ```
#[must_use = "a joinable Thread must be joined or detached before it is dropped"]
#[derive(Default)]
pub struct Thread {
    native: Option<RawThread>,
}
assert_impl_all!(Thread: Send, Default);
assert_not_impl_any!(Thread: Clone, Copy);

impl Thread {
    /// Starts a new thread running `f`.
    ///
    /// If the thread cannot be started the failure is logged and the returned `Thread` is not
    /// joinable. Use [`Thread::try_new`] to handle the error instead.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new_in(f, &System)
    }

    /// Starts a new thread running `f(arg)`.
    pub fn with_arg<F, T>(f: F, arg: T) -> Self
    where
        F: FnOnce(T) + Send + 'static,
        T: Send + 'static,
    {
        Self::new(move || f(arg))
    }

    /// Like [`Thread::new`] but allocates the start record from `alloc`.
    pub fn new_in<F, A>(f: F, alloc: &'static A) -> Self
    where
        F: FnOnce() + Send + 'static,
        A: GlobalAlloc + Sync + 'static,
    {
        Self::try_new_in(f, alloc).unwrap_or_else(|err| {
            tracing::error!(%err, "failed to start thread");
            Self::default()
        })
    }

    /// Starts a new thread running `f`.
    ///
    /// # Errors
    ///
    /// Returns the [`CreateError`] if the thread could not be started. `f` has been dropped
    /// without running in that case.
    pub fn try_new<F>(f: F) -> Result<Self, CreateError>
    where
        F: FnOnce() + Send + 'static,
    {
        Self::try_new_in(f, &System)
    }

    /// Like [`Thread::try_new`] but allocates the start record from `alloc`.
    ///
    /// # Errors
    ///
    /// See [`Thread::try_new`].
    pub fn try_new_in<F, A>(f: F, alloc: &'static A) -> Result<Self, CreateError>
    where
        F: FnOnce() + Send + 'static,
        A: GlobalAlloc + Sync + 'static,
    {
        let holder: Box<dyn Runnable> = Box::new(f);
        let native = raw::create_in(run_holder, holder, alloc)?;
        tracing::trace!(thread = ?native, "created thread");

        Ok(Self {
            native: Some(native),
        })
    }

    /// Returns `true` if this `Thread` still owns an OS thread that has not been joined or
    /// detached.
    #[must_use]
    pub fn is_joinable(&self) -> bool {
        self.native.is_some()
    }

    /// Blocks until the thread finished running. Does nothing if not joinable.
    pub fn join(&mut self) {
        if let Some(native) = self.native.take() {
            tracing::trace!(thread = ?native, "joining thread");
            raw::join(native);
        }
    }

    /// Lets the thread run on its own. Does nothing if not joinable.
    pub fn detach(&mut self) {
        if let Some(native) = self.native.take() {
            tracing::trace!(thread = ?native, "detaching thread");
            raw::detach(native);
        }
    }

    /// Moves the OS thread out of `self` into a new `Thread`, leaving `self` not joinable.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Returns the underlying thread while joinable, see [`RawThread::as_raw`] for the native
    /// identifier.
    #[must_use]
    pub fn native_handle(&self) -> Option<&RawThread> {
        self.native.as_ref()
    }

    /// Suspends the calling thread for at least `duration`.
    pub fn sleep(duration: Duration) {
        Native::sleep(duration);
    }
}

impl Drop for Thread {
    fn drop(&mut self) {
        if self.native.is_some() {
            abort::ownership_violation("dropped a joinable thread without joining or detaching it");
        }
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("native", &self.native)
            .finish()
    }
}
