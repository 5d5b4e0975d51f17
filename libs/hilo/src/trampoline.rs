// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Bridging typed units of work into the fixed OS thread entry point.
//!
//! The unit of work, its argument and the allocator that produced the record all live in one
//! heap allocation owned by a [`Context`]. The context is consumed exactly once: either by the
//! new thread after the unit of work returned, or by the creating thread when the OS refused
//! to start the thread.

use crate::error::CreateError;
use crate::sys::{Backend, Entry};
use core::alloc::{GlobalAlloc, Layout};
use core::any::Any;
use core::ffi::c_void;
use core::mem::ManuallyDrop;
use core::ptr::{self, NonNull};
use std::panic::{self, AssertUnwindSafe};

struct Record<T, A: 'static> {
    entry: fn(T),
    arg: T,
    alloc: &'static A,
}

/// Unique ownership of one heap allocated start [`Record`].
pub(crate) struct Context<T, A: GlobalAlloc + 'static> {
    record: NonNull<Record<T, A>>,
}

impl<T, A> Context<T, A>
where
    T: Send + 'static,
    A: GlobalAlloc + Sync + 'static,
{
    /// Allocates a new start record from `alloc`.
    ///
    /// # Errors
    ///
    /// Returns [`CreateError::OutOfMemory`] if the allocator returned null.
    pub(crate) fn new(entry: fn(T), arg: T, alloc: &'static A) -> Result<Self, CreateError> {
        let layout = Layout::new::<Record<T, A>>();

        // Safety: a `Record` always contains a function pointer, so the layout is non-zero sized
        let raw = unsafe { alloc.alloc(layout) }.cast::<Record<T, A>>();
        let Some(record) = NonNull::new(raw) else {
            return Err(CreateError::OutOfMemory);
        };

        // Safety: the allocation is fresh, sized and aligned for a `Record<T, A>`
        unsafe { record.write(Record { entry, arg, alloc }) };

        Ok(Self { record })
    }

    /// Gives up ownership of the record, returning the pointer the new thread receives.
    ///
    /// Ownership is reclaimed with [`Context::from_raw`], exactly once.
    pub(crate) fn into_raw(self) -> *mut c_void {
        let this = ManuallyDrop::new(self);
        this.record.as_ptr().cast()
    }

    /// Reclaims ownership of a record previously released by [`Context::into_raw`].
    ///
    /// # Safety
    ///
    /// `raw` must come from `Context::<T, A>::into_raw` and must not have been reclaimed before.
    pub(crate) unsafe fn from_raw(raw: *mut c_void) -> Self {
        debug_assert!(!raw.is_null());
        Self {
            // Safety: `into_raw` never returns null
            record: unsafe { NonNull::new_unchecked(raw.cast()) },
        }
    }

    /// Runs the unit of work against its argument, then frees the record.
    ///
    /// A panicking unit of work is caught here: unwinding out of an OS entry point is undefined,
    /// and the record must be freed on every path.
    pub(crate) fn run(self) {
        let this = ManuallyDrop::new(self);

        // Safety: the record was initialized in `new`. It is read exactly once here and the
        // memory is released below without dropping its contents a second time.
        let Record { entry, arg, alloc } = unsafe { this.record.read() };

        let result = panic::catch_unwind(AssertUnwindSafe(move || entry(arg)));

        // Safety: the record was allocated from `alloc` with this exact layout and its contents
        // have been moved out above.
        unsafe { alloc.dealloc(this.record.as_ptr().cast(), Layout::new::<Record<T, A>>()) };

        if let Err(payload) = result {
            tracing::error!(panic = panic_message(&*payload), "thread entry point panicked");
        }
    }
}

impl<T, A> Entry for Context<T, A>
where
    T: Send + 'static,
    A: GlobalAlloc + Sync + 'static,
{
    unsafe fn enter(ctx: *mut c_void) {
        // Safety: backends only call `enter` with the pointer that `spawn` handed them
        unsafe { Self::from_raw(ctx) }.run();
    }
}

impl<T, A: GlobalAlloc + 'static> Drop for Context<T, A> {
    fn drop(&mut self) {
        // Safety: the record is initialized and still owned by us (`run` and `into_raw` both
        // suppress this destructor), so it can be dropped and deallocated exactly once.
        unsafe {
            let alloc = self.record.as_ref().alloc;
            ptr::drop_in_place(self.record.as_ptr());
            alloc.dealloc(self.record.as_ptr().cast(), Layout::new::<Record<T, A>>());
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "Box<dyn Any>"
    }
}

/// Starts a thread on backend `B` that calls `entry(arg)`.
///
/// # Errors
///
/// - [`CreateError::OutOfMemory`] if the start record could not be allocated. `B` is not called.
/// - [`CreateError::CreationFailed`] if `B` refused to start the thread. The record (and `arg`
///   with it) has been dropped and freed before this returns.
pub(crate) fn spawn<B, T, A>(entry: fn(T), arg: T, alloc: &'static A) -> Result<B::Thread, CreateError>
where
    B: Backend,
    T: Send + 'static,
    A: GlobalAlloc + Sync + 'static,
{
    let ctx = Context::new(entry, arg, alloc)?.into_raw();

    // Safety: `ctx` was produced by `Context::<T, A>::into_raw` which is exactly the type the
    // start routine reclaims it as.
    match unsafe { B::spawn::<Context<T, A>>(ctx) } {
        Ok(thread) => {
            tracing::trace!(ctx = ?ctx, "spawned native thread");
            Ok(thread)
        }
        Err(code) => {
            // Safety: the OS never started the thread, so ownership of the record never left
            // this function.
            drop(unsafe { Context::<T, A>::from_raw(ctx) });
            tracing::error!(code, "native thread creation failed");
            Err(CreateError::CreationFailed { code })
        }
    }
}
