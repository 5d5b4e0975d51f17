// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::alloc::{GlobalAlloc, Layout};
use core::fmt;
use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// An allocator wrapper that counts allocations and deallocations passing through it.
///
/// `Counting` can also simulate exhaustion: while [`Counting::set_exhausted`] is on, every
/// allocation request fails by returning null without reaching the inner allocator.
///
/// ```
/// # use hilo_common::Counting;
/// # use std::alloc::{GlobalAlloc, Layout, System};
/// static ALLOC: Counting<System> = Counting::new(System);
///
/// let layout = Layout::new::<u64>();
/// let ptr = unsafe { ALLOC.alloc(layout) };
/// assert_eq!(ALLOC.live(), 1);
/// unsafe { ALLOC.dealloc(ptr, layout) };
/// assert_eq!(ALLOC.live(), 0);
/// ```
pub struct Counting<A> {
    inner: A,
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    exhausted: AtomicBool,
}

impl<A> Counting<A> {
    pub const fn new(inner: A) -> Self {
        Self {
            inner,
            allocations: AtomicUsize::new(0),
            deallocations: AtomicUsize::new(0),
            exhausted: AtomicBool::new(false),
        }
    }

    /// Total number of successful allocations.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Acquire)
    }

    /// Total number of deallocations.
    pub fn deallocations(&self) -> usize {
        self.deallocations.load(Ordering::Acquire)
    }

    /// Number of allocations that have not been freed yet.
    pub fn live(&self) -> usize {
        // read deallocations first so a racing free can never make the difference underflow
        let deallocations = self.deallocations();
        self.allocations().saturating_sub(deallocations)
    }

    /// Makes every following allocation fail (`true`) or succeed again (`false`).
    pub fn set_exhausted(&self, exhausted: bool) {
        self.exhausted.store(exhausted, Ordering::Release);
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }
}

impl<A> fmt::Debug for Counting<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counting")
            .field("allocations", &self.allocations())
            .field("deallocations", &self.deallocations())
            .field("exhausted", &self.is_exhausted())
            .finish_non_exhaustive()
    }
}

// Safety: every request is either refused with null or forwarded unchanged to `A`, which upholds
// the `GlobalAlloc` contract itself.
unsafe impl<A: GlobalAlloc> GlobalAlloc for Counting<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if self.is_exhausted() {
            return ptr::null_mut();
        }

        // Safety: forwarded from our caller
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            self.allocations.fetch_add(1, Ordering::AcqRel);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if self.is_exhausted() {
            return ptr::null_mut();
        }

        // Safety: forwarded from our caller
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        if !ptr.is_null() {
            self.allocations.fetch_add(1, Ordering::AcqRel);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // Safety: forwarded from our caller
        unsafe { self.inner.dealloc(ptr, layout) };
        self.deallocations.fetch_add(1, Ordering::AcqRel);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if self.is_exhausted() {
            return ptr::null_mut();
        }

        // Safety: forwarded from our caller. A reallocation moves a live block, the counts stay
        // the same whether it succeeds or not.
        unsafe { self.inner.realloc(ptr, layout, new_size) }
    }
}
