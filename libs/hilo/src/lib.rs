// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Native threads, mutexes and condition variables.
//!
//! The crate has two layers:
//!
//! - [`raw`]: a small, platform independent API over the native primitives (POSIX threads on
//!   unix, Win32 on windows). Callers manage initialization, locking and teardown themselves.
//! - The owning types [`Thread`], [`Mutex`], [`LockGuard`] and [`Condvar`], which tie those
//!   steps to construction and drop.
//!
//! Thread creation is the only fallible operation; it reports a [`CreateError`] that converts
//! into the numeric [`Status`] codes shared with [`hilo_common`].
//!
//! ```
//! use hilo::{Mutex, Thread};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let shared = Arc::new((Mutex::new(), AtomicUsize::new(0)));
//!
//! let mut workers: Vec<Thread> = (0..4)
//!     .map(|_| {
//!         let shared = shared.clone();
//!         Thread::new(move || {
//!             let (mutex, count) = &*shared;
//!             let _guard = mutex.guard();
//!             count.fetch_add(1, Ordering::Relaxed);
//!         })
//!     })
//!     .collect();
//!
//! for worker in &mut workers {
//!     worker.join();
//! }
//! assert_eq!(shared.1.load(Ordering::Relaxed), 4);
//! ```

mod abort;
mod error;
mod macros;
pub mod raw;
mod sync;
mod sys;
mod thread;
mod trampoline;

pub use error::CreateError;
pub use hilo_common::Status;
pub use sync::{Condvar, LockGuard, Mutex};
pub use thread::Thread;

#[doc(hidden)]
pub mod __private {
    pub use paste::paste;
}
