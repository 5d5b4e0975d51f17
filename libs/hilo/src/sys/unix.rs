// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::sys::{Backend, Entry};
use core::ffi::{c_int, c_void};
use core::mem::{self, MaybeUninit};
use core::ptr;
use core::time::Duration;
use std::io::Error;

/// POSIX threads backend.
pub(crate) struct Pthreads;

/// The native thread identifier.
pub type RawHandle = libc::pthread_t;

pub(crate) struct Thread(libc::pthread_t);

impl Thread {
    pub(crate) fn as_raw(&self) -> RawHandle {
        self.0
    }
}

// Safety: a pthread_t is an identifier for a thread, any thread may join or detach it. Some
// platforms represent it as a raw pointer which is why this isn't auto-derived.
unsafe impl Send for Thread {}

extern "C" fn thread_start<E: Entry>(ctx: *mut c_void) -> *mut c_void {
    // Safety: `Pthreads::spawn` handed us a context valid for `E` and gave up ownership of it
    // the moment pthread_create succeeded.
    unsafe { E::enter(ctx) };
    ptr::null_mut()
}

#[inline]
#[track_caller]
fn check(ret: c_int, what: &'static str) {
    debug_assert_eq!(ret, 0, "{what} failed");
}

impl Backend for Pthreads {
    type Thread = Thread;
    type Mutex = libc::pthread_mutex_t;
    type Cond = libc::pthread_cond_t;

    unsafe fn spawn<E: Entry>(ctx: *mut c_void) -> Result<Self::Thread, i32> {
        let mut native = MaybeUninit::<libc::pthread_t>::uninit();

        // Safety: `native` is valid for writes, a null attribute pointer selects the defaults
        // and the caller guarantees `ctx` is valid for `E`.
        let ret = unsafe {
            libc::pthread_create(native.as_mut_ptr(), ptr::null(), thread_start::<E>, ctx)
        };

        if ret == 0 {
            // Safety: pthread_create initialized `native` because it returned 0
            Ok(Thread(unsafe { native.assume_init() }))
        } else {
            Err(ret)
        }
    }

    fn join(thread: Self::Thread) {
        // Safety: `Thread` is only created by a successful `spawn` and consumed here, so the
        // handle is joinable and joined at most once.
        let ret = unsafe { libc::pthread_join(thread.0, ptr::null_mut()) };
        check(ret, "pthread_join");
    }

    fn detach(thread: Self::Thread) {
        // Safety: see `join`
        let ret = unsafe { libc::pthread_detach(thread.0) };
        check(ret, "pthread_detach");
    }

    fn sleep(duration: Duration) {
        // Safety: timespec is plain old data, some targets carry padding fields which we want
        // zeroed anyway.
        let mut req: libc::timespec = unsafe { mem::zeroed() };
        req.tv_sec = duration
            .as_secs()
            .try_into()
            .unwrap_or(libc::time_t::MAX);
        req.tv_nsec = duration.subsec_nanos().try_into().unwrap_or(999_999_999);

        loop {
            // Safety: see above
            let mut rem: libc::timespec = unsafe { mem::zeroed() };
            // Safety: both pointers reference live, initialized timespecs
            if unsafe { libc::nanosleep(&req, &mut rem) } == 0 {
                break;
            }

            // a signal woke us up early, sleep for whatever is left
            if Error::last_os_error().raw_os_error() == Some(libc::EINTR) {
                req = rem;
            } else {
                break;
            }
        }
    }

    unsafe fn mutex_init(mutex: *mut Self::Mutex) {
        let mut attr = MaybeUninit::<libc::pthread_mutexattr_t>::uninit();

        // Safety: `attr` is initialized before use and destroyed afterward, `mutex` is valid for
        // writes as guaranteed by the caller.
        unsafe {
            check(
                libc::pthread_mutexattr_init(attr.as_mut_ptr()),
                "pthread_mutexattr_init",
            );
            // PTHREAD_MUTEX_NORMAL: relocking by the owner deadlocks instead of being undefined
            check(
                libc::pthread_mutexattr_settype(attr.as_mut_ptr(), libc::PTHREAD_MUTEX_NORMAL),
                "pthread_mutexattr_settype",
            );
            check(
                libc::pthread_mutex_init(mutex, attr.as_ptr()),
                "pthread_mutex_init",
            );
            libc::pthread_mutexattr_destroy(attr.as_mut_ptr());
        }
    }

    unsafe fn mutex_lock(mutex: *mut Self::Mutex) {
        // Safety: ensured by caller
        let ret = unsafe { libc::pthread_mutex_lock(mutex) };
        check(ret, "pthread_mutex_lock");
    }

    unsafe fn mutex_trylock(mutex: *mut Self::Mutex) -> bool {
        // Safety: ensured by caller. EBUSY is an expected outcome here, so nothing is asserted.
        // PTHREAD_MUTEX_NORMAL reports EBUSY to the owner as well.
        unsafe { libc::pthread_mutex_trylock(mutex) == 0 }
    }

    unsafe fn mutex_unlock(mutex: *mut Self::Mutex) {
        // Safety: ensured by caller
        let ret = unsafe { libc::pthread_mutex_unlock(mutex) };
        check(ret, "pthread_mutex_unlock");
    }

    unsafe fn mutex_destroy(mutex: *mut Self::Mutex) {
        // Safety: ensured by caller
        let ret = unsafe { libc::pthread_mutex_destroy(mutex) };
        check(ret, "pthread_mutex_destroy");
    }

    unsafe fn cond_init(cond: *mut Self::Cond) {
        // Safety: ensured by caller, a null attribute pointer selects the defaults
        let ret = unsafe { libc::pthread_cond_init(cond, ptr::null()) };
        check(ret, "pthread_cond_init");
    }

    unsafe fn cond_wait(cond: *mut Self::Cond, mutex: *mut Self::Mutex) {
        // Safety: ensured by caller
        let ret = unsafe { libc::pthread_cond_wait(cond, mutex) };
        check(ret, "pthread_cond_wait");
    }

    unsafe fn cond_signal(cond: *mut Self::Cond) {
        // Safety: ensured by caller
        let ret = unsafe { libc::pthread_cond_signal(cond) };
        check(ret, "pthread_cond_signal");
    }

    unsafe fn cond_broadcast(cond: *mut Self::Cond) {
        // Safety: ensured by caller
        let ret = unsafe { libc::pthread_cond_broadcast(cond) };
        check(ret, "pthread_cond_broadcast");
    }

    unsafe fn cond_destroy(cond: *mut Self::Cond) {
        // Safety: ensured by caller
        let ret = unsafe { libc::pthread_cond_destroy(cond) };
        check(ret, "pthread_cond_destroy");
    }
}
