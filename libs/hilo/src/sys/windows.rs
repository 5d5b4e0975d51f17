// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::sys::{Backend, Entry};
use core::ffi::c_void;
use core::ptr;
use core::time::Duration;
use std::io::Error;
use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};
use windows_sys::Win32::System::Threading::{
    CONDITION_VARIABLE, CRITICAL_SECTION, CreateThread, DeleteCriticalSection,
    EnterCriticalSection, INFINITE, InitializeConditionVariable, InitializeCriticalSection,
    LeaveCriticalSection, Sleep, SleepConditionVariableCS, TryEnterCriticalSection,
    WaitForSingleObject, WakeAllConditionVariable, WakeConditionVariable,
};

/// Win32 threads backend.
pub(crate) struct Win32;

/// The native thread handle.
pub type RawHandle = HANDLE;

pub(crate) struct Thread(HANDLE);

impl Thread {
    pub(crate) fn as_raw(&self) -> RawHandle {
        self.0
    }
}

// Safety: a thread HANDLE may be waited on and closed from any thread.
unsafe impl Send for Thread {}

unsafe extern "system" fn thread_start<E: Entry>(ctx: *mut c_void) -> u32 {
    // Safety: `Win32::spawn` handed us a context valid for `E` and gave up ownership of it the
    // moment CreateThread succeeded.
    unsafe { E::enter(ctx) };
    0
}

impl Backend for Win32 {
    type Thread = Thread;
    type Mutex = CRITICAL_SECTION;
    type Cond = CONDITION_VARIABLE;

    unsafe fn spawn<E: Entry>(ctx: *mut c_void) -> Result<Self::Thread, i32> {
        // Safety: default security attributes and stack size, the caller guarantees `ctx` is
        // valid for `E`.
        let handle = unsafe {
            CreateThread(
                ptr::null(),
                0,
                Some(thread_start::<E>),
                ctx.cast_const(),
                0,
                ptr::null_mut(),
            )
        };

        if handle.is_null() {
            Err(Error::last_os_error().raw_os_error().unwrap_or(-1))
        } else {
            Ok(Thread(handle))
        }
    }

    fn join(thread: Self::Thread) {
        // Safety: `Thread` is only created by a successful `spawn` and consumed here, so the
        // handle is open and closed exactly once.
        unsafe {
            WaitForSingleObject(thread.0, INFINITE);
            CloseHandle(thread.0);
        }
    }

    fn detach(thread: Self::Thread) {
        // Safety: see `join`. The thread keeps running, the OS reclaims it once it exits and
        // no handle refers to it.
        unsafe {
            CloseHandle(thread.0);
        }
    }

    fn sleep(duration: Duration) {
        // round up so we never sleep less than asked, INFINITE would never return
        let millis = u32::try_from(duration.as_nanos().div_ceil(1_000_000))
            .map_or(INFINITE - 1, |ms| ms.min(INFINITE - 1));
        // Safety: plain FFI call without pointer arguments
        unsafe { Sleep(millis) };
    }

    unsafe fn mutex_init(mutex: *mut Self::Mutex) {
        // Safety: ensured by caller
        unsafe { InitializeCriticalSection(mutex) };
    }

    unsafe fn mutex_lock(mutex: *mut Self::Mutex) {
        // Safety: ensured by caller
        unsafe { EnterCriticalSection(mutex) };
    }

    unsafe fn mutex_trylock(mutex: *mut Self::Mutex) -> bool {
        // Safety: ensured by caller
        if unsafe { TryEnterCriticalSection(mutex) } == 0 {
            return false;
        }

        // critical sections are reentrant, but a mutex already held by this thread counts as busy
        // Safety: we own the critical section right now, its fields are stable
        if unsafe { (*mutex).RecursionCount } > 1 {
            // Safety: entered right above
            unsafe { LeaveCriticalSection(mutex) };
            return false;
        }

        true
    }

    unsafe fn mutex_unlock(mutex: *mut Self::Mutex) {
        // Safety: ensured by caller
        unsafe { LeaveCriticalSection(mutex) };
    }

    unsafe fn mutex_destroy(mutex: *mut Self::Mutex) {
        // Safety: ensured by caller
        unsafe { DeleteCriticalSection(mutex) };
    }

    unsafe fn cond_init(cond: *mut Self::Cond) {
        // Safety: ensured by caller
        unsafe { InitializeConditionVariable(cond) };
    }

    unsafe fn cond_wait(cond: *mut Self::Cond, mutex: *mut Self::Mutex) {
        // Safety: ensured by caller
        unsafe { SleepConditionVariableCS(cond, mutex, INFINITE) };
    }

    unsafe fn cond_signal(cond: *mut Self::Cond) {
        // Safety: ensured by caller
        unsafe { WakeConditionVariable(cond) };
    }

    unsafe fn cond_broadcast(cond: *mut Self::Cond) {
        // Safety: ensured by caller
        unsafe { WakeAllConditionVariable(cond) };
    }

    unsafe fn cond_destroy(_cond: *mut Self::Cond) {
        // Win32 condition variables own no resources
    }
}
