// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

/// Declares a typed thread body together with a [`RawEntry`](crate::raw::RawEntry) wrapper for
/// it.
///
/// `thread_entry! { fn name(param: &Ty) { .. } }` expands to two functions:
///
/// - `unsafe fn name(arg: *mut c_void)`, the entry to hand to
///   [`create_raw`](crate::raw::create_raw). It reinterprets `arg` as `&Ty` and forwards.
/// - `fn name__impl(param: &Ty)` with the body as written.
///
/// Bodies taking `param: &mut Ty` get exclusive access to the argument instead.
///
/// The caller of `create_raw` is responsible for `arg` actually pointing to a live `Ty`, and for
/// `&mut` bodies, for nobody else touching it until the thread is joined.
///
/// ```
/// use core::sync::atomic::{AtomicUsize, Ordering};
/// use hilo::raw;
///
/// hilo::thread_entry! {
///     fn count(hits: &AtomicUsize) {
///         hits.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let hits = AtomicUsize::new(0);
/// // Safety: `hits` outlives the thread which is joined right away
/// let thread = unsafe { raw::create_raw(count, (&raw const hits).cast_mut().cast()) }.unwrap();
/// raw::join(thread);
///
/// assert_eq!(hits.load(Ordering::Relaxed), 1);
/// ```
#[macro_export]
macro_rules! thread_entry {
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident($param:ident: &mut $ty:ty) $body:block
    ) => {
        $crate::__private::paste! {
            $(#[$meta])*
            $vis unsafe fn $name(arg: *mut ::core::ffi::c_void) {
                // Safety: `create_raw` callers guarantee `arg` points to a live value of this type
                // that only this thread accesses
                [<$name __impl>](unsafe { &mut *arg.cast::<$ty>() });
            }

            #[allow(non_snake_case, reason = "generated name")]
            $vis fn [<$name __impl>]($param: &mut $ty) $body
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident($param:ident: &$ty:ty) $body:block
    ) => {
        $crate::__private::paste! {
            $(#[$meta])*
            $vis unsafe fn $name(arg: *mut ::core::ffi::c_void) {
                // Safety: `create_raw` callers guarantee `arg` points to a live value of this type
                [<$name __impl>](unsafe { &*arg.cast::<$ty>() });
            }

            #[allow(non_snake_case, reason = "generated name")]
            $vis fn [<$name __impl>]($param: &$ty) $body
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::raw;
    use core::ffi::c_void;
    use core::ptr;
    use core::sync::atomic::{AtomicU64, Ordering};

    struct Job {
        input: u64,
        output: AtomicU64,
    }

    thread_entry! {
        /// Squares the job input.
        fn square(job: &Job) {
            job.output.store(job.input * job.input, Ordering::SeqCst);
        }
    }

    thread_entry! {
        fn count_to_ten(counter: &mut u64) {
            for _ in 0..10 {
                *counter += 1;
            }
        }
    }

    #[test]
    fn mutable_body_updates_plain_argument() {
        let mut counter = 5_u64;

        let arg: *mut c_void = ptr::from_mut(&mut counter).cast();
        // Safety: `counter` outlives the thread and is not touched until it was joined
        let thread = unsafe { raw::create_raw(count_to_ten, arg) }.unwrap();
        raw::join(thread);

        assert_eq!(counter, 15);
    }

    #[test]
    fn typed_body_is_callable_directly() {
        let job = Job {
            input: 7,
            output: AtomicU64::new(0),
        };
        square__impl(&job);
        assert_eq!(job.output.load(Ordering::SeqCst), 49);
    }

    #[test]
    fn wrapper_runs_on_new_thread() {
        let job = Job {
            input: 12,
            output: AtomicU64::new(0),
        };

        let arg: *mut c_void = ptr::from_ref(&job).cast_mut().cast();
        // Safety: `job` outlives the thread which is joined before returning
        let thread = unsafe { raw::create_raw(square, arg) }.unwrap();
        raw::join(thread);

        assert_eq!(job.output.load(Ordering::SeqCst), 144);
    }
}
