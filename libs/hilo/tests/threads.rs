// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use hilo::{Status, Thread, raw};
use proptest::prelude::*;

struct Recorder {
    calls: AtomicUsize,
    seen: OnceLock<Vec<u64>>,
}

impl Recorder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            seen: OnceLock::new(),
        })
    }
}

fn record((recorder, values): (Arc<Recorder>, Vec<u64>)) {
    recorder.calls.fetch_add(1, Ordering::SeqCst);
    recorder.seen.set(values).unwrap();
}

hilo::thread_entry! {
    fn record_raw(recorder: &Recorder) {
        recorder.calls.fetch_add(1, Ordering::SeqCst);
        recorder.seen.set(vec![u64::MAX]).unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn create_runs_entry_once_with_its_argument(values in proptest::collection::vec(any::<u64>(), 0..64)) {
        let recorder = Recorder::new();

        let thread = raw::create(record, (recorder.clone(), values.clone())).unwrap();
        raw::join(thread);

        prop_assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
        prop_assert_eq!(recorder.seen.get(), Some(&values));
        // the thread released its clone when the start record was freed
        prop_assert_eq!(Arc::strong_count(&recorder), 1);
    }

    #[test]
    fn thread_runs_closure_once_with_its_captures(values in proptest::collection::vec(any::<u64>(), 0..64)) {
        let recorder = Recorder::new();

        let mut thread = Thread::with_arg(record, (recorder.clone(), values.clone()));
        prop_assert!(thread.is_joinable());
        thread.join();

        prop_assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
        prop_assert_eq!(recorder.seen.get(), Some(&values));
        prop_assert_eq!(Arc::strong_count(&recorder), 1);
    }
}

#[test]
fn raw_entry_sees_the_same_object() {
    let recorder = Recorder::new();

    let arg: *mut c_void = ptr::from_ref(&*recorder).cast_mut().cast();
    // Safety: `recorder` outlives the thread which is joined right away
    let thread = unsafe { raw::create_raw(record_raw, arg) }.unwrap();
    raw::join(thread);

    assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.seen.get(), Some(&vec![u64::MAX]));
}

#[test]
fn many_threads_each_run_once() {
    const THREADS: usize = 32;
    let calls = Arc::new(AtomicUsize::new(0));

    let mut threads: Vec<Thread> = (0..THREADS)
        .map(|_| {
            let calls = calls.clone();
            Thread::try_new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
        })
        .collect();

    for thread in &mut threads {
        thread.join();
    }

    assert_eq!(calls.load(Ordering::SeqCst), THREADS);
}

#[test]
fn create_result_maps_to_ok_status() {
    fn nothing((): ()) {}

    let result = raw::create(nothing, ());
    assert_eq!(Status::from_result(&result), Status::Ok);
    raw::join(result.unwrap());
}
