// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Ownership violations on a joinable `Thread` terminate the process, so each of those tests
//! re-runs itself in a child process and inspects how the child exited.

use std::env;
use std::process::{Command, ExitStatus};
use std::time::Duration;

use hilo::Thread;

const CHILD_ENV: &str = "HILO_ABORT_CHILD";

/// Runs `body` in a child process if we are the parent, or right here if we are the child.
///
/// Returns the child's exit status in the parent, never returns in an aborting child.
fn in_child(test_name: &str, body: impl FnOnce()) -> Option<ExitStatus> {
    if env::var_os(CHILD_ENV).is_some() {
        body();
        return None;
    }

    let exe = env::current_exe().unwrap();
    let status = Command::new(exe)
        .args(["--exact", test_name, "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .status()
        .unwrap();
    Some(status)
}

fn assert_aborted(status: ExitStatus) {
    assert!(!status.success(), "child exited successfully: {status:?}");

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(status.signal(), Some(libc::SIGABRT), "child exited with {status:?}");
    }
}

fn long_running() -> Thread {
    Thread::new(|| Thread::sleep(Duration::from_secs(5)))
}

#[test]
fn dropping_joinable_thread_aborts() {
    if let Some(status) = in_child("dropping_joinable_thread_aborts", || {
        let thread = long_running();
        drop(thread);
    }) {
        assert_aborted(status);
    }
}

#[test]
fn assigning_over_joinable_thread_aborts() {
    if let Some(status) = in_child("assigning_over_joinable_thread_aborts", || {
        let mut thread = long_running();
        assert!(thread.is_joinable());
        thread = Thread::default();
        // not reached
        thread.join();
    }) {
        assert_aborted(status);
    }
}

#[test]
fn dropping_non_joinable_threads_is_fine() {
    drop(Thread::default());

    let mut joined = Thread::new(|| {});
    joined.join();
    drop(joined);

    let mut detached = Thread::new(|| {});
    detached.detach();
    drop(detached);

    let mut source = Thread::new(|| {});
    let mut destination = source.take();
    drop(source);
    destination.join();
}
