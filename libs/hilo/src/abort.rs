// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

/// Terminates the process after a thread ownership violation. This function will never return.
///
/// Dropping a joinable [`Thread`](crate::Thread), or assigning over one, would leave a live OS
/// thread that nobody can join anymore. There is no way to recover from that, so we abort.
///
/// # Breakpoint support
///
/// The symbol `hilo_ownership_abort` will never be mangled so you can safely put a breakpoint
/// on it to catch the process just before it exits.
#[cold]
#[inline(never)]
#[unsafe(export_name = "hilo_ownership_abort")]
pub(crate) fn ownership_violation(reason: &str) -> ! {
    tracing::error!("{reason}, aborting");
    std::eprintln!("hilo: {reason}, aborting");
    std::process::abort();
}
