// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Definitions shared by the hilo crates.
//!
//! This crate supplies the numeric [`Status`] codes reported across FFI-style boundaries and,
//! behind the `counters` feature, an instrumented allocator that tracks live allocations.

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "counters")]
mod counting;
mod status;

#[cfg(feature = "counters")]
pub use counting::Counting;
pub use status::Status;
