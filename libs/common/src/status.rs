// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::fmt;

/// Numeric status code.
///
/// Non-negative codes report success, negative codes report a failure. The discriminants are
/// stable and can be handed to callers that only understand plain integers.
#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Ok = 0,
    /// Element found.
    Found = 1,
    /// Generic error.
    Error = -1,
    /// Memory allocation failed.
    OutOfMemory = -2,
    /// Out of bounds or range error.
    OutOfBounds = -3,
    /// Container is empty.
    Empty = -4,
    /// Element not found.
    NotFound = -5,
    /// Invalid argument or parameter.
    InvalidArgument = -6,
    /// Element already exists.
    AlreadyExists = -7,
}

impl Status {
    /// Returns the raw integer code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Maps a raw integer code back to a `Status`, returning `None` for unknown codes.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::Found),
            -1 => Some(Self::Error),
            -2 => Some(Self::OutOfMemory),
            -3 => Some(Self::OutOfBounds),
            -4 => Some(Self::Empty),
            -5 => Some(Self::NotFound),
            -6 => Some(Self::InvalidArgument),
            -7 => Some(Self::AlreadyExists),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        self.code() >= 0
    }

    /// Collapses a `Result` into the status code describing it: [`Status::Ok`] for `Ok`, the
    /// error's own status otherwise.
    pub fn from_result<T, E>(result: &Result<T, E>) -> Self
    where
        for<'a> &'a E: Into<Status>,
    {
        match result {
            Ok(_) => Self::Ok,
            Err(err) => err.into(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Status::Ok => "ok",
            Status::Found => "found",
            Status::Error => "error",
            Status::OutOfMemory => "out of memory",
            Status::OutOfBounds => "out of bounds",
            Status::Empty => "empty",
            Status::NotFound => "not found",
            Status::InvalidArgument => "invalid argument",
            Status::AlreadyExists => "already exists",
        };
        f.pad(msg)
    }
}
