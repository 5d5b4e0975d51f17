// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::fmt;
use hilo_common::Status;

/// Error returned when a thread could not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateError {
    /// The start record could not be allocated. No OS thread was requested.
    OutOfMemory,
    /// The OS refused to create the thread.
    CreationFailed {
        /// Platform error code (`errno` value or `GetLastError` code).
        code: i32,
    },
}

impl CreateError {
    /// Returns the status code reported for this error.
    #[must_use]
    pub const fn status(self) -> Status {
        match self {
            CreateError::OutOfMemory => Status::OutOfMemory,
            CreateError::CreationFailed { .. } => Status::Error,
        }
    }
}

impl From<CreateError> for Status {
    fn from(err: CreateError) -> Self {
        err.status()
    }
}

impl From<&CreateError> for Status {
    fn from(err: &CreateError) -> Self {
        err.status()
    }
}

impl fmt::Display for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateError::OutOfMemory => f.write_str("failed to allocate thread start record"),
            CreateError::CreationFailed { code } => {
                write!(f, "failed to create native thread (os error {code})")
            }
        }
    }
}

impl core::error::Error for CreateError {}
