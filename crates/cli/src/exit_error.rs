// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.
//!
//! Exit codes: 1 user error, 2 system error, 3 agent connection refused.

use std::fmt;

pub const EXIT_USER: i32 = 1;
pub const EXIT_SYSTEM: i32 = 2;
pub const EXIT_CONNECT: i32 = 3;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(EXIT_USER, message)
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(EXIT_SYSTEM, message)
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
