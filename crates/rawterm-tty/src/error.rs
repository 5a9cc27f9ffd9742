// SPDX-License-Identifier: MIT
//
// Error taxonomy for the terminal core.
//
// Unknown escape sequences are deliberately absent: they decode to a
// literal `Key::Char` instead of failing the read.

use std::io;

/// Errors surfaced by raw-mode entry, key reads, and styled output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Raw mode or a key read was requested on a descriptor that is not a
    /// terminal (its line-discipline attributes could not be read).
    #[error("input is not a terminal")]
    NotATty,

    /// A color index outside `-1..=255` was rejected.
    #[error("color {0} is out of range (expected -1 for default, or 0..=255)")]
    InvalidColor(i32),

    /// The character source ended before any token of a key arrived.
    #[error("input ended before a key was read")]
    EndOfInput,

    /// The character source or an output sink failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
