// SPDX-License-Identifier: MIT
//
// rawterm-tty — terminal control core for rawterm.
//
// Three concerns live here, leaves first:
//
//   - Mode arbitration: a single reference-counted owner of the controlling
//     terminal's line discipline. Nested raw-mode requests share one termios
//     change; the last guard to drop restores the saved attributes.
//   - Input: a lookahead over a character source and an escape-sequence
//     resolver that turns bursts like `ESC [ 1 5 ~` into a `Key`, treating
//     "nothing has arrived yet" as a bare Escape instead of blocking.
//   - Output: a styled-text codec that merges pending SGR codes into one
//     escape sequence per run of text, and a grid renderer that only emits
//     SGR when the style changes between adjacent cells.
//
// Every byte sent to the terminal is a literal ANSI/VT100 sequence. No
// terminal framework sits between this crate and the tty.

pub mod ansi;
pub mod color;
pub mod discipline;
pub mod error;
pub mod grid;
pub mod input;
pub mod output;
pub mod source;
pub mod style;
pub mod terminal;

pub use error::{Error, Result};
