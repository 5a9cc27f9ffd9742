// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that append escape sequences to any `fmt::Write` (in
// practice a `String` frame or styled-text buffer). No state, no decisions
// about when to emit; that is the style codec's and grid renderer's job.
// This module only knows the byte-level encoding.
//
// SGR parameters are gathered as numeric codes first and written out as a
// single `ESC [ a ; b ; c m` sequence, so callers can merge several pending
// attributes into one escape.
//
// Writing into a `String` cannot fail, so callers are free to ignore the
// returned `fmt::Result`.

use std::fmt::{self, Write};

use crate::color::Color;

// ─── SGR Codes ───────────────────────────────────────────────────────────────

/// SGR 0: reset every attribute and both colors.
pub const RESET: u8 = 0;
/// SGR 1: bold / increased intensity.
pub const BOLD: u8 = 1;
/// SGR 4: underline.
pub const UNDERLINE: u8 = 4;
/// SGR 5: blink.
pub const BLINK: u8 = 5;
/// SGR 7: swap foreground and background.
pub const INVERSE: u8 = 7;
/// SGR 8: hidden text.
pub const HIDDEN: u8 = 8;

/// Append the SGR codes selecting `color` as the foreground.
///
/// `-1` maps to 39, palette 0-7 to 30-37, and everything from 8 upwards to
/// the extended `38;5;N` form.
pub fn fg_codes(codes: &mut Vec<u8>, color: Color) {
    color_codes(codes, color, 30, 38, 39);
}

/// Append the SGR codes selecting `color` as the background.
///
/// Same layout as [`fg_codes`] with 40-47, `48;5;N`, and 49.
pub fn bg_codes(codes: &mut Vec<u8>, color: Color) {
    color_codes(codes, color, 40, 48, 49);
}

fn color_codes(codes: &mut Vec<u8>, color: Color, base: u8, extended: u8, default: u8) {
    match color.palette() {
        None => codes.push(default),
        Some(n @ 0..=7) => codes.push(base + n),
        Some(n) => codes.extend_from_slice(&[extended, 5, n]),
    }
}

/// Write `codes` as one SGR escape sequence: `ESC [ c1 ; c2 ; ... m`.
///
/// Writes nothing when `codes` is empty. An empty SGR (`ESC [ m`) would mean
/// "reset" to the terminal, which is never what an empty queue intends.
pub fn sgr(w: &mut impl Write, codes: &[u8]) -> fmt::Result {
    let Some((first, rest)) = codes.split_first() else {
        return Ok(());
    };
    write!(w, "\x1b[{first}")?;
    for code in rest {
        write!(w, ";{code}")?;
    }
    w.write_char('m')
}

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to the top-left corner.
#[inline]
pub fn cursor_home(w: &mut impl Write) -> fmt::Result {
    w.write_str("\x1b[H")
}

/// Hide the cursor (DECTCEM reset).
pub const CURSOR_HIDE: &str = "\x1b[?25l";

/// Show the cursor (DECTCEM set).
pub const CURSOR_SHOW: &str = "\x1b[?25h";

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> fmt::Result {
    w.write_str("\x1b[2J")
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> fmt::Result {
    w.write_str("\x1b[0m")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
