// SPDX-License-Identifier: MIT
//
// Key decoder.
//
// Turns the token stream of a `CharSource` into `Key` values. Two layers:
//
// - `decode_key` is a pure table lookup over one resolved token: a single
//   codepoint or a complete escape-sequence literal.
//
// - `KeyReader::read_token` resolves where a token ends. A plain codepoint
//   is its own token. An ESC starts a sequence that is extended only with
//   input that is already available: terminals send a sequence as one
//   burst, so when the next byte has not arrived the ESC was a keypress of
//   its own. There is no timer.
//
// Recognized sequences:
//
// - CSI `ESC [` and SS3 `ESC O` forms of arrows, Home/End, F1-F4
// - bare `ESC A..D` / `ESC H/F` (VT52-style arrows and Home/End)
// - `ESC [ n ~` editing and function keys
// - up to three doubled leading ESCs
//
// Anything else degrades to `Key::Char(literal)` rather than an error.

use std::fmt;

use tracing::trace;

use crate::discipline::LineDiscipline;
use crate::error::{Error, Result};
use crate::source::{CharSource, Lookahead, Next, Wait};
use crate::terminal::Terminal;

const ESC: &str = "\x1b";

// ─── Key ─────────────────────────────────────────────────────────────────────

/// One logical keypress.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A textual codepoint, or an unrecognized escape literal verbatim.
    Char(String),
    Arrow(Arrow),
    Escape,
    /// F1 through F12.
    FunctionKey(u8),
    Enter,
    Tab,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    /// A control character by its base letter: Ctrl-A is `Control('a')`.
    Control(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arrow {
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for Arrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

/// Stable human names: `up`, `f5`, `C-a`, `escape`. A `Char` displays as
/// its text.
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(s) => f.write_str(s),
            Self::Arrow(a) => a.fmt(f),
            Self::Escape => f.write_str("escape"),
            Self::FunctionKey(n) => write!(f, "f{n}"),
            Self::Enter => f.write_str("enter"),
            Self::Tab => f.write_str("tab"),
            Self::Backspace => f.write_str("backspace"),
            Self::Delete => f.write_str("delete"),
            Self::Insert => f.write_str("insert"),
            Self::Home => f.write_str("home"),
            Self::End => f.write_str("end"),
            Self::PageUp => f.write_str("page-up"),
            Self::PageDown => f.write_str("page-down"),
            Self::Control(c) => write!(f, "C-{c}"),
        }
    }
}

// ─── decode_key ──────────────────────────────────────────────────────────────

/// Map one resolved token to a [`Key`].
///
/// ```
/// use rawterm_tty::input::{decode_key, Arrow, Key};
///
/// assert_eq!(decode_key("\x1b[A"), Key::Arrow(Arrow::Up));
/// assert_eq!(decode_key("\x1bOP"), Key::FunctionKey(1));
/// assert_eq!(decode_key("\x01"), Key::Control('a'));
/// ```
#[must_use]
pub fn decode_key(token: &str) -> Key {
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return decode_single(c);
    }

    decode_sequence(token).unwrap_or_else(|| {
        trace!(literal = ?token, "unrecognized sequence");
        Key::Char(token.to_owned())
    })
}

fn decode_single(c: char) -> Key {
    match c {
        '\t' => Key::Tab,
        '\r' => Key::Enter,
        '\x1b' => Key::Escape,
        '\x7f' => Key::Backspace,
        c if c.is_ascii_control() => Key::Control(u8::try_from(c).map_or('_', control_letter)),
        c => Key::Char(c.to_string()),
    }
}

/// Base letter of a C0 control byte (0x00..=0x1F, minus the ones handled
/// as named keys).
const fn control_letter(byte: u8) -> char {
    match byte {
        0x00 => '@',
        0x01..=0x1A => (b'a' + byte - 1) as char,
        0x1C => '\\',
        0x1D => ']',
        0x1E => '^',
        _ => '_',
    }
}

fn decode_sequence(token: &str) -> Option<Key> {
    let body = token.strip_prefix(ESC)?;

    // ESC A / ESC O A / ESC [ A share the final byte.
    let last = match body.as_bytes() {
        [b] | [b'[' | b'O', b] => Some(*b),
        _ => None,
    };
    if let Some(b) = last {
        let key = match b {
            b'A' => Some(Key::Arrow(Arrow::Up)),
            b'B' => Some(Key::Arrow(Arrow::Down)),
            b'C' => Some(Key::Arrow(Arrow::Right)),
            b'D' => Some(Key::Arrow(Arrow::Left)),
            b'H' => Some(Key::Home),
            b'F' => Some(Key::End),
            _ => None,
        };
        if key.is_some() {
            return key;
        }
    }

    if let Some(ss3) = body.strip_prefix('O') {
        return match ss3 {
            "P" => Some(Key::FunctionKey(1)),
            "Q" => Some(Key::FunctionKey(2)),
            "R" => Some(Key::FunctionKey(3)),
            "S" => Some(Key::FunctionKey(4)),
            _ => None,
        };
    }

    let param = body.strip_prefix('[')?.strip_suffix('~')?;
    match param {
        "2" => Some(Key::Insert),
        "3" => Some(Key::Delete),
        "4" | "8" => Some(Key::End),
        "5" => Some(Key::PageUp),
        "6" => Some(Key::PageDown),
        "7" => Some(Key::Home),
        "11" => Some(Key::FunctionKey(1)),
        "12" => Some(Key::FunctionKey(2)),
        "13" => Some(Key::FunctionKey(3)),
        "14" => Some(Key::FunctionKey(4)),
        "15" => Some(Key::FunctionKey(5)),
        "17" => Some(Key::FunctionKey(6)),
        "18" => Some(Key::FunctionKey(7)),
        "19" => Some(Key::FunctionKey(8)),
        "20" => Some(Key::FunctionKey(9)),
        "21" => Some(Key::FunctionKey(10)),
        "23" => Some(Key::FunctionKey(11)),
        "24" => Some(Key::FunctionKey(12)),
        _ => None,
    }
}

// ─── KeyReader ───────────────────────────────────────────────────────────────

/// Tuning for sequence resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Extra leading ESCs accepted before a sequence body. Some terminals
    /// double the escape for Alt-modified keys.
    ///
    /// Absorbed escapes stay in the token, and the sequence table only knows
    /// single-ESC literals, so a token with doubled escapes never decodes to
    /// a structured key: `ESC ESC [ A` is `Key::Char`, not an arrow.
    pub max_extra_escapes: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_extra_escapes: 3,
        }
    }
}

/// Reads [`Key`]s from a [`CharSource`].
#[derive(Debug)]
pub struct KeyReader<S> {
    input: Lookahead<S>,
    config: DecoderConfig,
}

impl<S: CharSource> KeyReader<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, DecoderConfig::default())
    }

    pub const fn with_config(source: S, config: DecoderConfig) -> Self {
        Self {
            input: Lookahead::new(source),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn into_inner(self) -> S {
        self.input.into_inner()
    }

    /// Read one keypress with the terminal in raw mode for the duration of
    /// the read. The guard is released on every exit path.
    ///
    /// # Errors
    ///
    /// [`Error::NotATty`] if raw mode cannot be entered, otherwise as
    /// [`read_token`](Self::read_token).
    pub fn read_key<D: LineDiscipline>(&mut self, terminal: &Terminal<D>) -> Result<Key> {
        let _raw = terminal.enter_raw_mode()?;
        let token = self.read_token()?;
        let key = decode_key(&token);
        trace!(%key, "key");
        Ok(key)
    }

    /// Read one resolved token: a single codepoint or an escape-sequence
    /// literal. Blocks only for its first codepoint.
    ///
    /// When a sequence is cut short because input is pending, ended, or
    /// failed, the prefix read so far is the token.
    ///
    /// # Errors
    ///
    /// [`Error::EndOfInput`] if the stream ended before any token, or
    /// [`Error::Io`] if the source failed before any token.
    pub fn read_token(&mut self) -> Result<String> {
        let first = match self.input.next(Wait::Block) {
            Next::Token(t) => t,
            Next::Pending | Next::End => return Err(Error::EndOfInput),
            Next::Failed(err) => return Err(err.into()),
        };

        let mut literal = first;
        if literal == ESC {
            self.resolve_escape(&mut literal);
        }
        self.input.commit();
        Ok(literal)
    }

    /// Extend `literal` (currently one ESC) with whatever of the sequence
    /// is already available.
    fn resolve_escape(&mut self, literal: &mut String) {
        for _ in 0..self.config.max_extra_escapes {
            match self.input.next(Wait::Ready) {
                Next::Token(t) if t == ESC => literal.push_str(&t),
                Next::Token(_) => {
                    self.input.unread();
                    break;
                }
                _ => return,
            }
        }

        let Next::Token(intro) = self.input.next(Wait::Ready) else {
            return;
        };
        literal.push_str(&intro);
        if intro != "[" && intro != "O" {
            return;
        }

        // Parameter bytes, then exactly one final byte.
        while let Next::Token(t) = self.input.next(Wait::Ready) {
            let is_param = matches!(t.as_bytes(), [b'0'..=b'9' | b';']);
            literal.push_str(&t);
            if !is_param {
                break;
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
