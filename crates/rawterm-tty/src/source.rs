// SPDX-License-Identifier: MIT
//
// Character sources — where key tokens come from.
//
// Safety: `StdinSource` uses `unsafe` for poll and read on the input file
// descriptor. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// The escape resolver needs one thing a plain `Read` cannot give it: the
// difference between "no byte has arrived yet" and "the stream ended". A
// terminal delivers an escape sequence as a single burst, so an ESC that is
// not immediately followed by more input was a bare Escape keypress. The
// `CharSource` trait therefore has two reads: a blocking one for the first
// token of a key, and a non-blocking one that may answer `Pending`.
//
// Tokens are single codepoints as `String`s. Bytes that are not valid UTF-8
// become U+FFFD so a stray byte cannot wedge the reader.
//
// `Lookahead` sits on top of a source and adds the pushback the resolver
// uses to re-examine a token it already pulled.

use std::collections::VecDeque;
use std::io;

/// Outcome of pulling one token from a source.
#[derive(Debug)]
pub enum Next {
    /// One codepoint.
    Token(String),
    /// Nothing available right now; the stream is still open.
    Pending,
    /// The stream ended.
    End,
    /// The source failed.
    Failed(io::Error),
}

/// A stream of single-codepoint tokens that can tell "not yet" from "never".
pub trait CharSource {
    /// Wait until a token arrives, the stream ends, or the source fails.
    /// Never returns [`Next::Pending`].
    fn next_blocking(&mut self) -> Next;

    /// Return a token only if one is already available.
    fn next_ready(&mut self) -> Next;
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn next_blocking(&mut self) -> Next {
        (**self).next_blocking()
    }

    fn next_ready(&mut self) -> Next {
        (**self).next_ready()
    }
}

// ─── Lookahead ───────────────────────────────────────────────────────────────

/// How a [`Lookahead`] read should behave when its buffer is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Block on the source.
    Block,
    /// Ask the source without waiting; may yield `Pending`.
    Ready,
}

/// A buffered reader over a [`CharSource`] with pushback.
///
/// Tokens handed out stay buffered until [`commit`](Self::commit), so
/// [`unread`](Self::unread) can step back over them.
#[derive(Debug)]
pub struct Lookahead<S> {
    source: S,
    buffered: VecDeque<String>,
    /// Index of the next buffered token to hand out.
    cursor: usize,
}

impl<S: CharSource> Lookahead<S> {
    pub const fn new(source: S) -> Self {
        Self {
            source,
            buffered: VecDeque::new(),
            cursor: 0,
        }
    }

    /// Hand out the next token: from the pushback buffer if possible,
    /// otherwise from the source.
    pub fn next(&mut self, wait: Wait) -> Next {
        if let Some(token) = self.buffered.get(self.cursor) {
            self.cursor += 1;
            return Next::Token(token.clone());
        }

        let next = match wait {
            Wait::Block => self.source.next_blocking(),
            Wait::Ready => self.source.next_ready(),
        };
        if let Next::Token(ref token) = next {
            self.buffered.push_back(token.clone());
            self.cursor += 1;
        }
        next
    }

    /// Step back over the most recently handed-out token.
    pub fn unread(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Forget every token handed out so far. Pushed-back tokens stay.
    pub fn commit(&mut self) {
        self.buffered.drain(..self.cursor);
        self.cursor = 0;
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

// ─── ChunkedSource ───────────────────────────────────────────────────────────

/// An in-memory source that delivers its input in bursts.
///
/// Within a burst every token is immediately available. Between bursts
/// [`next_ready`](CharSource::next_ready) reports `Pending` and only a
/// blocking read moves on, the same way a terminal hands over one keypress
/// at a time.
///
/// ```
/// use rawterm_tty::source::{CharSource, ChunkedSource, Next};
///
/// let mut src = ChunkedSource::new(["\x1b", "[A"]);
/// assert!(matches!(src.next_blocking(), Next::Token(t) if t == "\x1b"));
/// assert!(matches!(src.next_ready(), Next::Pending));
/// ```
#[derive(Debug, Default)]
pub struct ChunkedSource {
    bursts: VecDeque<VecDeque<String>>,
    fail_at_end: bool,
}

impl ChunkedSource {
    /// One burst per item, each split into codepoint tokens.
    pub fn new<'a>(bursts: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            bursts: bursts
                .into_iter()
                .map(|b| b.chars().map(String::from).collect())
                .collect(),
            fail_at_end: false,
        }
    }

    /// Report a source failure instead of end-of-stream once drained.
    #[must_use]
    pub const fn then_fail(mut self) -> Self {
        self.fail_at_end = true;
        self
    }

    fn exhausted(&self) -> Next {
        if self.fail_at_end {
            Next::Failed(io::Error::new(io::ErrorKind::BrokenPipe, "source failed"))
        } else {
            Next::End
        }
    }
}

impl CharSource for ChunkedSource {
    fn next_blocking(&mut self) -> Next {
        while let Some(burst) = self.bursts.front_mut() {
            if let Some(token) = burst.pop_front() {
                return Next::Token(token);
            }
            self.bursts.pop_front();
        }
        self.exhausted()
    }

    fn next_ready(&mut self) -> Next {
        let remaining = self.bursts.len();
        match self.bursts.front_mut() {
            None => self.exhausted(),
            Some(burst) => match burst.pop_front() {
                Some(token) => Next::Token(token),
                None if remaining > 1 => Next::Pending,
                None => self.exhausted(),
            },
        }
    }
}

// ─── StdinSource ─────────────────────────────────────────────────────────────

/// Read buffer size. A keypress is 1-6 bytes; a paste can be much more.
const READ_BUF_SIZE: usize = 1024;

/// Tokens from a raw terminal file descriptor (stdin by default).
///
/// A blocking read waits in `read()`; a ready read first polls the
/// descriptor with a zero timeout and answers `Pending` if nothing is
/// waiting. Partially received codepoints stay buffered across calls.
#[derive(Debug)]
pub struct StdinSource {
    #[cfg_attr(not(unix), allow(dead_code))]
    fd: i32,
    bytes: VecDeque<u8>,
    eof: bool,
}

enum Fill {
    Filled,
    Pending,
    End,
}

impl StdinSource {
    #[must_use]
    pub const fn new() -> Self {
        Self::from_fd(0)
    }

    #[must_use]
    pub const fn from_fd(fd: i32) -> Self {
        Self {
            fd,
            bytes: VecDeque::new(),
            eof: false,
        }
    }

    #[cfg(unix)]
    fn fill(&mut self, wait: Wait) -> io::Result<Fill> {
        if self.eof {
            return Ok(Fill::End);
        }

        if wait == Wait::Ready {
            let ready = unsafe {
                let mut pfd = libc::pollfd {
                    fd: self.fd,
                    events: libc::POLLIN,
                    revents: 0,
                };
                libc::poll(&raw mut pfd, 1, 0)
            };
            if ready < 0 {
                return Err(io::Error::last_os_error());
            }
            if ready == 0 {
                return Ok(Fill::Pending);
            }
        }

        let mut buf = [0u8; READ_BUF_SIZE];
        loop {
            let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            if n == 0 {
                self.eof = true;
                return Ok(Fill::End);
            }
            #[allow(clippy::cast_sign_loss)] // n > 0 checked above.
            self.bytes.extend(&buf[..n as usize]);
            return Ok(Fill::Filled);
        }
    }

    #[cfg(not(unix))]
    fn fill(&mut self, _wait: Wait) -> io::Result<Fill> {
        use std::io::Read;

        let mut buf = [0u8; READ_BUF_SIZE];
        match io::stdin().lock().read(&mut buf)? {
            0 => {
                self.eof = true;
                Ok(Fill::End)
            }
            n => {
                self.bytes.extend(&buf[..n]);
                Ok(Fill::Filled)
            }
        }
    }

    /// Split one codepoint off the front of the byte buffer, if complete.
    fn take_token(&mut self) -> Option<String> {
        let lead = *self.bytes.front()?;
        let len = utf8_char_len(lead);
        if len == 0 {
            self.bytes.pop_front();
            return Some(char::REPLACEMENT_CHARACTER.to_string());
        }
        if self.bytes.len() < len {
            return None;
        }

        let raw: Vec<u8> = self.bytes.iter().take(len).copied().collect();
        if let Ok(s) = std::str::from_utf8(&raw) {
            self.bytes.drain(..len);
            Some(s.to_owned())
        } else {
            self.bytes.pop_front();
            Some(char::REPLACEMENT_CHARACTER.to_string())
        }
    }

    fn next_with(&mut self, wait: Wait) -> Next {
        loop {
            if let Some(token) = self.take_token() {
                return Next::Token(token);
            }
            match self.fill(wait) {
                Ok(Fill::Filled) => {}
                Ok(Fill::Pending) => return Next::Pending,
                Ok(Fill::End) if self.bytes.is_empty() => return Next::End,
                // A truncated codepoint at end of stream is one bad char.
                Ok(Fill::End) => {
                    self.bytes.clear();
                    return Next::Token(char::REPLACEMENT_CHARACTER.to_string());
                }
                Err(err) => return Next::Failed(err),
            }
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CharSource for StdinSource {
    fn next_blocking(&mut self) -> Next {
        self.next_with(Wait::Block)
    }

    fn next_ready(&mut self) -> Next {
        self.next_with(Wait::Ready)
    }
}

/// Expected byte length of a UTF-8 character from its lead byte.
/// Returns 0 for invalid lead bytes (continuation bytes, 0xF8..).
const fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 0,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
