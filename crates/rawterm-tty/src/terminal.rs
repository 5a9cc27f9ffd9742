// SPDX-License-Identifier: MIT
//
// Terminal control — raw-mode arbitration, cursor visibility, and cleanup.
//
// Safety: this module uses `unsafe` for ioctl (TIOCGWINSZ) and isatty.
// These are the standard POSIX interfaces for terminal queries; there is no
// safe alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// `Terminal` owns the only mutable terminal state in the crate: whether the
// line discipline is raw (and the attributes to restore when it stops being
// raw), how many callers currently want it raw, and whether the cursor is
// hidden. Independent callers request raw mode through `enter_raw_mode` and
// get back a guard. The first request snapshots the attributes and applies
// the raw transform; nested requests just bump the count; the guard that
// brings the count back to zero restores the snapshot. Guards release on
// drop, so early returns, `?`, and unwinding all give raw mode back.
//
// Pending stdout/stderr bytes are flushed before every attribute change.
// Output written in canonical mode must reach the tty before the discipline
// changes under it, otherwise its ordering relative to the switch is
// undefined.
//
// The state is per-handle rather than process-global, so tests can run
// several terminals over fake disciplines side by side. The binary keeps
// exactly one, and calls `cleanup` once at shutdown.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::io::Write;

use tracing::{debug, trace, warn};

use crate::ansi;
use crate::discipline::{LineDiscipline, Termios};
use crate::error::{Error, Result};
use crate::grid::{self, Grid};
use crate::output::OutputStream;
use crate::style::StyledText;

// ─── Size ────────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Fallback used when the size cannot be queried (pipes, tests).
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)` on stdout.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Check whether a file descriptor is connected to a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty(fd: i32) -> bool {
    unsafe { libc::isatty(fd) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty(_fd: i32) -> bool {
    false
}

// ─── State ───────────────────────────────────────────────────────────────────

/// Line-discipline mode, carrying the attributes to restore while raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalState<A> {
    /// Canonical mode; nothing to restore.
    Normal,
    /// Raw mode, with the attributes captured before entering it.
    Raw(A),
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// The process's handle on its controlling terminal.
///
/// ```no_run
/// use rawterm_tty::terminal::Terminal;
///
/// let term = Terminal::stdio();
/// {
///     let _raw = term.enter_raw_mode()?;
///     assert!(term.raw_mode());
///     // ... read keys ...
/// }
/// assert!(!term.raw_mode());
/// term.cleanup();
/// # Ok::<(), rawterm_tty::Error>(())
/// ```
pub struct Terminal<D: LineDiscipline = Termios> {
    discipline: D,
    state: RefCell<TerminalState<D::Attributes>>,
    /// Live raw-mode guards. Non-zero exactly when `state` is `Raw`.
    depth: Cell<usize>,
    cursor_hidden: Cell<bool>,
    /// Bumped by `cleanup`. Guards from an earlier generation release nothing.
    generation: Cell<u64>,
    stdout: RefCell<OutputStream>,
    stderr: RefCell<OutputStream>,
}

impl Terminal<Termios> {
    /// The controlling terminal: stdin's line discipline, real stdout and
    /// stderr with their interactivity probed once.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(Termios::stdin(), OutputStream::stdout(), OutputStream::stderr())
    }
}

impl<D: LineDiscipline> Terminal<D> {
    /// Build a terminal over an arbitrary discipline and output streams.
    pub fn new(discipline: D, stdout: OutputStream, stderr: OutputStream) -> Self {
        Self {
            discipline,
            state: RefCell::new(TerminalState::Normal),
            depth: Cell::new(0),
            cursor_hidden: Cell::new(false),
            generation: Cell::new(0),
            stdout: RefCell::new(stdout),
            stderr: RefCell::new(stderr),
        }
    }

    /// Whether the terminal is currently in raw mode. No side effects.
    #[must_use]
    pub fn raw_mode(&self) -> bool {
        matches!(*self.state.borrow(), TerminalState::Raw(_))
    }

    /// Number of live raw-mode guards.
    #[must_use]
    pub fn raw_depth(&self) -> usize {
        self.depth.get()
    }

    /// Current size, falling back to 80×24 when it cannot be queried.
    #[must_use]
    pub fn size(&self) -> Size {
        get_size().unwrap_or(Size::FALLBACK)
    }

    // ── Raw Mode ────────────────────────────────────────────────────

    /// Acquire raw mode for the lifetime of the returned guard.
    ///
    /// Nested acquisitions are free: only the first one touches the line
    /// discipline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotATty`] if the input's attributes cannot be read.
    pub fn enter_raw_mode(&self) -> Result<RawModeGuard<'_, D>> {
        let depth = self.depth.get();
        if depth > 0 {
            self.depth.set(depth + 1);
            trace!(depth = depth + 1, "raw mode nested");
            return Ok(self.guard());
        }

        let saved = self
            .discipline
            .get_attributes()
            .map_err(|_| Error::NotATty)?;

        self.flush_outputs();
        if let Err(err) = self.discipline.set_attributes(&D::make_raw(&saved)) {
            warn!(%err, "failed to apply raw attributes");
        }

        *self.state.borrow_mut() = TerminalState::Raw(saved);
        self.depth.set(1);
        debug!("entered raw mode");

        Ok(self.guard())
    }

    fn guard(&self) -> RawModeGuard<'_, D> {
        RawModeGuard {
            terminal: self,
            generation: self.generation.get(),
        }
    }

    /// Release one raw-mode acquisition. Runs from `RawModeGuard::drop`.
    ///
    /// # Panics
    ///
    /// Panics on release without a matching acquisition: that is a bug in
    /// the caller, not a runtime condition.
    fn leave_raw_mode(&self, generation: u64) {
        if generation != self.generation.get() {
            return;
        }

        let depth = self.depth.get();
        assert!(depth > 0, "raw mode released more times than it was acquired");
        self.depth.set(depth - 1);
        if depth > 1 {
            trace!(depth = depth - 1, "raw mode unnested");
            return;
        }

        self.flush_outputs();
        self.restore();
        debug!("left raw mode");
    }

    /// Put the saved attributes back and return to `Normal`. Best-effort.
    fn restore(&self) {
        let previous = self.state.replace(TerminalState::Normal);
        if let TerminalState::Raw(saved) = previous {
            if let Err(err) = self.discipline.set_attributes(&saved) {
                warn!(%err, "failed to restore terminal attributes");
            }
        }
    }

    fn flush_outputs(&self) {
        for stream in [&self.stdout, &self.stderr] {
            if let Ok(mut s) = stream.try_borrow_mut() {
                s.flush().ok();
            }
        }
    }

    // ── Cursor ──────────────────────────────────────────────────────

    /// Hide the cursor and remember to show it again at cleanup. The flag
    /// is tracked even when stdout is not a terminal; the escape is not.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn hide_cursor(&self) -> Result<()> {
        self.cursor_hidden.set(true);
        self.write_control(ansi::CURSOR_HIDE)
    }

    /// Show the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn show_cursor(&self) -> Result<()> {
        self.cursor_hidden.set(false);
        self.write_control(ansi::CURSOR_SHOW)
    }

    /// Erase the whole screen. Nothing is written when stdout is not a
    /// terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn clear_screen(&self) -> Result<()> {
        let mut seq = String::new();
        ansi::clear_screen(&mut seq).ok();
        self.write_control(&seq)
    }

    /// Whether [`hide_cursor`](Self::hide_cursor) is in effect.
    #[must_use]
    pub fn cursor_hidden(&self) -> bool {
        self.cursor_hidden.get()
    }

    // ── Shutdown ────────────────────────────────────────────────────

    /// Restore the terminal at process shutdown.
    ///
    /// Shows the cursor if it was hidden and, if raw mode is active, restores
    /// the saved attributes directly, ignoring any guards still alive. Call
    /// once, from the process's exit path.
    pub fn cleanup(&self) {
        if self.cursor_hidden.get() {
            self.show_cursor().ok();
        }
        if self.raw_mode() {
            self.flush_outputs();
            self.restore();
            self.depth.set(0);
            self.generation.set(self.generation.get() + 1);
            debug!("terminal restored at shutdown");
        }
    }

    // ── Output ──────────────────────────────────────────────────────

    /// Print styled text to stdout (escapes only if stdout is a terminal).
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn print(&self, text: &StyledText) -> Result<()> {
        Ok(self.stdout.borrow_mut().print(text)?)
    }

    /// [`print`](Self::print) plus a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn print_line(&self, text: &StyledText) -> Result<()> {
        Ok(self.stdout.borrow_mut().print_line(text)?)
    }

    /// Print styled text to stderr (escapes only if stderr is a terminal).
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stderr fails.
    pub fn eprint(&self, text: &StyledText) -> Result<()> {
        Ok(self.stderr.borrow_mut().print(text)?)
    }

    /// [`eprint`](Self::eprint) plus a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stderr fails.
    pub fn eprint_line(&self, text: &StyledText) -> Result<()> {
        Ok(self.stderr.borrow_mut().print_line(text)?)
    }

    /// Render a full frame to stdout in a single write, then flush.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn render(&self, frame: &Grid) -> Result<()> {
        self.write_stdout(&grid::render(frame))
    }

    /// Flush stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn flush(&self) -> Result<()> {
        Ok(self.stdout.borrow_mut().flush()?)
    }

    /// Write a control sequence, but only to an interactive stdout.
    fn write_control(&self, s: &str) -> Result<()> {
        if !self.stdout.borrow().is_interactive() {
            return Ok(());
        }
        self.write_stdout(s)
    }

    fn write_stdout(&self, s: &str) -> Result<()> {
        let mut out = self.stdout.borrow_mut();
        out.write_all(s.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

impl<D: LineDiscipline> fmt::Debug for Terminal<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("raw", &self.raw_mode())
            .field("depth", &self.depth.get())
            .field("cursor_hidden", &self.cursor_hidden.get())
            .finish_non_exhaustive()
    }
}

// ─── Guard ───────────────────────────────────────────────────────────────────

/// One raw-mode acquisition. Dropping it releases the acquisition; the last
/// release restores the terminal.
#[must_use = "raw mode is released as soon as the guard is dropped"]
pub struct RawModeGuard<'t, D: LineDiscipline> {
    terminal: &'t Terminal<D>,
    generation: u64,
}

impl<D: LineDiscipline> Drop for RawModeGuard<'_, D> {
    fn drop(&mut self) {
        self.terminal.leave_raw_mode(self.generation);
    }
}

impl<D: LineDiscipline> fmt::Debug for RawModeGuard<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawModeGuard")
            .field("depth", &self.terminal.depth.get())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
