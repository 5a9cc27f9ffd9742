// SPDX-License-Identifier: MIT
//
// Output streams with cached terminal capability.
//
// Every stream decides once, at construction, whether it is attached to an
// interactive terminal. Styled prints consult that cached answer instead of
// probing the descriptor per call: escape sequences go to terminals, plain
// text goes to pipes and log files.

use std::fmt;
use std::io::{self, Write};

use crate::style::{self, StyledText};

/// A byte sink plus its cached "is this a terminal?" answer.
pub struct OutputStream {
    writer: Box<dyn Write>,
    interactive: bool,
}

impl OutputStream {
    /// Wrap an arbitrary writer, declaring whether it reaches a terminal.
    pub fn new(writer: impl Write + 'static, interactive: bool) -> Self {
        Self {
            writer: Box::new(writer),
            interactive,
        }
    }

    /// Standard output, probed once with `isatty`.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout(), crate::terminal::is_tty(1))
    }

    /// Standard error, probed once with `isatty`.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(io::stderr(), crate::terminal::is_tty(2))
    }

    /// Whether this stream was attached to a terminal at construction.
    #[inline]
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Write styled text: compiled to escapes on a terminal, stripped to
    /// plain text otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn print(&mut self, text: &StyledText) -> io::Result<()> {
        let mut buf = String::new();
        style::render_for(&mut buf, text, self.interactive);
        self.writer.write_all(buf.as_bytes())
    }

    /// [`print`](Self::print) followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn print_line(&mut self, text: &StyledText) -> io::Result<()> {
        self.print(text)?;
        self.writer.write_all(b"\n")
    }
}

impl Write for OutputStream {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputStream")
            .field("interactive", &self.interactive)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::color::Color;

    /// An in-memory writer whose contents stay observable after the stream
    /// takes ownership of it.
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuf(pub Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample() -> StyledText {
        StyledText::new().bold().fg(Color::RED).text("hi").reset()
    }

    #[test]
    fn interactive_stream_gets_escapes() {
        let buf = SharedBuf::default();
        let mut out = OutputStream::new(buf.clone(), true);
        out.print(&sample()).unwrap();
        assert_eq!(buf.contents(), "\x1b[1;31mhi\x1b[0m");
    }

    #[test]
    fn piped_stream_gets_plain_text() {
        let buf = SharedBuf::default();
        let mut out = OutputStream::new(buf.clone(), false);
        out.print(&sample()).unwrap();
        assert_eq!(buf.contents(), "hi");
    }

    #[test]
    fn print_line_appends_newline() {
        let buf = SharedBuf::default();
        let mut out = OutputStream::new(buf.clone(), false);
        out.print_line(&sample()).unwrap();
        out.print_line(&StyledText::new().text("x")).unwrap();
        assert_eq!(buf.contents(), "hi\nx\n");
    }

    #[test]
    fn raw_write_passes_through() {
        let buf = SharedBuf::default();
        let mut out = OutputStream::new(buf.clone(), true);
        write!(out, "n={}", 3).unwrap();
        out.flush().unwrap();
        assert_eq!(buf.contents(), "n=3");
    }

    #[test]
    fn interactivity_is_fixed_at_construction() {
        let out = OutputStream::new(SharedBuf::default(), true);
        assert!(out.is_interactive());
        assert!(format!("{out:?}").contains("interactive: true"));
    }
}
