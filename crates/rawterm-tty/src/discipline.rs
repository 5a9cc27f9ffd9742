// SPDX-License-Identifier: MIT
//
// Line discipline access — reading, transforming, and writing the
// controlling terminal's termios attributes.
//
// Safety: the unix implementation necessarily uses `unsafe` for tcgetattr
// and tcsetattr. These are the standard POSIX interfaces for terminal
// control; there is no safe alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// The trait is the seam between the mode manager's reference counting and
// the actual syscalls. The manager only ever asks three things: snapshot the
// current attributes, derive the raw variant of a snapshot, and apply a
// snapshot. Tests substitute a recording implementation.

use std::io;

/// Access to a terminal's line-discipline configuration.
pub trait LineDiscipline {
    /// Opaque snapshot of the configuration (echo, canonical mode, signal
    /// generation, input/output processing, min-read/timeout).
    type Attributes: Clone;

    /// Read the current attributes. Fails when the descriptor is not a
    /// terminal.
    ///
    /// # Errors
    ///
    /// Returns the underlying OS error.
    fn get_attributes(&self) -> io::Result<Self::Attributes>;

    /// Apply `attrs` to the terminal.
    ///
    /// # Errors
    ///
    /// Returns the underlying OS error.
    fn set_attributes(&self, attrs: &Self::Attributes) -> io::Result<()>;

    /// Derive raw-mode attributes from a snapshot of normal ones.
    fn make_raw(attrs: &Self::Attributes) -> Self::Attributes;
}

// ─── termios ─────────────────────────────────────────────────────────────────

/// The termios line discipline of a file descriptor (stdin by default).
#[derive(Debug, Clone, Copy)]
pub struct Termios {
    #[cfg_attr(not(unix), allow(dead_code))]
    fd: i32,
}

impl Termios {
    /// The discipline of standard input.
    #[must_use]
    pub const fn stdin() -> Self {
        Self { fd: 0 }
    }

    /// The discipline of an arbitrary descriptor.
    #[must_use]
    pub const fn from_fd(fd: i32) -> Self {
        Self { fd }
    }
}

#[cfg(unix)]
impl LineDiscipline for Termios {
    type Attributes = libc::termios;

    fn get_attributes(&self) -> io::Result<libc::termios> {
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(self.fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(termios)
        }
    }

    fn set_attributes(&self, attrs: &libc::termios) -> io::Result<()> {
        unsafe {
            if libc::tcsetattr(self.fd, libc::TCSAFLUSH, attrs) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    fn make_raw(attrs: &libc::termios) -> libc::termios {
        let mut raw = *attrs;

        // No break-to-SIGINT, no CR→NL, no parity check, no stripping, no
        // output flow control.
        raw.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
        raw.c_oflag &= !libc::OPOST;
        raw.c_cflag &= !(libc::CSIZE | libc::PARENB);
        raw.c_cflag |= libc::CS8;
        raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN);

        // VMIN=1, VTIME=0: read() returns as soon as one byte is available.
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;

        raw
    }
}

/// Without termios there is never a terminal to put in raw mode.
#[cfg(not(unix))]
impl LineDiscipline for Termios {
    type Attributes = ();

    fn get_attributes(&self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "termios is unix-only"))
    }

    fn set_attributes(&self, (): &()) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "termios is unix-only"))
    }

    fn make_raw((): &()) {}
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn normal() -> libc::termios {
        let mut t: libc::termios = unsafe { std::mem::zeroed() };
        t.c_iflag = libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON | libc::IGNPAR;
        t.c_oflag = libc::OPOST | libc::ONLCR;
        t.c_cflag = libc::CS7 | libc::PARENB | libc::CREAD;
        t.c_lflag = libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN | libc::ECHOE;
        t.c_cc[libc::VMIN] = 0;
        t.c_cc[libc::VTIME] = 5;
        t
    }

    #[test]
    fn make_raw_clears_input_processing() {
        let raw = Termios::make_raw(&normal());
        for flag in [libc::BRKINT, libc::ICRNL, libc::INPCK, libc::ISTRIP, libc::IXON] {
            assert_eq!(raw.c_iflag & flag, 0);
        }
        // Flags outside the transform survive.
        assert_ne!(raw.c_iflag & libc::IGNPAR, 0);
    }

    #[test]
    fn make_raw_clears_output_processing() {
        let raw = Termios::make_raw(&normal());
        assert_eq!(raw.c_oflag & libc::OPOST, 0);
    }

    #[test]
    fn make_raw_sets_eight_bit_no_parity() {
        let raw = Termios::make_raw(&normal());
        assert_eq!(raw.c_cflag & libc::CSIZE, libc::CS8);
        assert_eq!(raw.c_cflag & libc::PARENB, 0);
        assert_ne!(raw.c_cflag & libc::CREAD, 0);
    }

    #[test]
    fn make_raw_disables_echo_canonical_signals() {
        let raw = Termios::make_raw(&normal());
        for flag in [libc::ECHO, libc::ICANON, libc::ISIG, libc::IEXTEN] {
            assert_eq!(raw.c_lflag & flag, 0);
        }
    }

    #[test]
    fn make_raw_reads_one_byte_without_timeout() {
        let raw = Termios::make_raw(&normal());
        assert_eq!(raw.c_cc[libc::VMIN], 1);
        assert_eq!(raw.c_cc[libc::VTIME], 0);
    }

    #[test]
    fn make_raw_leaves_snapshot_untouched() {
        let before = normal();
        let _ = Termios::make_raw(&before);
        assert_ne!(before.c_lflag & libc::ECHO, 0);
    }

    #[test]
    fn get_attributes_on_non_tty_fails() {
        // A pipe is never a terminal.
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let result = Termios::from_fd(fds[0]).get_attributes();
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
        assert!(result.is_err());
    }
}
