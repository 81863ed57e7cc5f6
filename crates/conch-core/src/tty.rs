// SPDX-License-Identifier: MIT
//
// Local-terminal transport — raw mode and RAII cleanup.
//
// Safety: this module necessarily uses `unsafe` for termios
// (tcgetattr, tcsetattr), ioctl (FIONREAD), and isatty. These are the
// standard POSIX interfaces for terminal control — there is no safe
// alternative. Each unsafe block is minimal and documented.
#![allow(unsafe_code)]
//
// `StdioTransport` turns the process's own terminal into a
// `Transport`: raw mode via termios so bytes arrive unbuffered and
// unechoed (the dispatcher does its own echo), availability counts via
// `ioctl(FIONREAD)` so `poll_available` never blocks, and a Drop impl
// that restores the original termios even when the caller forgets.
//
// On non-unix targets the type still compiles: raw mode is a no-op and
// `poll_available` reports zero, so the dispatcher simply idles.

use std::io::{self, Read, Write};

use crate::transport::Transport;

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

/// The process's own terminal as a duplex byte channel.
///
/// Call [`enter`](Self::enter) to switch stdin into raw mode before
/// polling; the original settings are restored by
/// [`leave`](Self::leave) or automatically on drop.
#[derive(Debug)]
pub struct StdioTransport {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Whether raw mode is currently enabled.
    active: bool,
}

impl StdioTransport {
    /// Create a transport over stdin/stdout.
    ///
    /// Does **not** enter raw mode — call [`enter`](Self::enter).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            active: false,
        }
    }

    /// Whether raw mode is currently enabled.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode: no line buffering, no kernel echo, no signal
    /// generation. Idempotent; a no-op when stdin is not a TTY.
    ///
    /// # Errors
    ///
    /// Returns an error if the termios calls fail.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        self.enable_raw_mode()?;
        self.active = true;
        Ok(())
    }

    /// Restore the original terminal settings. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the termios restore fails.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.disable_raw_mode()?;
        self.active = false;
        Ok(())
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if !is_tty() {
            return Ok(());
        }

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            // Save original for restore.
            self.original_termios = Some(termios);

            // cfmakeraw equivalent: disable all line processing.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // VMIN=1, VTIME=0: read() blocks until at least 1 byte.
            // poll_available gates every read, so it never blocks us.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
            self.original_termios = None;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

impl Transport for StdioTransport {
    /// Bytes waiting on stdin, via `ioctl(FIONREAD)`.
    ///
    /// Zero on query failure (closed stdin, non-TTY redirections that
    /// reject the ioctl) — the dispatcher simply idles.
    #[cfg(unix)]
    fn poll_available(&mut self) -> usize {
        use std::os::unix::io::AsRawFd;

        let fd = io::stdin().as_raw_fd();
        let mut pending: libc::c_int = 0;
        let result = unsafe { libc::ioctl(fd, libc::FIONREAD, &raw mut pending) };

        if result == 0 && pending > 0 {
            usize::try_from(pending).unwrap_or(0)
        } else {
            0
        }
    }

    #[cfg(not(unix))]
    fn poll_available(&mut self) -> usize {
        0
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        io::stdin().lock().read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&[byte])?;
        stdout.flush()
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_inactive() {
        let t = StdioTransport::new();
        assert!(!t.is_active());
    }

    #[test]
    fn is_tty_does_not_panic() {
        let _ = is_tty();
    }

    #[test]
    fn enter_leave_cycle() {
        // In the test harness stdin is not a TTY, so raw mode is a
        // no-op — but the active flag must still track the calls.
        let mut t = StdioTransport::new();
        t.enter().unwrap();
        assert!(t.is_active());
        t.leave().unwrap();
        assert!(!t.is_active());
    }

    #[test]
    fn enter_is_idempotent() {
        let mut t = StdioTransport::new();
        t.enter().unwrap();
        t.enter().unwrap();
        assert!(t.is_active());
        t.leave().unwrap();
    }

    #[test]
    fn leave_without_enter_is_a_noop() {
        let mut t = StdioTransport::new();
        t.leave().unwrap();
        assert!(!t.is_active());
    }

    #[test]
    fn drop_after_enter_does_not_panic() {
        let mut t = StdioTransport::new();
        t.enter().unwrap();
        drop(t);
    }

    #[test]
    fn poll_available_does_not_panic() {
        let mut t = StdioTransport::new();
        let _ = t.poll_available();
    }
}
