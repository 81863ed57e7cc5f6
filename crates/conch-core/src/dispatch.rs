// SPDX-License-Identifier: MIT
//
// Dispatcher — the poll-driven REPL loop.
//
// Conceptually a three-state machine: Idle (no line in progress),
// Editing (bytes accumulating in the line buffer), Dispatching (line
// finalized, a handler running). One `poll()` call consumes exactly
// the bytes the transport reports available at entry — a bounded,
// non-blocking pass — and routes each byte through the escape decoder
// into line-buffer edits. A carriage return finalizes the line,
// tokenizes a private copy, and invokes the matching handler (or the
// registry's fallback) synchronously.
//
// Handlers run to completion on the caller's thread. A handler that
// blocks for seconds blocks input for seconds; that coupling is the
// documented contract, not a bug. No cancellation exists.
//
// Byte map (applied after escape decoding):
//
//   0x08 / 0x7F   delete before cursor
//   0x01 / 0x05   cursor to start / end of line
//   0x03 / 0x04   cancel the line
//   0x0C          clear screen and repaint the line
//   '?'           help dispatch on the unfinished line
//   '\r'          finalize and dispatch
//   32..=126      echo (if enabled) and insert
//   anything else dropped

use std::io;

use crate::escape::{Decoded, EscapeDecoder};
use crate::line::{InsertOutcome, LineBuffer};
use crate::registry::CommandRegistry;
use crate::transport::Transport;

/// Default token separator.
pub const DEFAULT_SEPARATOR: u8 = b' ';

// ─── Context ────────────────────────────────────────────────────────────────

/// Per-invocation view handed to a command handler.
///
/// Wraps a *copy* of the finalized line (the live buffer stays intact
/// so it can be redrawn after a help request) plus the transport, so
/// handlers can write their output without reaching for any global.
///
/// Tokens are pulled on demand: runs of the separator byte are
/// skipped, so empty tokens are never yielded, and exhaustion returns
/// `None` — the "no more tokens" signal.
pub struct Context<'a> {
    transport: &'a mut (dyn Transport + 'a),
    rest: &'a str,
    separator: u8,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        transport: &'a mut (dyn Transport + 'a),
        text: &'a str,
        separator: u8,
    ) -> Self {
        Self {
            transport,
            rest: text,
            separator,
        }
    }

    /// Pull the next token, or `None` when the line is exhausted.
    pub fn next_token(&mut self) -> Option<&'a str> {
        let sep = self.separator as char;
        let s = self.rest.trim_start_matches(sep);
        if s.is_empty() {
            self.rest = s;
            return None;
        }
        match s.find(sep) {
            Some(end) => {
                self.rest = &s[end + 1..];
                Some(&s[..end])
            }
            None => {
                self.rest = "";
                Some(s)
            }
        }
    }

    /// The transport, for handler output.
    pub fn transport(&mut self) -> &mut dyn Transport {
        &mut *self.transport
    }

    /// Write text to the operator.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport write fails.
    pub fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.transport.write_str(text)
    }

    /// Write text followed by `\r\n`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport write fails.
    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.transport.write_str(text)?;
        self.transport.write_str("\r\n")
    }
}

// ─── Dispatcher ─────────────────────────────────────────────────────────────

/// The REPL driver: transport in, line edits and dispatches out.
///
/// Owns the transport, one [`LineBuffer`], and one [`EscapeDecoder`];
/// holds a shared reference to the registry, which is populated once
/// at setup and never mutated afterwards. All configuration
/// (`set_echo`, `set_separator`, `set_line_indicator`,
/// `set_buffer_capacity`) should happen before the first
/// [`poll`](Self::poll).
pub struct Dispatcher<'r, T: Transport> {
    transport: T,
    registry: &'r CommandRegistry,
    line: LineBuffer,
    esc: EscapeDecoder,
    echo: bool,
    separator: u8,
}

impl<'r, T: Transport> Dispatcher<'r, T> {
    /// Create a dispatcher with default settings: echo on, single-space
    /// separator, `"$ "` prompt, 50-byte line capacity.
    #[must_use]
    pub fn new(transport: T, registry: &'r CommandRegistry) -> Self {
        Self {
            transport,
            registry,
            line: LineBuffer::default(),
            esc: EscapeDecoder::new(),
            echo: true,
            separator: DEFAULT_SEPARATOR,
        }
    }

    /// Whether received printable bytes are echoed back.
    #[must_use]
    pub const fn echo(&self) -> bool {
        self.echo
    }

    /// Enable or disable echo.
    pub const fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    /// The token separator byte.
    #[must_use]
    pub const fn separator(&self) -> u8 {
        self.separator
    }

    /// Replace the token separator.
    pub const fn set_separator(&mut self, separator: u8) {
        self.separator = separator;
    }

    /// The prompt written at the start of every line.
    #[must_use]
    pub fn line_indicator(&self) -> &str {
        self.line.prompt()
    }

    /// Replace the prompt.
    pub fn set_line_indicator(&mut self, prompt: impl Into<String>) {
        self.line.set_prompt(prompt);
    }

    /// Replace the line buffer with a fresh one of the given capacity.
    ///
    /// Any line in progress is discarded; call before the first poll.
    pub fn set_buffer_capacity(&mut self, capacity: usize) {
        let prompt = self.line.prompt().to_string();
        self.line = LineBuffer::new(capacity);
        self.line.set_prompt(prompt);
    }

    /// The line buffer (for inspection).
    #[must_use]
    pub const fn line(&self) -> &LineBuffer {
        &self.line
    }

    /// The transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably.
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Write the initial prompt.
    ///
    /// The poll loop never prompts unasked; call this once after setup
    /// so the operator knows the interpreter is ready.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport write fails.
    pub fn start(&mut self) -> io::Result<()> {
        self.line.reset(&mut self.transport)
    }

    /// Process the bytes currently available on the transport.
    ///
    /// Bounded and non-blocking: consumes at most the count reported
    /// by `poll_available` at entry, and stops early on a carriage
    /// return (remaining bytes wait for the next call) or on a line
    /// overflow (remaining bytes are drained and discarded).
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O or a handler fails.
    pub fn poll(&mut self) -> io::Result<()> {
        let available = self.transport.poll_available();
        let mut completed = false;

        for _ in 0..available {
            let byte = self.transport.read_byte()?;

            let byte = match self.esc.feed(byte) {
                Decoded::Incomplete | Decoded::Discarded => continue,
                Decoded::Move(mv) => {
                    self.line.move_cursor(&mut self.transport, mv)?;
                    continue;
                }
                Decoded::Literal(b) => b,
            };

            match byte {
                // Backspace / delete.
                0x08 | 0x7F => self.line.delete(&mut self.transport)?,
                // Ctrl-A: start of line.
                0x01 => self.line.move_to_start(&mut self.transport)?,
                // Ctrl-E: end of line.
                0x05 => self.line.move_to_end(&mut self.transport)?,
                // Ctrl-C / Ctrl-D: cancel the line.
                0x03 | 0x04 => {
                    self.transport.write_str("\r\n")?;
                    self.line.reset(&mut self.transport)?;
                }
                // Ctrl-L: clear screen, home, repaint.
                0x0C => {
                    self.transport.write_str("\x1b[H\x1b[J")?;
                    self.line.redraw(&mut self.transport)?;
                }
                // End of line: dispatch, leave later bytes for the
                // next poll.
                b'\r' => {
                    completed = true;
                    break;
                }
                // Help on the unfinished line.
                b'?' => self.dispatch_help()?,
                // Printable: echo then insert.
                b @ 32..=126 => {
                    if self.echo {
                        self.transport.write_byte(b)?;
                    }
                    if self.line.insert(&mut self.transport, b)? == InsertOutcome::Aborted {
                        // Drain everything still pending so a
                        // truncated command can't dispatch later.
                        while self.transport.poll_available() > 0 {
                            let _ = self.transport.read_byte()?;
                        }
                        return Ok(());
                    }
                }
                // Anything else is dropped.
                _ => {}
            }
        }

        if completed {
            self.dispatch_line()?;
        }
        Ok(())
    }

    /// Finalize the line, dispatch it, and start a new one.
    fn dispatch_line(&mut self) -> io::Result<()> {
        self.transport.write_str("\r\n")?;
        let text = self.line.finalize();
        self.invoke(&text, false)?;
        self.line.reset(&mut self.transport)
    }

    /// `?` pressed mid-line: dispatch with the help flag, then put the
    /// unfinished line back on screen exactly as it was.
    fn dispatch_help(&mut self) -> io::Result<()> {
        if self.echo {
            self.transport.write_byte(b'?')?;
        }
        self.transport.write_str("\r\n")?;
        let text = self.line.finalize();
        self.invoke(&text, true)?;
        self.transport.write_str("\r\n")?;
        self.line.redraw(&mut self.transport)
    }

    /// Tokenize a finalized copy and invoke the matching handler.
    ///
    /// An empty line (no first token) routes to the fallback with an
    /// empty token.
    fn invoke(&mut self, text: &str, help: bool) -> io::Result<()> {
        let registry = self.registry;
        let mut ctx = Context::new(&mut self.transport, text, self.separator);
        let token = ctx.next_token().unwrap_or("");
        let handler = registry
            .lookup(token)
            .unwrap_or_else(|| registry.fallback());
        handler(&mut ctx, token, help)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
