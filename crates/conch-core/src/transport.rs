// SPDX-License-Identifier: MIT
//
// Transport abstraction — the duplex byte channel the interpreter
// lives on.
//
// The interpreter never touches stdin/stdout directly. Everything goes
// through the `Transport` trait: a bounded availability poll, single-
// byte reads, and byte/string writes. Any serial-style channel
// satisfies it — a UART, a TCP socket, a pseudo-terminal, or the
// in-memory `MemTransport` used for loopback testing.
//
// `poll_available` must never block: it reports how many bytes can be
// read *right now*, and the dispatcher consumes at most that many per
// poll pass. This is what keeps the core cooperative.

use std::collections::VecDeque;
use std::io;

/// A duplex byte channel between the interpreter and the operator.
///
/// `read_byte` may only be called when [`poll_available`](Self::poll_available)
/// has reported at least one pending byte; calling it on an empty
/// channel is an error (`UnexpectedEof` for [`MemTransport`]).
pub trait Transport {
    /// Number of bytes that can be read without blocking.
    fn poll_available(&mut self) -> usize;

    /// Read the next pending byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed or empty.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Write a single byte to the operator's side.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying channel write fails.
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    /// Write a string, byte by byte.
    ///
    /// Implementations with a cheaper bulk path should override this.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying channel write fails.
    fn write_str(&mut self, text: &str) -> io::Result<()> {
        for byte in text.bytes() {
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

// ─── MemTransport ───────────────────────────────────────────────────────────

/// In-memory duplex channel: scripted input, captured output.
///
/// Push bytes into the input queue with [`push_input`](Self::push_input),
/// run the dispatcher, then inspect everything the interpreter wrote
/// via [`output`](Self::output). Useful both for tests and for driving
/// the interpreter from a non-terminal source.
#[derive(Debug, Default)]
pub struct MemTransport {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl MemTransport {
    /// Create an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the interpreter to read.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    /// Everything the interpreter has written so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Everything written so far, as text (escape bytes included).
    #[must_use]
    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Take the captured output, leaving the buffer empty.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Number of unread input bytes still queued.
    #[must_use]
    pub fn input_remaining(&self) -> usize {
        self.input.len()
    }
}

impl Transport for MemTransport {
    fn poll_available(&mut self) -> usize {
        self.input.len()
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "input queue empty"))
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte);
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.output.extend_from_slice(text.as_bytes());
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
