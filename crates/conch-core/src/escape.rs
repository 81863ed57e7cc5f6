// SPDX-License-Identifier: MIT
//
// Escape sequence decoder — a three-state machine for arrow keys.
//
// The interpreter only understands two incoming sequences:
//
//   ESC [ D   cursor left
//   ESC [ C   cursor right
//
// Everything else that starts with ESC is consumed and dropped. The
// decoder is fed one byte at a time by the dispatcher and reports,
// per byte, whether that byte was ordinary input, part of a pending
// sequence, a completed cursor move, or a discarded sequence byte.
//
// Known limitation, kept on purpose: a byte that breaks a pending
// sequence (e.g. a printable typed right after a lone ESC) is consumed
// along with the sequence rather than reprocessed as ordinary input.

/// A decoded cursor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    /// `ESC [ D` — move left one column.
    Left,
    /// `ESC [ C` — move right one column.
    Right,
}

/// What the decoder made of one input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Not part of any escape sequence — process as ordinary input.
    Literal(u8),
    /// Consumed into a pending sequence; feed the next byte.
    Incomplete,
    /// A complete cursor-motion sequence.
    Move(CursorMove),
    /// Consumed and dropped: an unknown final byte, or a byte that
    /// broke a pending sequence.
    Discarded,
}

/// Decoder state between bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    /// No sequence in progress.
    #[default]
    Idle,
    /// Got `ESC`, waiting for `[`.
    SawEscape,
    /// Got `ESC [`, waiting for the final byte.
    SawBracket,
}

/// Incremental decoder for the cursor-motion escape sequences.
///
/// Feed every incoming byte through [`feed`](Self::feed); bytes that
/// are not sequence bytes come straight back as [`Decoded::Literal`].
#[derive(Debug, Default)]
pub struct EscapeDecoder {
    state: State,
}

impl EscapeDecoder {
    /// Create a decoder in the idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no sequence is currently in progress.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// Consume one byte and report what it was.
    pub fn feed(&mut self, byte: u8) -> Decoded {
        match self.state {
            State::Idle => {
                if byte == 0x1B {
                    self.state = State::SawEscape;
                    Decoded::Incomplete
                } else {
                    Decoded::Literal(byte)
                }
            }
            State::SawEscape => {
                if byte == b'[' {
                    self.state = State::SawBracket;
                    Decoded::Incomplete
                } else {
                    // Broken sequence: the byte is swallowed with it.
                    self.state = State::Idle;
                    Decoded::Discarded
                }
            }
            State::SawBracket => {
                self.state = State::Idle;
                match byte {
                    b'D' => Decoded::Move(CursorMove::Left),
                    b'C' => Decoded::Move(CursorMove::Right),
                    _ => Decoded::Discarded,
                }
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
