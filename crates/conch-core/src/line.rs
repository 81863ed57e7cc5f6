// SPDX-License-Identifier: MIT
//
// Line buffer — the editable line and its visible mirror.
//
// Owns the bytes of the line being typed and the cursor position
// within it, and keeps the operator's terminal in sync after every
// edit. The sync protocol is narrow and deliberate:
//
//   interior insert   rewrite the shifted tail, backspace home
//   interior delete   0x08 + ESC[1P, rewrite the moved tail, backspace home
//   trailing delete   0x08 + ESC[K
//   cursor motion     ESC[D / ESC[C, only when the position changed
//
// The echo of a newly typed byte itself is the dispatcher's job — by
// the time `insert` runs, the byte is already on screen at the old
// cursor column. After every mutating call the visible line is a pure
// function of `(content, cursor)`.
//
// Content is printable ASCII only (32..=126), so the byte buffer is
// always valid UTF-8. One capacity slot is reserved: a line whose
// length reaches `capacity - 1` is aborted with a diagnostic rather
// than silently truncated.

use std::io;

use crate::escape::CursorMove;
use crate::transport::Transport;

/// Default line capacity in bytes (one slot reserved).
pub const DEFAULT_CAPACITY: usize = 50;

/// Default prompt written at the start of every new line.
pub const DEFAULT_PROMPT: &str = "$ ";

/// Diagnostic written when a line outgrows its buffer.
const OVERFLOW_DIAGNOSTIC: &str = "\r\nline too long, input discarded\r\n";

/// Outcome of an [`insert`](LineBuffer::insert) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum InsertOutcome {
    /// Byte stored; the line continues.
    Accepted,
    /// The line hit capacity and was discarded (diagnostic written,
    /// buffer reset). The caller must drain any remaining input so a
    /// truncated command is never dispatched.
    Aborted,
}

/// The current line's content, cursor, and prompt.
///
/// Invariant: `cursor <= len <= capacity - 1`.
#[derive(Debug)]
pub struct LineBuffer {
    /// Printable-ASCII bytes of the line (always valid UTF-8).
    content: Vec<u8>,
    /// Edit position, `0..=len`.
    cursor: usize,
    /// Total capacity; one slot is reserved, so usable length is
    /// `capacity - 2` before the overflow abort triggers.
    capacity: usize,
    /// Written to the transport on every [`reset`](Self::reset).
    prompt: String,
}

impl LineBuffer {
    /// Create an empty buffer. Capacities below 2 are raised to 2.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            content: Vec::with_capacity(capacity),
            cursor: 0,
            capacity: capacity.max(2),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }

    /// Current line length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the line is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Current cursor position, `0..=len`.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The prompt string.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Replace the prompt written on reset.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// The line content as text.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }

    /// Discard the line, home the cursor, and write the prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport write fails.
    pub fn reset(&mut self, t: &mut dyn Transport) -> io::Result<()> {
        self.content.clear();
        self.cursor = 0;
        t.write_str(&self.prompt)
    }

    /// Insert a printable byte at the cursor.
    ///
    /// Appends when the cursor is at the end; otherwise shifts the
    /// tail right, rewrites it on screen, and backspaces the visible
    /// cursor home. The byte's own echo must already have happened.
    ///
    /// When the insertion makes the length reach `capacity - 1`, the
    /// whole line is aborted: diagnostic, reset, [`InsertOutcome::Aborted`].
    ///
    /// # Errors
    ///
    /// Returns an error if a transport write fails.
    pub fn insert(&mut self, t: &mut dyn Transport, byte: u8) -> io::Result<InsertOutcome> {
        debug_assert!((32..=126).contains(&byte), "only printable ASCII is editable");

        if self.cursor == self.content.len() {
            self.content.push(byte);
        } else {
            self.content.insert(self.cursor, byte);
            // The echoed byte overwrote the old tail's first column;
            // rewrite the shifted tail and walk the cursor back.
            let tail = self.content[self.cursor + 1..].to_vec();
            for &b in &tail {
                t.write_byte(b)?;
            }
            for _ in 0..tail.len() {
                t.write_byte(0x08)?;
            }
        }
        self.cursor += 1;

        if self.content.len() >= self.capacity - 1 {
            t.write_str(OVERFLOW_DIAGNOSTIC)?;
            self.reset(t)?;
            return Ok(InsertOutcome::Aborted);
        }
        Ok(InsertOutcome::Accepted)
    }

    /// Delete the byte before the cursor.
    ///
    /// No-op when the line is empty or the cursor is at column 0.
    ///
    /// # Errors
    ///
    /// Returns an error if a transport write fails.
    pub fn delete(&mut self, t: &mut dyn Transport) -> io::Result<()> {
        if self.content.is_empty() || self.cursor == 0 {
            return Ok(());
        }

        if self.cursor == self.content.len() {
            // Trailing delete: back up and erase to end of line.
            self.content.pop();
            t.write_str("\x08\x1b[K")?;
        } else {
            // Interior delete: shift left, let the terminal shift too,
            // rewrite the moved tail, then re-home the cursor.
            self.content.remove(self.cursor - 1);
            t.write_str("\x08\x1b[1P")?;
            let tail = self.content[self.cursor - 1..].to_vec();
            for &b in &tail {
                t.write_byte(b)?;
            }
            for _ in 0..tail.len() {
                t.write_byte(0x08)?;
            }
        }
        self.cursor -= 1;
        Ok(())
    }

    /// Move the cursor one column, clamped to `[0, len]`.
    ///
    /// The mirroring escape is emitted only when the position actually
    /// changed; boundary moves are silent no-ops.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport write fails.
    pub fn move_cursor(&mut self, t: &mut dyn Transport, mv: CursorMove) -> io::Result<()> {
        match mv {
            CursorMove::Left => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    t.write_str("\x1b[D")?;
                }
            }
            CursorMove::Right => {
                if self.cursor < self.content.len() {
                    self.cursor += 1;
                    t.write_str("\x1b[C")?;
                }
            }
        }
        Ok(())
    }

    /// Walk the cursor to column 0, one mirrored escape per step.
    ///
    /// # Errors
    ///
    /// Returns an error if a transport write fails.
    pub fn move_to_start(&mut self, t: &mut dyn Transport) -> io::Result<()> {
        while self.cursor > 0 {
            self.move_cursor(t, CursorMove::Left)?;
        }
        Ok(())
    }

    /// Walk the cursor to the end of the line.
    ///
    /// # Errors
    ///
    /// Returns an error if a transport write fails.
    pub fn move_to_end(&mut self, t: &mut dyn Transport) -> io::Result<()> {
        while self.cursor < self.content.len() {
            self.move_cursor(t, CursorMove::Right)?;
        }
        Ok(())
    }

    /// Repaint the whole line: prompt, content, cursor re-homed.
    ///
    /// Used after a screen clear and after a help dispatch, when the
    /// logical buffer is intact but the screen no longer shows it.
    ///
    /// # Errors
    ///
    /// Returns an error if a transport write fails.
    pub fn redraw(&self, t: &mut dyn Transport) -> io::Result<()> {
        t.write_str(&self.prompt)?;
        for &b in &self.content {
            t.write_byte(b)?;
        }
        for _ in self.cursor..self.content.len() {
            t.write_byte(0x08)?;
        }
        Ok(())
    }

    /// An owned copy of the line, leaving content and cursor untouched.
    ///
    /// The dispatcher tokenizes this copy so the live buffer can still
    /// be redrawn afterwards (help requests depend on that).
    #[must_use]
    pub fn finalize(&self) -> String {
        self.contents()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemTransport;
    use pretty_assertions::assert_eq;

    /// Insert a run of bytes with the cursor at the end.
    fn type_all(line: &mut LineBuffer, t: &mut MemTransport, bytes: &[u8]) {
        for &b in bytes {
            let outcome = line.insert(t, b).unwrap();
            assert_eq!(outcome, InsertOutcome::Accepted);
        }
    }

    // ── Append path ─────────────────────────────────────────────────

    #[test]
    fn appended_bytes_concatenate_in_order() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"hello world");
        assert_eq!(line.contents(), "hello world");
        assert_eq!(line.cursor(), 11);
    }

    #[test]
    fn append_emits_nothing_itself() {
        // The dispatcher echoes the byte; a pure append writes nothing.
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"abc");
        assert_eq!(t.output(), b"");
    }

    // ── Interior insert ─────────────────────────────────────────────

    #[test]
    fn interior_insert_is_a_pure_right_shift() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"acd");
        line.move_cursor(&mut t, CursorMove::Left).unwrap();
        line.move_cursor(&mut t, CursorMove::Left).unwrap();
        let _ = line.insert(&mut t, b'b').unwrap();
        assert_eq!(line.contents(), "abcd");
        assert_eq!(line.cursor(), 2);
    }

    #[test]
    fn interior_insert_rewrites_tail_and_rehomes() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"ad");
        line.move_cursor(&mut t, CursorMove::Left).unwrap();
        t.take_output();

        let _ = line.insert(&mut t, b'c').unwrap();
        // Tail "d" rewritten, one backspace home.
        assert_eq!(t.output(), b"d\x08");
    }

    // ── Delete ──────────────────────────────────────────────────────

    #[test]
    fn delete_on_empty_line_is_a_noop() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        line.delete(&mut t).unwrap();
        assert_eq!(line.len(), 0);
        assert_eq!(t.output(), b"");
    }

    #[test]
    fn delete_at_column_zero_is_a_noop() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"ab");
        line.move_to_start(&mut t).unwrap();
        t.take_output();

        line.delete(&mut t).unwrap();
        assert_eq!(line.contents(), "ab");
        assert_eq!(t.output(), b"");
    }

    #[test]
    fn trailing_delete_erases_last_visible_char() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"ab");
        t.take_output();

        line.delete(&mut t).unwrap();
        assert_eq!(line.contents(), "a");
        assert_eq!(line.cursor(), 1);
        assert_eq!(t.output(), b"\x08\x1b[K");
    }

    #[test]
    fn interior_delete_is_a_pure_left_shift() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"abcd");
        line.move_cursor(&mut t, CursorMove::Left).unwrap();
        t.take_output();

        // Cursor at 3; deletes 'c'.
        line.delete(&mut t).unwrap();
        assert_eq!(line.contents(), "abd");
        assert_eq!(line.cursor(), 2);
        // Shift-delete, tail "d" rewritten, one backspace.
        assert_eq!(t.output(), b"\x08\x1b[1Pd\x08");
    }

    // ── Cursor motion ───────────────────────────────────────────────

    #[test]
    fn move_left_emits_mirror_escape() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"ab");
        t.take_output();

        line.move_cursor(&mut t, CursorMove::Left).unwrap();
        assert_eq!(line.cursor(), 1);
        assert_eq!(t.output(), b"\x1b[D");
    }

    #[test]
    fn move_left_at_column_zero_is_silent() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        line.move_cursor(&mut t, CursorMove::Left).unwrap();
        assert_eq!(line.cursor(), 0);
        assert_eq!(t.output(), b"");
    }

    #[test]
    fn move_right_at_end_is_silent() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"a");
        t.take_output();

        line.move_cursor(&mut t, CursorMove::Right).unwrap();
        assert_eq!(line.cursor(), 1);
        assert_eq!(t.output(), b"");
    }

    #[test]
    fn move_to_start_walks_one_escape_per_column() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"abc");
        t.take_output();

        line.move_to_start(&mut t).unwrap();
        assert_eq!(line.cursor(), 0);
        assert_eq!(t.output(), b"\x1b[D\x1b[D\x1b[D");
    }

    #[test]
    fn move_to_end_walks_back() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"ab");
        line.move_to_start(&mut t).unwrap();
        t.take_output();

        line.move_to_end(&mut t).unwrap();
        assert_eq!(line.cursor(), 2);
        assert_eq!(t.output(), b"\x1b[C\x1b[C");
    }

    // ── Reset / redraw / finalize ───────────────────────────────────

    #[test]
    fn reset_clears_and_prompts() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"abc");
        t.take_output();

        line.reset(&mut t).unwrap();
        assert!(line.is_empty());
        assert_eq!(line.cursor(), 0);
        assert_eq!(t.output(), b"$ ");
    }

    #[test]
    fn redraw_repaints_prompt_content_and_cursor() {
        let mut line = LineBuffer::new(50);
        line.set_prompt("> ");
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"abc");
        line.move_cursor(&mut t, CursorMove::Left).unwrap();
        t.take_output();

        line.redraw(&mut t).unwrap();
        // Cursor one before the end: one backspace after the content.
        assert_eq!(t.output(), b"> abc\x08");
    }

    #[test]
    fn finalize_leaves_buffer_untouched() {
        let mut line = LineBuffer::new(50);
        let mut t = MemTransport::new();
        type_all(&mut line, &mut t, b"abc");
        line.move_cursor(&mut t, CursorMove::Left).unwrap();

        let copy = line.finalize();
        assert_eq!(copy, "abc");
        assert_eq!(line.len(), 3);
        assert_eq!(line.cursor(), 2);
    }

    // ── Overflow ────────────────────────────────────────────────────

    #[test]
    fn overflow_aborts_with_diagnostic_and_reset() {
        let mut line = LineBuffer::new(5);
        let mut t = MemTransport::new();
        // Usable length is capacity - 2 = 3; the 4th byte aborts.
        type_all(&mut line, &mut t, b"abc");
        t.take_output();

        let outcome = line.insert(&mut t, b'd').unwrap();
        assert_eq!(outcome, InsertOutcome::Aborted);
        assert!(line.is_empty());
        assert_eq!(line.cursor(), 0);
        let out = t.output_str();
        assert!(out.contains("line too long"));
        assert!(out.ends_with("$ "));
    }

    #[test]
    fn tiny_capacity_is_raised_to_minimum() {
        let line = LineBuffer::new(0);
        assert_eq!(line.capacity(), 2);
    }
}
