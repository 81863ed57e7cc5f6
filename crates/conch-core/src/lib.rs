// SPDX-License-Identifier: MIT
//
// conch-core — the interpreter behind the conch shell.
//
// A compact, single-threaded command-line interpreter that runs over
// any duplex byte channel: a UART, a socket, a pseudo-terminal, or the
// local TTY. Bytes go in one at a time; a line buffer with a movable
// cursor accumulates them, a tiny escape decoder turns arrow-key
// sequences into cursor motion, and on carriage return the line is
// tokenized and the first token dispatched to a registered handler.
//
// This crate intentionally avoids readline-style libraries in favor of
// direct byte-level terminal control. Every escape sequence the
// interpreter emits mirrors exactly one logical edit, so the visible
// line is always a pure function of the buffer contents and cursor.

pub mod dispatch;
pub mod escape;
pub mod line;
pub mod registry;
pub mod transport;
pub mod tty;
