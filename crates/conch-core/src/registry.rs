// SPDX-License-Identifier: MIT
//
// Command registry — a fixed-capacity, append-only dispatch table.
//
// Each entry pairs an immutable name with a boxed callable. Lookup is
// a case-insensitive exact match, first registration wins. There is no
// removal and no mutation after setup: the dispatcher holds a shared
// reference and the table is effectively immutable for the life of the
// program, which is why no locking is ever needed around it.
//
// A miss is reported to the caller rather than swallowed — the caller
// invokes the registry's fallback handler, so "unrecognized command"
// stays a non-fatal, user-visible condition.

use std::fmt;
use std::io;

use crate::dispatch::Context;

/// The callable invoked when a command's name matches the first token.
///
/// Arguments: the dispatch context (pull further tokens, write output),
/// the matched token as typed, and whether this is a help request
/// (`?` pressed mid-line) rather than an execution. Handlers do their
/// own argument parsing and range validation.
pub type Handler = Box<dyn Fn(&mut Context<'_>, &str, bool) -> io::Result<()>>;

/// Error returned when registering into a full table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded;

impl fmt::Display for CapacityExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("command table is full")
    }
}

impl std::error::Error for CapacityExceeded {}

/// A registered command: name plus handler.
///
/// Created once at setup, never mutated or removed. Identity is the
/// registration order.
pub struct Command {
    name: String,
    handler: Handler,
}

impl Command {
    /// The registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The handler callable.
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered table of commands with a capacity cap and a fallback.
pub struct CommandRegistry {
    commands: Vec<Command>,
    capacity: usize,
    fallback: Handler,
}

impl CommandRegistry {
    /// Create a registry that can hold up to `capacity` commands.
    ///
    /// `fallback` runs whenever lookup finds no match — including for
    /// an empty line, where the matched token is the empty string.
    #[must_use]
    pub fn new(capacity: usize, fallback: Handler) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
            capacity,
            fallback,
        }
    }

    /// Append a command.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityExceeded`] when the table is full; the caller
    /// decides whether that is fatal.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Handler,
    ) -> Result<(), CapacityExceeded> {
        if self.commands.len() >= self.capacity {
            return Err(CapacityExceeded);
        }
        self.commands.push(Command {
            name: name.into(),
            handler,
        });
        Ok(())
    }

    /// Find the handler for a token: case-insensitive exact match,
    /// first registration wins. `None` means the caller should invoke
    /// [`fallback`](Self::fallback).
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<&Handler> {
        self.commands
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(token))
            .map(|c| &c.handler)
    }

    /// The handler for unmatched tokens.
    #[must_use]
    pub fn fallback(&self) -> &Handler {
        &self.fallback
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.name.as_str())
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Maximum number of commands.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn noop() -> Handler {
        Box::new(|_, _, _| Ok(()))
    }

    #[test]
    fn register_within_capacity() {
        let mut reg = CommandRegistry::new(2, noop());
        assert!(reg.register("help", noop()).is_ok());
        assert!(reg.register("run", noop()).is_ok());
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn register_past_capacity_fails() {
        let mut reg = CommandRegistry::new(1, noop());
        reg.register("help", noop()).unwrap();
        assert_eq!(reg.register("run", noop()), Err(CapacityExceeded));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut reg = CommandRegistry::new(4, noop());
        reg.register("help", noop()).unwrap();
        assert!(reg.lookup("HELP").is_some());
        assert!(reg.lookup("Help").is_some());
        assert!(reg.lookup("help").is_some());
    }

    #[test]
    fn lookup_is_exact_not_prefix() {
        let mut reg = CommandRegistry::new(4, noop());
        reg.register("help", noop()).unwrap();
        assert!(reg.lookup("hel").is_none());
        assert!(reg.lookup("helpme").is_none());
    }

    #[test]
    fn lookup_miss_returns_none() {
        let reg = CommandRegistry::new(4, noop());
        assert!(reg.lookup("anything").is_none());
    }

    #[test]
    fn names_preserve_registration_order() {
        let mut reg = CommandRegistry::new(4, noop());
        reg.register("help", noop()).unwrap();
        reg.register("echo", noop()).unwrap();
        reg.register("countdown", noop()).unwrap();
        let names: Vec<&str> = reg.names().collect();
        assert_eq!(names, vec!["help", "echo", "countdown"]);
    }

    #[test]
    fn first_registration_wins_on_duplicate_names() {
        // Append-only table: a duplicate later entry is unreachable.
        let mut reg = CommandRegistry::new(4, noop());
        reg.register("run", noop()).unwrap();
        reg.register("RUN", noop()).unwrap();
        let found = reg.lookup("run").unwrap();
        assert!(std::ptr::eq(
            std::ptr::from_ref(found),
            std::ptr::from_ref(reg.commands[0].handler())
        ));
    }

    #[test]
    fn capacity_exceeded_displays() {
        assert_eq!(CapacityExceeded.to_string(), "command table is full");
    }
}
