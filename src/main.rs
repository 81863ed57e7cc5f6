// SPDX-License-Identifier: MIT
//
// conch — an interactive command shell over the local terminal.
//
// This binary is the setup glue around conch-core: it puts the TTY
// into raw mode, builds the command registry, and drives the
// dispatcher's poll loop. Each keypress flows through:
//
//   stdin → escape decoder → line buffer edit → terminal redraw
//   Enter → tokenize → registry lookup → handler
//
// The registered commands double as a demonstration of the handler
// contract: pull-based argument parsing with range validation
// (`countdown`), token streaming (`echo`), a help table, and a
// fallback for unrecognized input. Handlers run to completion on this
// thread — while `countdown` sleeps, no input is read. That is the
// documented contract of the core, on display.

use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use conch_core::dispatch::{Context, Dispatcher};
use conch_core::registry::CommandRegistry;
use conch_core::tty::StdioTransport;

/// Pause between poll passes when the transport is quiet.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Maximum number of registered commands.
const COMMAND_CAPACITY: usize = 8;

// ─── Handlers ───────────────────────────────────────────────────────────────

/// `help` — print the command table.
fn help(ctx: &mut Context<'_>, _token: &str, _help: bool) -> io::Result<()> {
    ctx.write_line("Available commands:")?;
    ctx.write_line("")?;
    ctx.write_line("  help                          show this table")?;
    ctx.write_line("  echo <words...>               write the arguments back")?;
    ctx.write_line("  countdown <seconds> <delay>   count down; delay in ms")?;
    ctx.write_line("  quit                          leave the shell")?;
    ctx.write_line("")?;
    ctx.write_line("append ? to a command name for its usage")
}

/// `echo` — stream the remaining tokens back, space-separated.
fn echo(ctx: &mut Context<'_>, _token: &str, help: bool) -> io::Result<()> {
    if help {
        return ctx.write_line("usage: echo <words...>");
    }
    let mut first = true;
    while let Some(word) = ctx.next_token() {
        if !first {
            ctx.write_str(" ")?;
        }
        ctx.write_str(word)?;
        first = false;
    }
    ctx.write_str("\r\n")
}

/// `countdown <seconds> <delay_ms>` — blocking countdown.
///
/// Argument validation mirrors the handler contract: the dispatcher
/// hands over raw tokens, the handler enforces presence and range.
fn countdown(ctx: &mut Context<'_>, _token: &str, help: bool) -> io::Result<()> {
    if help {
        ctx.write_line("usage: countdown <seconds> <delay_ms>")?;
        ctx.write_line("  seconds   1..=999")?;
        ctx.write_line("  delay_ms  100..=10000")?;
        return Ok(());
    }

    let Some(seconds) = ctx.next_token().and_then(|t| t.parse::<u32>().ok()) else {
        return ctx.write_line("countdown: missing or invalid <seconds>");
    };
    if !(1..=999).contains(&seconds) {
        return ctx.write_line("countdown: seconds must be between 1 and 999");
    }

    let Some(delay_ms) = ctx.next_token().and_then(|t| t.parse::<u64>().ok()) else {
        return ctx.write_line("countdown: missing or invalid <delay_ms>");
    };
    if !(100..=10_000).contains(&delay_ms) {
        return ctx.write_line("countdown: delay_ms must be between 100 and 10000");
    }

    for i in (0..=seconds).rev() {
        ctx.write_line(&format!("{i:3}"))?;
        if i > 0 {
            thread::sleep(Duration::from_millis(delay_ms));
        }
    }
    ctx.write_line("done")
}

/// Fallback for tokens that match nothing.
fn unrecognized(ctx: &mut Context<'_>, token: &str, _help: bool) -> io::Result<()> {
    // An empty line lands here too; just show a fresh prompt.
    if token.is_empty() {
        return Ok(());
    }
    let message = format!("Unrecognized command: {token}");
    ctx.write_line(&message)?;
    ctx.write_line("Type 'help' to see available commands.")
}

// ─── Setup ──────────────────────────────────────────────────────────────────

/// Build the registry. `quit_flag` is shared with the main loop.
fn build_registry(quit_flag: &Rc<Cell<bool>>) -> io::Result<CommandRegistry> {
    let mut registry = CommandRegistry::new(COMMAND_CAPACITY, Box::new(unrecognized));

    registry
        .register("help", Box::new(help))
        .map_err(io::Error::other)?;
    registry
        .register("echo", Box::new(echo))
        .map_err(io::Error::other)?;
    registry
        .register("countdown", Box::new(countdown))
        .map_err(io::Error::other)?;

    let quit = Rc::clone(quit_flag);
    registry
        .register(
            "quit",
            Box::new(move |ctx, _token, help| {
                if help {
                    return ctx.write_line("usage: quit");
                }
                quit.set(true);
                ctx.write_line("bye")
            }),
        )
        .map_err(io::Error::other)?;

    Ok(registry)
}

fn main() -> io::Result<()> {
    let quit = Rc::new(Cell::new(false));
    let registry = build_registry(&quit)?;

    let mut transport = StdioTransport::new();
    transport.enter()?;

    let mut shell = Dispatcher::new(transport, &registry);
    shell.set_line_indicator("> ");
    shell.start()?;

    while !quit.get() {
        shell.poll()?;
        thread::sleep(POLL_INTERVAL);
    }

    // Dropping the dispatcher drops the transport, which restores the
    // original terminal settings.
    Ok(())
}
