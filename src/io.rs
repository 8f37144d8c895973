//! Keyboard input backends and terminal state management.
//!
//! The CPU core never talks to the terminal directly; it consumes the
//! [`Keyboard`] trait. Two backends are provided:
//! - [`TerminalKeyboard`]: real keystrokes via crossterm events (the
//!   terminal must be in raw mode for single-key visibility)
//! - [`QueuedKeyboard`]: scripted bytes, for tests and embedding

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

/// Source of keyboard bytes for the memory-mapped status register and
/// the GETC/IN traps.
pub trait Keyboard {
    /// Non-blocking check: if a key is pending, consume and return it.
    fn poll(&mut self) -> io::Result<Option<u8>>;

    /// Block until one key is available and return it.
    fn read_byte(&mut self) -> io::Result<u8>;
}

/// Keyboard backend reading crossterm key events from the terminal.
///
/// Ctrl-C never reaches the process as a signal while the terminal is
/// raw; it shows up here as a key event instead and is surfaced as an
/// [`io::ErrorKind::Interrupted`] error for the caller to turn into a
/// clean shutdown.
#[derive(Debug, Default)]
pub struct TerminalKeyboard;

impl TerminalKeyboard {
    pub fn new() -> Self {
        Self
    }

    /// Map an event to the byte an LC-3 program expects, if any.
    /// Releases, resizes, and non-ASCII keys are swallowed.
    fn key_byte(ev: &Event) -> io::Result<Option<u8>> {
        let Event::Key(key) = ev else {
            return Ok(None);
        };
        if key.kind == KeyEventKind::Release {
            return Ok(None);
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
        }
        let byte = match key.code {
            KeyCode::Char(c) if c.is_ascii() => Some(c as u8),
            KeyCode::Enter => Some(b'\n'),
            KeyCode::Tab => Some(b'\t'),
            KeyCode::Backspace => Some(0x08),
            KeyCode::Esc => Some(0x1B),
            _ => None,
        };
        Ok(byte)
    }
}

impl Keyboard for TerminalKeyboard {
    fn poll(&mut self) -> io::Result<Option<u8>> {
        while event::poll(Duration::ZERO)? {
            if let Some(byte) = Self::key_byte(&event::read()?)? {
                return Ok(Some(byte));
            }
        }
        Ok(None)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        loop {
            if let Some(byte) = Self::key_byte(&event::read()?)? {
                return Ok(byte);
            }
        }
    }
}

/// In-memory keyboard fed from a fixed byte queue.
///
/// `poll` and `read_byte` both consume from the front; a blocking read
/// on an empty queue fails rather than hanging.
#[derive(Debug, Default)]
pub struct QueuedKeyboard {
    queue: VecDeque<u8>,
}

impl QueuedKeyboard {
    pub fn new(input: impl IntoIterator<Item = u8>) -> Self {
        Self {
            queue: input.into_iter().collect(),
        }
    }

    /// Append more input bytes.
    pub fn push(&mut self, byte: u8) {
        self.queue.push_back(byte);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Keyboard for QueuedKeyboard {
    fn poll(&mut self) -> io::Result<Option<u8>> {
        Ok(self.queue.pop_front())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        self.queue
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "keyboard queue empty"))
    }
}

/// RAII guard that puts the terminal into raw mode and restores it on
/// drop, so every exit path (halt, error, interrupt, panic unwind)
/// leaves the terminal usable.
#[derive(Debug)]
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
