//! # LC-3 Emulator
//!
//! An emulator for the LC-3, the 16-bit word-addressed teaching
//! architecture: 8 general-purpose registers, a program counter,
//! condition flags, and memory-mapped keyboard I/O.
//!
//! The core is the fetch-decode-execute engine in [`cpu`]; terminal
//! handling lives behind the [`io::Keyboard`] trait so programs run
//! against a real terminal or against scripted input in tests.

pub mod bits;
pub mod cpu;
pub mod io;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, CpuState, Flag, Instruction, Memory, Registers, TrapVector};
pub use io::{Keyboard, QueuedKeyboard, RawModeGuard, TerminalKeyboard};
