//! CPU emulation for the LC-3.
//!
//! This module implements the complete LC-3 architecture:
//! - 65536 sixteen-bit memory words with memory-mapped keyboard I/O
//! - 10 registers: R0..R7, PC, COND
//! - 16-opcode instruction set with six trap service routines

pub mod decode;
pub mod execute;
pub mod memory;
pub mod registers;

pub use decode::{Instruction, JsrTarget, Operand, TrapVector};
pub use execute::{Cpu, CpuError, CpuState};
pub use memory::{ImageError, LoadedImage, Memory, KBDR, KBSR, KEY_READY};
pub use registers::{Flag, Registers};
