//! CPU execution engine for the LC-3.
//!
//! Implements the fetch-decode-execute cycle, all sixteen opcode
//! behaviors, and the trap service routines.

use std::io::{self, Write};

use thiserror::Error;

use crate::cpu::decode::{self, Instruction, JsrTarget, Operand, TrapVector};
use crate::cpu::memory::{ImageError, LoadedImage, Memory};
use crate::cpu::registers::Registers;
use crate::io::Keyboard;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has stopped (TRAP HALT).
    Halted,
}

/// The LC-3 CPU.
///
/// Owns the register file and memory exclusively for the whole run.
/// Generic over the keyboard backend and output writer so programs run
/// against the real terminal or against in-memory buffers in tests.
#[derive(Debug)]
pub struct Cpu<K, W> {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions executed so far.
    pub cycles: u64,
    /// Keyboard feeding the GETC/IN traps and the KBSR poll.
    pub keyboard: K,
    /// Output stream for the OUT/PUTS/PUTSP/IN/HALT traps.
    pub out: W,
}

impl<K: Keyboard, W: Write> Cpu<K, W> {
    /// Create a CPU in the pre-execution state: zeroed memory, PC at
    /// the entry address, COND = Zero.
    pub fn new(keyboard: K, out: W) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            keyboard,
            out,
        }
    }

    /// Load a program image into memory. Later images overwrite earlier
    /// ones where they overlap; the PC stays at the entry address
    /// regardless of the image origin.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<LoadedImage, ImageError> {
        self.mem.load_image(bytes)
    }

    /// Execute one fetch-decode-execute cycle.
    ///
    /// Returns the instruction that was executed. The PC is advanced at
    /// fetch time, so PC-relative handlers see the address of the
    /// *following* instruction.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        let pc = self.regs.advance_pc();
        let word = self.mem.read(pc, &mut self.keyboard)?;
        let instr = decode::decode(word);
        self.execute(instr)?;

        self.cycles += 1;
        Ok(instr)
    }

    /// Run until HALT. Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start = self.cycles;
        while self.state == CpuState::Running {
            self.step()?;
        }
        Ok(self.cycles - start)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);
        while self.state == CpuState::Running && self.cycles < limit {
            self.step()?;
        }
        Ok(self.cycles - start)
    }

    /// Check if the CPU has halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction) -> Result<(), CpuError> {
        match instr {
            // ==================== Arithmetic / logic ====================
            Instruction::Add { dr, sr1, src } => {
                let rhs = self.operand(src);
                self.regs.write(dr, self.regs.read(sr1).wrapping_add(rhs));
                self.regs.update_flags(dr);
            }

            Instruction::And { dr, sr1, src } => {
                let rhs = self.operand(src);
                self.regs.write(dr, self.regs.read(sr1) & rhs);
                self.regs.update_flags(dr);
            }

            Instruction::Not { dr, sr } => {
                self.regs.write(dr, !self.regs.read(sr));
                self.regs.update_flags(dr);
            }

            // ==================== Control transfer ====================
            Instruction::Br { mask, offset } => {
                if self.regs.cond_matches(mask) {
                    self.regs.pc = self.regs.pc.wrapping_add(offset);
                }
            }

            Instruction::Jmp { base } => {
                self.regs.pc = self.regs.read(base);
            }

            Instruction::Jsr { target } => {
                self.regs.write(7, self.regs.pc);
                match target {
                    JsrTarget::Offset(offset) => {
                        self.regs.pc = self.regs.pc.wrapping_add(offset);
                    }
                    JsrTarget::Register(base) => {
                        self.regs.pc = self.regs.read(base);
                    }
                }
            }

            // ==================== Loads ====================
            Instruction::Ld { dr, offset } => {
                let addr = self.regs.pc.wrapping_add(offset);
                let value = self.mem.read(addr, &mut self.keyboard)?;
                self.regs.write(dr, value);
                self.regs.update_flags(dr);
            }

            Instruction::Ldi { dr, offset } => {
                let ptr = self.regs.pc.wrapping_add(offset);
                let addr = self.mem.read(ptr, &mut self.keyboard)?;
                let value = self.mem.read(addr, &mut self.keyboard)?;
                self.regs.write(dr, value);
                self.regs.update_flags(dr);
            }

            Instruction::Ldr { dr, base, offset } => {
                let addr = self.regs.read(base).wrapping_add(offset);
                let value = self.mem.read(addr, &mut self.keyboard)?;
                self.regs.write(dr, value);
                self.regs.update_flags(dr);
            }

            Instruction::Lea { dr, offset } => {
                self.regs.write(dr, self.regs.pc.wrapping_add(offset));
                self.regs.update_flags(dr);
            }

            // ==================== Stores ====================
            Instruction::St { sr, offset } => {
                let addr = self.regs.pc.wrapping_add(offset);
                self.mem.write(addr, self.regs.read(sr));
            }

            Instruction::Sti { sr, offset } => {
                let ptr = self.regs.pc.wrapping_add(offset);
                let addr = self.mem.read(ptr, &mut self.keyboard)?;
                self.mem.write(addr, self.regs.read(sr));
            }

            Instruction::Str { sr, base, offset } => {
                let addr = self.regs.read(base).wrapping_add(offset);
                self.mem.write(addr, self.regs.read(sr));
            }

            // ==================== Traps and inert opcodes ====================
            Instruction::Trap { vector } => self.trap(vector)?,

            // RTI and the reserved opcode fall through with no effect.
            Instruction::Rti | Instruction::Reserved => {}
        }

        Ok(())
    }

    /// Resolve the second ALU operand.
    fn operand(&self, src: Operand) -> u16 {
        match src {
            Operand::Register(sr2) => self.regs.read(sr2),
            Operand::Immediate(imm) => imm,
        }
    }

    /// Dispatch a trap vector to its service routine.
    ///
    /// R7 receives the return address before dispatch, as the hardware
    /// trap mechanism would leave it.
    fn trap(&mut self, vector: u8) -> Result<(), CpuError> {
        self.regs.write(7, self.regs.pc);

        match TrapVector::try_from(vector).map_err(CpuError::UnknownTrap)? {
            TrapVector::Getc => {
                let key = self.keyboard.read_byte()?;
                self.regs.write(0, key as u16);
                self.regs.update_flags(0);
            }

            TrapVector::Out => {
                let byte = self.regs.read(0) as u8;
                self.emit(&[byte])?;
            }

            TrapVector::Puts => {
                let mut bytes = Vec::new();
                let mut addr = self.regs.read(0);
                loop {
                    let word = self.mem.fetch(addr);
                    if word == 0 {
                        break;
                    }
                    bytes.push(word as u8);
                    addr = addr.wrapping_add(1);
                }
                self.emit(&bytes)?;
            }

            TrapVector::In => {
                self.emit(b"Enter a character: ")?;
                let key = self.keyboard.read_byte()?;
                self.emit(&[key])?;
                self.regs.write(0, key as u16);
                self.regs.update_flags(0);
            }

            TrapVector::Putsp => {
                let mut bytes = Vec::new();
                let mut addr = self.regs.read(0);
                loop {
                    let word = self.mem.fetch(addr);
                    if word == 0 {
                        break;
                    }
                    bytes.push(word as u8);
                    let high = (word >> 8) as u8;
                    if high != 0 {
                        bytes.push(high);
                    }
                    addr = addr.wrapping_add(1);
                }
                self.emit(&bytes)?;
            }

            TrapVector::Halt => {
                self.emit(b"HALT\n")?;
                self.state = CpuState::Halted;
            }
        }

        Ok(())
    }

    /// Write to the output stream and flush immediately, so trap output
    /// is visible before the next blocking read.
    fn emit(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)?;
        self.out.flush()
    }
}

/// Errors that can occur during CPU execution. All of them are fatal to
/// the run; there is no resumption.
#[derive(Debug, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("unknown trap vector 0x{0:02X}")]
    UnknownTrap(u8),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
