//! Instruction decoder for the LC-3.
//!
//! The 4-bit opcode field makes decoding total: all 16 values map to a
//! variant, including RTI and the reserved opcode, which this emulator
//! treats as inert. Offset fields come out already sign-extended to 16
//! bits, so handlers only ever do wrapping word additions.

use crate::bits::{field, flag, sign_extend};

/// Second source operand of ADD and AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// Register mode: the SR2 field.
    Register(u16),
    /// Immediate mode: imm5, sign-extended.
    Immediate(u16),
}

/// Jump target of JSR/JSRR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsrTarget {
    /// JSR: PC-relative offset11, sign-extended.
    Offset(u16),
    /// JSRR: base register holding the target address.
    Register(u16),
}

/// A decoded LC-3 instruction.
///
/// Register fields are 3-bit indices (0..=7); offset fields are
/// sign-extended 16-bit words ready for wrapping addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Conditional branch: if `mask` intersects COND, PC += offset9.
    Br { mask: u16, offset: u16 },
    /// dr = sr1 + operand; sets flags.
    Add { dr: u16, sr1: u16, src: Operand },
    /// dr = mem[PC + offset9]; sets flags.
    Ld { dr: u16, offset: u16 },
    /// mem[PC + offset9] = sr.
    St { sr: u16, offset: u16 },
    /// R7 = PC, then jump to the target.
    Jsr { target: JsrTarget },
    /// dr = sr1 & operand; sets flags.
    And { dr: u16, sr1: u16, src: Operand },
    /// dr = mem[base + offset6]; sets flags.
    Ldr { dr: u16, base: u16, offset: u16 },
    /// mem[base + offset6] = sr.
    Str { sr: u16, base: u16, offset: u16 },
    /// Return from interrupt. Inert in this emulator.
    Rti,
    /// dr = !sr; sets flags.
    Not { dr: u16, sr: u16 },
    /// dr = mem[mem[PC + offset9]]; sets flags.
    Ldi { dr: u16, offset: u16 },
    /// mem[mem[PC + offset9]] = sr.
    Sti { sr: u16, offset: u16 },
    /// PC = base. With base = R7 this is RET.
    Jmp { base: u16 },
    /// The unassigned opcode 0b1101. Inert in this emulator.
    Reserved,
    /// dr = PC + offset9; sets flags.
    Lea { dr: u16, offset: u16 },
    /// R7 = PC, then dispatch on the trap vector byte.
    Trap { vector: u8 },
}

/// Decode a fetched instruction word.
pub fn decode(word: u16) -> Instruction {
    let dr = field(word, 9, 3);
    let sr1 = field(word, 6, 3);

    match field(word, 12, 4) {
        0x0 => Instruction::Br {
            mask: field(word, 9, 3),
            offset: sign_extend(field(word, 0, 9), 9),
        },
        0x1 => Instruction::Add {
            dr,
            sr1,
            src: alu_operand(word),
        },
        0x2 => Instruction::Ld {
            dr,
            offset: sign_extend(field(word, 0, 9), 9),
        },
        0x3 => Instruction::St {
            sr: dr,
            offset: sign_extend(field(word, 0, 9), 9),
        },
        0x4 => Instruction::Jsr {
            target: if flag(word, 11) {
                JsrTarget::Offset(sign_extend(field(word, 0, 11), 11))
            } else {
                JsrTarget::Register(sr1)
            },
        },
        0x5 => Instruction::And {
            dr,
            sr1,
            src: alu_operand(word),
        },
        0x6 => Instruction::Ldr {
            dr,
            base: sr1,
            offset: sign_extend(field(word, 0, 6), 6),
        },
        0x7 => Instruction::Str {
            sr: dr,
            base: sr1,
            offset: sign_extend(field(word, 0, 6), 6),
        },
        0x8 => Instruction::Rti,
        0x9 => Instruction::Not { dr, sr: sr1 },
        0xA => Instruction::Ldi {
            dr,
            offset: sign_extend(field(word, 0, 9), 9),
        },
        0xB => Instruction::Sti {
            sr: dr,
            offset: sign_extend(field(word, 0, 9), 9),
        },
        0xC => Instruction::Jmp { base: sr1 },
        0xD => Instruction::Reserved,
        0xE => Instruction::Lea {
            dr,
            offset: sign_extend(field(word, 0, 9), 9),
        },
        // field() masks to 4 bits, so 0xF is the only value left.
        _ => Instruction::Trap {
            vector: (word & 0xFF) as u8,
        },
    }
}

/// Decode the ADD/AND second operand: bit 5 selects imm5 vs SR2.
fn alu_operand(word: u16) -> Operand {
    if flag(word, 5) {
        Operand::Immediate(sign_extend(field(word, 0, 5), 5))
    } else {
        Operand::Register(field(word, 0, 3))
    }
}

/// Trap service routines, by vector byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapVector {
    /// 0x20: read one key into R0, no echo.
    Getc,
    /// 0x21: write the low byte of R0.
    Out,
    /// 0x22: write a zero-terminated string, one char per word.
    Puts,
    /// 0x23: prompt, read one key, echo it, store into R0.
    In,
    /// 0x24: write a zero-terminated string, two packed chars per word.
    Putsp,
    /// 0x25: stop the execution loop.
    Halt,
}

impl TryFrom<u8> for TrapVector {
    type Error = u8;

    fn try_from(vector: u8) -> Result<Self, u8> {
        match vector {
            0x20 => Ok(TrapVector::Getc),
            0x21 => Ok(TrapVector::Out),
            0x22 => Ok(TrapVector::Puts),
            0x23 => Ok(TrapVector::In),
            0x24 => Ok(TrapVector::Putsp),
            0x25 => Ok(TrapVector::Halt),
            other => Err(other),
        }
    }
}
