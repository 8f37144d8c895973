//! LC-3 CPU registers.
//!
//! The LC-3 has 10 registers, all 16 bits wide:
//! - R0..R7: general purpose (R7 doubles as the subroutine link register)
//! - PC: program counter
//! - COND: condition flags (exactly one of positive / zero / negative)

/// Condition flag values.
///
/// Branch instructions carry a 3-bit mask tested against these, so the
/// discriminants are one-hot: P = bit 0, Z = bit 1, N = bit 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Flag {
    Positive = 1 << 0,
    Zero = 1 << 1,
    Negative = 1 << 2,
}

/// The LC-3 register file.
#[derive(Debug, Clone)]
pub struct Registers {
    /// R0..R7 general-purpose registers.
    gpr: [u16; 8],
    /// Program counter. Always points at the *next* instruction once a
    /// fetch has completed; PC-relative offsets are taken against that.
    pub pc: u16,
    /// Condition flags, set by the flag-affecting instructions.
    pub cond: Flag,
}

impl Registers {
    /// Architecture-defined entry address.
    pub const PC_START: u16 = 0x3000;

    /// Create a register file in the pre-execution state: all general
    /// registers zero, COND = Zero, PC at the entry address.
    pub fn new() -> Self {
        Self {
            gpr: [0; 8],
            pc: Self::PC_START,
            cond: Flag::Zero,
        }
    }

    /// Read a general-purpose register. Indices are 3-bit fields, so
    /// callers pass values already masked to 0..=7.
    #[inline]
    pub fn read(&self, r: u16) -> u16 {
        self.gpr[r as usize & 7]
    }

    /// Write a general-purpose register.
    #[inline]
    pub fn write(&mut self, r: u16, value: u16) {
        self.gpr[r as usize & 7] = value;
    }

    /// Return the current PC and advance it by one word.
    #[inline]
    pub fn advance_pc(&mut self) -> u16 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(1);
        old
    }

    /// Set COND from the current value of register `r`.
    ///
    /// Negative if bit 15 is set, zero if the value is exactly zero,
    /// positive otherwise. Exactly one flag holds afterwards.
    pub fn update_flags(&mut self, r: u16) {
        let value = self.read(r);
        self.cond = if value == 0 {
            Flag::Zero
        } else if value >> 15 == 1 {
            Flag::Negative
        } else {
            Flag::Positive
        };
    }

    /// Test a 3-bit branch condition mask against the current flags.
    #[inline]
    pub fn cond_matches(&self, mask: u16) -> bool {
        mask & self.cond as u16 != 0
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let regs = Registers::new();
        for r in 0..8 {
            assert_eq!(regs.read(r), 0);
        }
        assert_eq!(regs.pc, Registers::PC_START);
        assert_eq!(regs.cond, Flag::Zero);
    }

    #[test]
    fn test_read_write() {
        let mut regs = Registers::new();
        regs.write(3, 0xBEEF);
        assert_eq!(regs.read(3), 0xBEEF);
    }

    #[test]
    fn test_update_flags_exhaustive() {
        let mut regs = Registers::new();

        regs.write(0, 1);
        regs.update_flags(0);
        assert_eq!(regs.cond, Flag::Positive);

        regs.write(0, 0);
        regs.update_flags(0);
        assert_eq!(regs.cond, Flag::Zero);

        regs.write(0, 0x8000);
        regs.update_flags(0);
        assert_eq!(regs.cond, Flag::Negative);
    }

    #[test]
    fn test_cond_matches_mask() {
        let mut regs = Registers::new();
        regs.write(1, 5);
        regs.update_flags(1);

        // BRp and BRnzp match a positive result; BRnz does not.
        assert!(regs.cond_matches(0b001));
        assert!(regs.cond_matches(0b111));
        assert!(!regs.cond_matches(0b110));
    }

    #[test]
    fn test_advance_pc() {
        let mut regs = Registers::new();
        let old = regs.advance_pc();
        assert_eq!(old, Registers::PC_START);
        assert_eq!(regs.pc, Registers::PC_START + 1);
    }

    #[test]
    fn test_advance_pc_wraps() {
        let mut regs = Registers::new();
        regs.pc = 0xFFFF;
        regs.advance_pc();
        assert_eq!(regs.pc, 0);
    }
}
