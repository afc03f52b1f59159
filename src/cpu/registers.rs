//! TY-16 CPU registers.
//!
//! The machine has eleven 16-bit slots:
//! - R0-R7: general-purpose registers (R0 and R1 double as the fixed
//!   division-result targets)
//! - SP: stack-pointer slot
//! - BP: base-pointer slot
//! - FL: flags slot, reserved and never a legal operand
//!
//! SP and BP are ordinary storage with reserved names; no instruction
//! currently manipulates a stack. FL is reserved for future status-flag
//! semantics.

use serde::{Serialize, Deserialize};

/// Total number of register slots, flags slot included.
pub const REGISTER_COUNT: usize = 11;

/// A register slot identifier.
///
/// Operand bytes 0-9 map to R0-R7, SP, and BP. The flags slot exists in the
/// file but is not constructible from an operand byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Register {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
    Sp = 8,
    Bp = 9,
    Flags = 10,
}

impl Register {
    /// All slots in index order.
    pub const ALL: [Register; REGISTER_COUNT] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
        Register::Sp,
        Register::Bp,
        Register::Flags,
    ];

    /// Decode an operand byte into a register.
    ///
    /// Returns `None` for the flags slot and for anything past the end of
    /// the register file.
    pub fn from_byte(byte: u8) -> Option<Register> {
        match byte {
            0 => Some(Register::R0),
            1 => Some(Register::R1),
            2 => Some(Register::R2),
            3 => Some(Register::R3),
            4 => Some(Register::R4),
            5 => Some(Register::R5),
            6 => Some(Register::R6),
            7 => Some(Register::R7),
            8 => Some(Register::Sp),
            9 => Some(Register::Bp),
            _ => None,
        }
    }

    /// Slot index into the register file.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Register::R0 => "R0",
            Register::R1 => "R1",
            Register::R2 => "R2",
            Register::R3 => "R3",
            Register::R4 => "R4",
            Register::R5 => "R5",
            Register::R6 => "R6",
            Register::R7 => "R7",
            Register::Sp => "SP",
            Register::Bp => "BP",
            Register::Flags => "FL",
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The TY-16 register file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    slots: [u16; REGISTER_COUNT],
}

impl RegisterFile {
    /// Create a register file with all slots zeroed.
    pub fn new() -> Self {
        Self {
            slots: [0; REGISTER_COUNT],
        }
    }

    /// Read a register.
    ///
    /// No bounds checking happens here: a `Register` is already a valid
    /// slot. Operand bytes are validated when the instruction is decoded.
    #[inline]
    pub fn read(&self, reg: Register) -> u16 {
        self.slots[reg.index()]
    }

    /// Write a register.
    #[inline]
    pub fn write(&mut self, reg: Register, value: u16) {
        self.slots[reg.index()] = value;
    }

    /// Reset all slots to zero.
    pub fn reset(&mut self) {
        self.slots = [0; REGISTER_COUNT];
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RegisterFile {
    /// Renders the dump table: every slot with the unsigned and signed
    /// readings of the same bits.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Reg    u16     i16")?;
        writeln!(f)?;
        for reg in Register::ALL {
            let raw = self.slots[reg.index()];
            writeln!(f, "{}: {:6} {:7}", reg.name(), raw, raw as i16)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let regs = RegisterFile::new();
        for reg in Register::ALL {
            assert_eq!(regs.read(reg), 0);
        }
    }

    #[test]
    fn test_read_write() {
        let mut regs = RegisterFile::new();
        regs.write(Register::R3, 0xBEEF);
        assert_eq!(regs.read(Register::R3), 0xBEEF);
        assert_eq!(regs.read(Register::R4), 0);
    }

    #[test]
    fn test_sp_bp_are_ordinary_storage() {
        let mut regs = RegisterFile::new();
        regs.write(Register::Sp, 100);
        regs.write(Register::Bp, 200);
        assert_eq!(regs.read(Register::Sp), 100);
        assert_eq!(regs.read(Register::Bp), 200);
    }

    #[test]
    fn test_from_byte_accepts_operand_range() {
        assert_eq!(Register::from_byte(0), Some(Register::R0));
        assert_eq!(Register::from_byte(7), Some(Register::R7));
        assert_eq!(Register::from_byte(8), Some(Register::Sp));
        assert_eq!(Register::from_byte(9), Some(Register::Bp));
    }

    #[test]
    fn test_from_byte_rejects_flags_and_beyond() {
        assert_eq!(Register::from_byte(10), None);
        assert_eq!(Register::from_byte(11), None);
        assert_eq!(Register::from_byte(255), None);
    }

    #[test]
    fn test_reset() {
        let mut regs = RegisterFile::new();
        regs.write(Register::R0, 1);
        regs.write(Register::Bp, 2);
        regs.reset();
        assert_eq!(regs, RegisterFile::new());
    }

    #[test]
    fn test_dump_lists_every_slot() {
        let dump = RegisterFile::new().to_string();
        for reg in Register::ALL {
            assert!(dump.contains(reg.name()));
        }
    }

    #[test]
    fn test_dump_shows_signed_reading() {
        let mut regs = RegisterFile::new();
        regs.write(Register::R1, 0xFFFF);
        let dump = regs.to_string();
        assert!(dump.contains("65535"));
        assert!(dump.contains("-1"));
    }
}
