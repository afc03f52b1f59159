//! Instruction decoder for the TY-16.
//!
//! Each instruction is a one-byte opcode followed by its operands:
//! - immediate form (4 bytes): opcode, 16-bit little-endian immediate,
//!   register byte
//! - register form (3 bytes): opcode, source register byte, destination
//!   register byte
//! - EXIT (1 byte): opcode only
//!
//! The stream is parsed sequentially from offset 0 with no alignment,
//! padding, or length prefix. Immediates are assembled from their two bytes
//! explicitly, so the decoded value matches the stream on any host byte
//! order.

use crate::cpu::registers::Register;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The closed TY-16 opcode set.
///
/// The numeric values are the wire encoding and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    Movi = 20,
    Movr = 21,
    Addi = 30,
    Addr = 31,
    Subi = 32,
    Subr = 33,
    Muli = 34,
    Mulr = 35,
    Imuli = 36,
    Imulr = 37,
    Divi = 38,
    Divr = 39,
    Idivi = 40,
    Idivr = 41,
    Exit = 255,
}

impl Opcode {
    /// Recognize an opcode byte. Any byte outside the enumeration is
    /// unrecognized and fatal to decoding.
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        match byte {
            20 => Some(Opcode::Movi),
            21 => Some(Opcode::Movr),
            30 => Some(Opcode::Addi),
            31 => Some(Opcode::Addr),
            32 => Some(Opcode::Subi),
            33 => Some(Opcode::Subr),
            34 => Some(Opcode::Muli),
            35 => Some(Opcode::Mulr),
            36 => Some(Opcode::Imuli),
            37 => Some(Opcode::Imulr),
            38 => Some(Opcode::Divi),
            39 => Some(Opcode::Divr),
            40 => Some(Opcode::Idivi),
            41 => Some(Opcode::Idivr),
            255 => Some(Opcode::Exit),
            _ => None,
        }
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Movi => "MOVI",
            Opcode::Movr => "MOVR",
            Opcode::Addi => "ADDI",
            Opcode::Addr => "ADDR",
            Opcode::Subi => "SUBI",
            Opcode::Subr => "SUBR",
            Opcode::Muli => "MULI",
            Opcode::Mulr => "MULR",
            Opcode::Imuli => "IMULI",
            Opcode::Imulr => "IMULR",
            Opcode::Divi => "DIVI",
            Opcode::Divr => "DIVR",
            Opcode::Idivi => "IDIVI",
            Opcode::Idivr => "IDIVR",
            Opcode::Exit => "EXIT",
        }
    }

    /// Total encoded length in bytes, opcode included.
    pub const fn encoded_len(self) -> usize {
        match self {
            Opcode::Movi
            | Opcode::Addi
            | Opcode::Subi
            | Opcode::Muli
            | Opcode::Imuli
            | Opcode::Divi
            | Opcode::Idivi => 4,
            Opcode::Movr
            | Opcode::Addr
            | Opcode::Subr
            | Opcode::Mulr
            | Opcode::Imulr
            | Opcode::Divr
            | Opcode::Idivr => 3,
            Opcode::Exit => 1,
        }
    }
}

/// Which operand slot a register byte came from, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperandRole {
    /// Source register of a register-form instruction.
    Source,
    /// Destination register of a register-form instruction.
    Destination,
    /// The sole register of an immediate-form instruction.
    Register,
}

impl std::fmt::Display for OperandRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OperandRole::Source => "source",
            OperandRole::Destination => "destination",
            OperandRole::Register => "register",
        })
    }
}

/// Decoded TY-16 instruction.
///
/// Register operands are validated at decode time, so every `Register` held
/// here is a legal, non-flags slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// reg = imm
    Movi { imm: u16, dst: Register },
    /// dst = src
    Movr { src: Register, dst: Register },
    /// reg += imm (wrapping)
    Addi { imm: u16, dst: Register },
    /// dst += src (wrapping)
    Addr { src: Register, dst: Register },
    /// reg -= imm (wrapping)
    Subi { imm: u16, dst: Register },
    /// dst -= src (wrapping)
    Subr { src: Register, dst: Register },
    /// reg *= imm (wrapping, unsigned)
    Muli { imm: u16, dst: Register },
    /// dst *= src (wrapping, unsigned)
    Mulr { src: Register, dst: Register },
    /// reg = signed(reg) * signed(imm), truncated
    Imuli { imm: u16, dst: Register },
    /// dst = signed(dst) * signed(src), truncated
    Imulr { src: Register, dst: Register },
    /// R0 = reg / imm, R1 = reg % imm (unsigned; no-op when imm is 0)
    Divi { imm: u16, reg: Register },
    /// R0 = dst / src, R1 = dst % src (unsigned; no-op when src is 0)
    Divr { src: Register, dst: Register },
    /// Signed quotient/remainder into R0/R1 (no-op when imm is 0)
    Idivi { imm: u16, reg: Register },
    /// Signed quotient/remainder into R0/R1 (no-op when src is 0)
    Idivr { src: Register, dst: Register },
    /// Halt immediately
    Exit,
}

impl Instruction {
    /// The opcode this instruction encodes to.
    pub const fn opcode(&self) -> Opcode {
        match self {
            Instruction::Movi { .. } => Opcode::Movi,
            Instruction::Movr { .. } => Opcode::Movr,
            Instruction::Addi { .. } => Opcode::Addi,
            Instruction::Addr { .. } => Opcode::Addr,
            Instruction::Subi { .. } => Opcode::Subi,
            Instruction::Subr { .. } => Opcode::Subr,
            Instruction::Muli { .. } => Opcode::Muli,
            Instruction::Mulr { .. } => Opcode::Mulr,
            Instruction::Imuli { .. } => Opcode::Imuli,
            Instruction::Imulr { .. } => Opcode::Imulr,
            Instruction::Divi { .. } => Opcode::Divi,
            Instruction::Divr { .. } => Opcode::Divr,
            Instruction::Idivi { .. } => Opcode::Idivi,
            Instruction::Idivr { .. } => Opcode::Idivr,
            Instruction::Exit => Opcode::Exit,
        }
    }
}

/// Decode one instruction from the front of `bytes`.
///
/// `bytes` is the remaining instruction stream. On success returns the
/// decoded instruction and its total encoded length. The truncation check
/// runs before any operand byte is read.
///
/// # Panics
/// Panics if `bytes` is empty.
pub fn decode(bytes: &[u8]) -> Result<(Instruction, usize), DecodeError> {
    let opcode = Opcode::from_byte(bytes[0]).ok_or(DecodeError::UnknownOpcode(bytes[0]))?;

    let needed = opcode.encoded_len();
    if bytes.len() < needed {
        return Err(DecodeError::Truncated {
            mnemonic: opcode.mnemonic(),
            needed,
            remaining: bytes.len(),
        });
    }

    let instruction = match opcode {
        Opcode::Movi => {
            let (imm, reg) = immediate_operands(bytes)?;
            Instruction::Movi { imm, dst: reg }
        }
        Opcode::Movr => {
            let (src, dst) = register_operands(bytes)?;
            Instruction::Movr { src, dst }
        }
        Opcode::Addi => {
            let (imm, reg) = immediate_operands(bytes)?;
            Instruction::Addi { imm, dst: reg }
        }
        Opcode::Addr => {
            let (src, dst) = register_operands(bytes)?;
            Instruction::Addr { src, dst }
        }
        Opcode::Subi => {
            let (imm, reg) = immediate_operands(bytes)?;
            Instruction::Subi { imm, dst: reg }
        }
        Opcode::Subr => {
            let (src, dst) = register_operands(bytes)?;
            Instruction::Subr { src, dst }
        }
        Opcode::Muli => {
            let (imm, reg) = immediate_operands(bytes)?;
            Instruction::Muli { imm, dst: reg }
        }
        Opcode::Mulr => {
            let (src, dst) = register_operands(bytes)?;
            Instruction::Mulr { src, dst }
        }
        Opcode::Imuli => {
            let (imm, reg) = immediate_operands(bytes)?;
            Instruction::Imuli { imm, dst: reg }
        }
        Opcode::Imulr => {
            let (src, dst) = register_operands(bytes)?;
            Instruction::Imulr { src, dst }
        }
        Opcode::Divi => {
            let (imm, reg) = immediate_operands(bytes)?;
            Instruction::Divi { imm, reg }
        }
        Opcode::Divr => {
            let (src, dst) = register_operands(bytes)?;
            Instruction::Divr { src, dst }
        }
        Opcode::Idivi => {
            let (imm, reg) = immediate_operands(bytes)?;
            Instruction::Idivi { imm, reg }
        }
        Opcode::Idivr => {
            let (src, dst) = register_operands(bytes)?;
            Instruction::Idivr { src, dst }
        }
        Opcode::Exit => Instruction::Exit,
    };

    Ok((instruction, needed))
}

/// Encode an instruction back to its byte form.
pub fn encode(instr: &Instruction) -> Vec<u8> {
    let opcode = instr.opcode();
    let mut out = Vec::with_capacity(opcode.encoded_len());
    out.push(opcode as u8);

    match *instr {
        Instruction::Movi { imm, dst }
        | Instruction::Addi { imm, dst }
        | Instruction::Subi { imm, dst }
        | Instruction::Muli { imm, dst }
        | Instruction::Imuli { imm, dst } => {
            out.extend_from_slice(&imm.to_le_bytes());
            out.push(dst as u8);
        }
        Instruction::Divi { imm, reg } | Instruction::Idivi { imm, reg } => {
            out.extend_from_slice(&imm.to_le_bytes());
            out.push(reg as u8);
        }
        Instruction::Movr { src, dst }
        | Instruction::Addr { src, dst }
        | Instruction::Subr { src, dst }
        | Instruction::Mulr { src, dst }
        | Instruction::Imulr { src, dst }
        | Instruction::Divr { src, dst }
        | Instruction::Idivr { src, dst } => {
            out.push(src as u8);
            out.push(dst as u8);
        }
        Instruction::Exit => {}
    }

    out
}

/// Immediate and register operands of a 4-byte immediate-form instruction.
fn immediate_operands(bytes: &[u8]) -> Result<(u16, Register), DecodeError> {
    let imm = u16::from_le_bytes([bytes[1], bytes[2]]);
    let reg = register_operand(bytes[3], OperandRole::Register)?;
    Ok((imm, reg))
}

/// Source and destination operands of a 3-byte register-form instruction.
fn register_operands(bytes: &[u8]) -> Result<(Register, Register), DecodeError> {
    let src = register_operand(bytes[1], OperandRole::Source)?;
    let dst = register_operand(bytes[2], OperandRole::Destination)?;
    Ok((src, dst))
}

fn register_operand(byte: u8, role: OperandRole) -> Result<Register, DecodeError> {
    Register::from_byte(byte).ok_or(DecodeError::IllegalRegister { role, value: byte })
}

/// Errors that can occur during instruction decoding. All are fatal: the
/// run is abandoned, with no skip-and-continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Byte at the current offset names no instruction.
    #[error("unrecognized opcode {0:#04x} ({0})")]
    UnknownOpcode(u8),

    /// Fewer bytes remain than the opcode requires.
    #[error("truncated instruction: {mnemonic} needs {needed} bytes, {remaining} remaining")]
    Truncated {
        mnemonic: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// A register operand is past the register file or names the flags slot.
    #[error("illegal {role} register: {value:#04x} ({value})")]
    IllegalRegister { role: OperandRole, value: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_movi() {
        let (instr, len) = decode(&[20, 0x34, 0x12, 0x02]).unwrap();
        assert_eq!(
            instr,
            Instruction::Movi {
                imm: 0x1234,
                dst: Register::R2
            }
        );
        assert_eq!(len, 4);
    }

    #[test]
    fn test_immediate_is_little_endian() {
        // [0x34, 0x12] must decode to 0x1234 regardless of host byte order.
        let (instr, _) = decode(&[30, 0x34, 0x12, 0x00]).unwrap();
        assert_eq!(
            instr,
            Instruction::Addi {
                imm: 0x1234,
                dst: Register::R0
            }
        );
    }

    #[test]
    fn test_decode_register_form() {
        let (instr, len) = decode(&[21, 0x03, 0x05]).unwrap();
        assert_eq!(
            instr,
            Instruction::Movr {
                src: Register::R3,
                dst: Register::R5
            }
        );
        assert_eq!(len, 3);
    }

    #[test]
    fn test_decode_exit() {
        let (instr, len) = decode(&[255]).unwrap();
        assert_eq!(instr, Instruction::Exit);
        assert_eq!(len, 1);
    }

    #[test]
    fn test_sp_and_bp_are_legal_operands() {
        let (instr, _) = decode(&[21, 8, 9]).unwrap();
        assert_eq!(
            instr,
            Instruction::Movr {
                src: Register::Sp,
                dst: Register::Bp
            }
        );
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(decode(&[99]), Err(DecodeError::UnknownOpcode(99)));
        // Trailing garbage after an unknown opcode changes nothing.
        assert_eq!(decode(&[0, 1, 2, 3]), Err(DecodeError::UnknownOpcode(0)));
    }

    #[test]
    fn test_truncated_immediate_form() {
        assert_eq!(
            decode(&[30, 0x01]),
            Err(DecodeError::Truncated {
                mnemonic: "ADDI",
                needed: 4,
                remaining: 2
            })
        );
    }

    #[test]
    fn test_truncated_register_form() {
        assert_eq!(
            decode(&[33, 0x01]),
            Err(DecodeError::Truncated {
                mnemonic: "SUBR",
                needed: 3,
                remaining: 2
            })
        );
    }

    #[test]
    fn test_flags_slot_is_illegal_everywhere() {
        assert_eq!(
            decode(&[20, 0x00, 0x00, 10]),
            Err(DecodeError::IllegalRegister {
                role: OperandRole::Register,
                value: 10
            })
        );
        assert_eq!(
            decode(&[21, 10, 0]),
            Err(DecodeError::IllegalRegister {
                role: OperandRole::Source,
                value: 10
            })
        );
        assert_eq!(
            decode(&[21, 0, 10]),
            Err(DecodeError::IllegalRegister {
                role: OperandRole::Destination,
                value: 10
            })
        );
    }

    #[test]
    fn test_register_operand_out_of_range() {
        assert_eq!(
            decode(&[31, 0x0C, 0x00]),
            Err(DecodeError::IllegalRegister {
                role: OperandRole::Source,
                value: 12
            })
        );
    }

    #[test]
    fn test_unknown_opcode_message_has_both_forms() {
        let message = DecodeError::UnknownOpcode(99).to_string();
        assert!(message.contains("0x63"));
        assert!(message.contains("99"));
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let cases = [
            Instruction::Movi { imm: 0xABCD, dst: Register::R7 },
            Instruction::Movr { src: Register::R1, dst: Register::R2 },
            Instruction::Addi { imm: 1, dst: Register::Sp },
            Instruction::Addr { src: Register::R0, dst: Register::Bp },
            Instruction::Subi { imm: 0xFFFF, dst: Register::R4 },
            Instruction::Subr { src: Register::R5, dst: Register::R5 },
            Instruction::Muli { imm: 300, dst: Register::R6 },
            Instruction::Mulr { src: Register::R2, dst: Register::R3 },
            Instruction::Imuli { imm: (-2i16) as u16, dst: Register::R1 },
            Instruction::Imulr { src: Register::R7, dst: Register::R0 },
            Instruction::Divi { imm: 10, reg: Register::R2 },
            Instruction::Divr { src: Register::R3, dst: Register::R4 },
            Instruction::Idivi { imm: 3, reg: Register::R5 },
            Instruction::Idivr { src: Register::R6, dst: Register::R7 },
            Instruction::Exit,
        ];

        for instr in cases {
            let bytes = encode(&instr);
            assert_eq!(bytes.len(), instr.opcode().encoded_len());
            let (decoded, len) = decode(&bytes).unwrap();
            assert_eq!(decoded, instr);
            assert_eq!(len, bytes.len());
        }
    }

    #[test]
    fn test_opcode_wire_values() {
        assert_eq!(Opcode::Movi as u8, 20);
        assert_eq!(Opcode::Movr as u8, 21);
        assert_eq!(Opcode::Addi as u8, 30);
        assert_eq!(Opcode::Idivr as u8, 41);
        assert_eq!(Opcode::Exit as u8, 255);
    }

    #[test]
    fn test_from_byte_recognizes_only_wire_values() {
        for byte in 0..=u8::MAX {
            let recognized = matches!(byte, 20 | 21 | 30..=41 | 255);
            assert_eq!(Opcode::from_byte(byte).is_some(), recognized, "byte {byte}");
        }
    }
}
