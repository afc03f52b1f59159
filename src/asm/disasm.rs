//! Disassembler for TY-16 programs.
//!
//! Converts byte programs back to readable assembly.

use crate::cpu::decode::{decode, Instruction};

/// Format a single decoded instruction as assembly text.
pub fn disassemble_instruction(instr: &Instruction) -> String {
    match *instr {
        Instruction::Movi { imm, dst } => format!("MOVI {}, {}", imm, dst),
        Instruction::Movr { src, dst } => format!("MOVR {}, {}", src, dst),
        Instruction::Addi { imm, dst } => format!("ADDI {}, {}", imm, dst),
        Instruction::Addr { src, dst } => format!("ADDR {}, {}", src, dst),
        Instruction::Subi { imm, dst } => format!("SUBI {}, {}", imm, dst),
        Instruction::Subr { src, dst } => format!("SUBR {}, {}", src, dst),
        Instruction::Muli { imm, dst } => format!("MULI {}, {}", imm, dst),
        Instruction::Mulr { src, dst } => format!("MULR {}, {}", src, dst),
        Instruction::Imuli { imm, dst } => format!("IMULI {}, {}", imm, dst),
        Instruction::Imulr { src, dst } => format!("IMULR {}, {}", src, dst),
        Instruction::Divi { imm, reg } => format!("DIVI {}, {}", imm, reg),
        Instruction::Divr { src, dst } => format!("DIVR {}, {}", src, dst),
        Instruction::Idivi { imm, reg } => format!("IDIVI {}, {}", imm, reg),
        Instruction::Idivr { src, dst } => format!("IDIVR {}, {}", src, dst),
        Instruction::Exit => "EXIT".to_string(),
    }
}

/// Disassemble a byte program to a listing with hex offsets.
///
/// Bytes that do not decode are emitted as `DB` lines and the scan resumes
/// at the next byte.
pub fn disassemble(code: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; TY-16 disassembly\n\n");

    let mut offset = 0;
    while offset < code.len() {
        match decode(&code[offset..]) {
            Ok((instr, len)) => {
                output.push_str(&format!(
                    "{:04X}: {}\n",
                    offset,
                    disassemble_instruction(&instr)
                ));
                offset += len;
            }
            Err(e) => {
                output.push_str(&format!("{:04X}: DB {:#04x} ; {}\n", offset, code[offset], e));
                offset += 1;
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::registers::Register;

    #[test]
    fn test_disassemble_movi() {
        let instr = Instruction::Movi { imm: 5, dst: Register::R2 };
        assert_eq!(disassemble_instruction(&instr), "MOVI 5, R2");
    }

    #[test]
    fn test_disassemble_exit() {
        assert_eq!(disassemble_instruction(&Instruction::Exit), "EXIT");
    }

    #[test]
    fn test_listing_walks_variable_lengths() {
        // MOVI 5, R2; ADDR R2, R3; EXIT
        let listing = disassemble(&[20, 0x05, 0x00, 0x02, 31, 0x02, 0x03, 255]);
        assert!(listing.contains("0000: MOVI 5, R2"));
        assert!(listing.contains("0004: ADDR R2, R3"));
        assert!(listing.contains("0007: EXIT"));
    }

    #[test]
    fn test_undecodable_byte_marked_as_db() {
        let listing = disassemble(&[99, 255]);
        assert!(listing.contains("0000: DB 0x63"));
        assert!(listing.contains("0001: EXIT"));
    }

    #[test]
    fn test_listing_roundtrips_through_assembler() {
        let source = "MOVI 1234, R5\nDIVR R6, R5\nEXIT";
        let code = crate::asm::assembler::assemble(source).unwrap();
        let listing = disassemble(&code);
        assert!(listing.contains("MOVI 1234, R5"));
        assert!(listing.contains("DIVR R6, R5"));
        assert!(listing.contains("EXIT"));
    }
}
