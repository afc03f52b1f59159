//! Simple assembler for TY-16 programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//!     MOVI 5, R2      ; R2 = 5
//!     ADDR R2, R3     ; R3 += R2
//!     DIVI 0x10, R3   ; R0 = R3 / 16, R1 = R3 % 16
//!     EXIT
//!     DB 255          ; emit a raw byte
//! ```
//!
//! Immediates accept decimal, `0x` hex, and negative decimal (encoded as
//! two's complement). Registers are R0-R7, SP, and BP; the flags slot has
//! no operand name. There are no labels: the instruction set has no control
//! flow for them to target.

use crate::cpu::decode::{encode, Instruction};
use crate::cpu::registers::Register;
use thiserror::Error;

/// Assemble source code to a byte program.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    let mut output = Vec::new();

    for (line_num, line) in source.lines().enumerate() {
        process_line(line, line_num + 1, &mut output)?;
    }

    Ok(output)
}

fn process_line(line: &str, line_num: usize, output: &mut Vec<u8>) -> Result<(), AssemblerError> {
    let line = line.trim();

    // Skip empty lines and comments
    if line.is_empty() || line.starts_with(';') {
        return Ok(());
    }

    // Remove inline comments
    let line = match line.find(';') {
        Some(idx) => line[..idx].trim(),
        None => line,
    };
    if line.is_empty() {
        return Ok(());
    }

    let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
        Some((m, r)) => (m.to_uppercase(), r.trim()),
        None => (line.to_uppercase(), ""),
    };
    let operands: Vec<&str> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    };

    match mnemonic.as_str() {
        // Directive: emit one raw byte, for crafting arbitrary streams
        "DB" => {
            let operand = single_operand(&mnemonic, &operands, line_num)?;
            let value = parse_number(operand, line_num)?;
            if !(0..=255).contains(&value) {
                return Err(AssemblerError::ValueOutOfRange { line: line_num, value });
            }
            output.push(value as u8);
        }

        _ => {
            let instr = parse_instruction(&mnemonic, &operands, line_num)?;
            output.extend(encode(&instr));
        }
    }

    Ok(())
}

fn parse_instruction(
    mnemonic: &str,
    operands: &[&str],
    line_num: usize,
) -> Result<Instruction, AssemblerError> {
    let instr = match mnemonic {
        "MOVI" => {
            let (imm, reg) = immediate_form(mnemonic, operands, line_num)?;
            Instruction::Movi { imm, dst: reg }
        }
        "MOVR" => {
            let (src, dst) = register_form(mnemonic, operands, line_num)?;
            Instruction::Movr { src, dst }
        }
        "ADDI" => {
            let (imm, reg) = immediate_form(mnemonic, operands, line_num)?;
            Instruction::Addi { imm, dst: reg }
        }
        "ADDR" => {
            let (src, dst) = register_form(mnemonic, operands, line_num)?;
            Instruction::Addr { src, dst }
        }
        "SUBI" => {
            let (imm, reg) = immediate_form(mnemonic, operands, line_num)?;
            Instruction::Subi { imm, dst: reg }
        }
        "SUBR" => {
            let (src, dst) = register_form(mnemonic, operands, line_num)?;
            Instruction::Subr { src, dst }
        }
        "MULI" => {
            let (imm, reg) = immediate_form(mnemonic, operands, line_num)?;
            Instruction::Muli { imm, dst: reg }
        }
        "MULR" => {
            let (src, dst) = register_form(mnemonic, operands, line_num)?;
            Instruction::Mulr { src, dst }
        }
        "IMULI" => {
            let (imm, reg) = immediate_form(mnemonic, operands, line_num)?;
            Instruction::Imuli { imm, dst: reg }
        }
        "IMULR" => {
            let (src, dst) = register_form(mnemonic, operands, line_num)?;
            Instruction::Imulr { src, dst }
        }
        "DIVI" => {
            let (imm, reg) = immediate_form(mnemonic, operands, line_num)?;
            Instruction::Divi { imm, reg }
        }
        "DIVR" => {
            let (src, dst) = register_form(mnemonic, operands, line_num)?;
            Instruction::Divr { src, dst }
        }
        "IDIVI" => {
            let (imm, reg) = immediate_form(mnemonic, operands, line_num)?;
            Instruction::Idivi { imm, reg }
        }
        "IDIVR" => {
            let (src, dst) = register_form(mnemonic, operands, line_num)?;
            Instruction::Idivr { src, dst }
        }
        "EXIT" => {
            if !operands.is_empty() {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: "EXIT takes no operands".into(),
                });
            }
            Instruction::Exit
        }

        _ => {
            return Err(AssemblerError::UnknownMnemonic {
                line: line_num,
                mnemonic: mnemonic.to_string(),
            })
        }
    };

    Ok(instr)
}

/// `imm, reg` operands of an immediate-form instruction.
fn immediate_form(
    mnemonic: &str,
    operands: &[&str],
    line_num: usize,
) -> Result<(u16, Register), AssemblerError> {
    let [imm, reg] = two_operands(mnemonic, operands, line_num)?;
    Ok((parse_immediate(imm, line_num)?, parse_register(reg, line_num)?))
}

/// `src, dst` operands of a register-form instruction.
fn register_form(
    mnemonic: &str,
    operands: &[&str],
    line_num: usize,
) -> Result<(Register, Register), AssemblerError> {
    let [src, dst] = two_operands(mnemonic, operands, line_num)?;
    Ok((parse_register(src, line_num)?, parse_register(dst, line_num)?))
}

fn single_operand<'a>(
    mnemonic: &str,
    operands: &[&'a str],
    line_num: usize,
) -> Result<&'a str, AssemblerError> {
    match operands {
        &[operand] => Ok(operand),
        _ => Err(AssemblerError::SyntaxError {
            line: line_num,
            message: format!("{} expects 1 operand, found {}", mnemonic, operands.len()),
        }),
    }
}

fn two_operands<'a>(
    mnemonic: &str,
    operands: &[&'a str],
    line_num: usize,
) -> Result<[&'a str; 2], AssemblerError> {
    match operands {
        &[first, second] => Ok([first, second]),
        _ => Err(AssemblerError::SyntaxError {
            line: line_num,
            message: format!("{} expects 2 operands, found {}", mnemonic, operands.len()),
        }),
    }
}

fn parse_immediate(text: &str, line_num: usize) -> Result<u16, AssemblerError> {
    let value = parse_number(text, line_num)?;
    if value < i32::from(i16::MIN) || value > i32::from(u16::MAX) {
        return Err(AssemblerError::ValueOutOfRange { line: line_num, value });
    }
    Ok(value as u16)
}

fn parse_number(text: &str, line_num: usize) -> Result<i32, AssemblerError> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i32::from_str_radix(hex, 16).map_err(|_| AssemblerError::SyntaxError {
            line: line_num,
            message: format!("invalid hex literal: {}", text),
        });
    }

    text.parse::<i32>().map_err(|_| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("invalid number: {}", text),
    })
}

fn parse_register(text: &str, line_num: usize) -> Result<Register, AssemblerError> {
    let name = text.to_uppercase();
    let reg = match name.as_str() {
        "R0" => Register::R0,
        "R1" => Register::R1,
        "R2" => Register::R2,
        "R3" => Register::R3,
        "R4" => Register::R4,
        "R5" => Register::R5,
        "R6" => Register::R6,
        "R7" => Register::R7,
        "SP" => Register::Sp,
        "BP" => Register::Bp,
        // The flags slot deliberately has no name here
        _ => return Err(AssemblerError::UnknownRegister { line: line_num, name }),
    };
    Ok(reg)
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("unknown register on line {line}: {name}")]
    UnknownRegister { line: usize, name: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i32 },
}
