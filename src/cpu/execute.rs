//! Execution engine for the TY-16.
//!
//! Implements the fetch-decode-execute loop over a byte-coded instruction
//! stream. All faults are decode-time; once an instruction decodes, its
//! effect is total (division by zero included), so applying an instruction
//! can never fail.

use crate::cpu::decode::{self, DecodeError, Instruction};
use crate::cpu::registers::{Register, RegisterFile};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// The machine is executing normally.
    Running,
    /// An EXIT instruction was decoded, or the buffer is exhausted.
    Halted,
    /// A fatal decode error stopped the run. Terminal, like `Halted`.
    Aborted,
}

/// The TY-16 CPU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// The register file, exclusively owned by this CPU.
    pub regs: RegisterFile,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions executed over the CPU's lifetime.
    pub cycles: u64,
    /// Byte offset of the next instruction in the current buffer.
    pc: usize,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU with zeroed registers.
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::new(),
            state: CpuState::Running,
            cycles: 0,
            pc: 0,
            last_instr: None,
        }
    }

    /// Reset the CPU to power-on state, registers included.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.pc = 0;
        self.last_instr = None;
    }

    /// Run `code` from offset 0 until the machine halts or faults.
    ///
    /// Registers are NOT reset between runs: each call starts from whatever
    /// register state the previous run left behind. Only the offset and
    /// execution state are rewound. Returns the number of instructions
    /// executed by this call.
    ///
    /// On a fault the register file keeps every mutation made before the
    /// faulting instruction; there is no rollback.
    pub fn run(&mut self, code: &[u8]) -> Result<u64, CpuError> {
        self.pc = 0;
        self.state = CpuState::Running;
        let start = self.cycles;

        while self.state == CpuState::Running {
            self.step(code)?;
        }

        Ok(self.cycles - start)
    }

    /// Execute a single instruction from `code` at the current offset.
    ///
    /// Returns the executed instruction, or `Ok(None)` when the offset has
    /// reached the end of the buffer (the machine halts). Decode errors
    /// park the machine in `Aborted` and are returned to the caller; how to
    /// surface them (log, abort the process, recover) is the caller's
    /// decision.
    pub fn step(&mut self, code: &[u8]) -> Result<Option<Instruction>, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        if self.pc >= code.len() {
            self.state = CpuState::Halted;
            return Ok(None);
        }

        let (instr, len) = match decode::decode(&code[self.pc..]) {
            Ok(decoded) => decoded,
            Err(source) => {
                self.state = CpuState::Aborted;
                return Err(CpuError::Fault {
                    offset: self.pc,
                    source,
                });
            }
        };

        if instr == Instruction::Exit {
            // The terminator ends the loop without advancing the offset.
            self.state = CpuState::Halted;
        } else {
            self.apply(&instr);
            self.pc += len;
        }

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(Some(instr))
    }

    /// Apply a decoded instruction's effect to the register file.
    fn apply(&mut self, instr: &Instruction) {
        match *instr {
            Instruction::Movi { imm, dst } => self.regs.write(dst, imm),
            Instruction::Movr { src, dst } => {
                let value = self.regs.read(src);
                self.regs.write(dst, value);
            }
            Instruction::Addi { imm, dst } => {
                let value = self.regs.read(dst).wrapping_add(imm);
                self.regs.write(dst, value);
            }
            Instruction::Addr { src, dst } => {
                let value = self.regs.read(dst).wrapping_add(self.regs.read(src));
                self.regs.write(dst, value);
            }
            Instruction::Subi { imm, dst } => {
                let value = self.regs.read(dst).wrapping_sub(imm);
                self.regs.write(dst, value);
            }
            Instruction::Subr { src, dst } => {
                let value = self.regs.read(dst).wrapping_sub(self.regs.read(src));
                self.regs.write(dst, value);
            }
            Instruction::Muli { imm, dst } => {
                let value = self.regs.read(dst).wrapping_mul(imm);
                self.regs.write(dst, value);
            }
            Instruction::Mulr { src, dst } => {
                let value = self.regs.read(dst).wrapping_mul(self.regs.read(src));
                self.regs.write(dst, value);
            }
            Instruction::Imuli { imm, dst } => {
                let value = (self.regs.read(dst) as i16).wrapping_mul(imm as i16);
                self.regs.write(dst, value as u16);
            }
            Instruction::Imulr { src, dst } => {
                let value = (self.regs.read(dst) as i16).wrapping_mul(self.regs.read(src) as i16);
                self.regs.write(dst, value as u16);
            }
            Instruction::Divi { imm, reg } => self.divide_unsigned(self.regs.read(reg), imm),
            Instruction::Divr { src, dst } => {
                self.divide_unsigned(self.regs.read(dst), self.regs.read(src))
            }
            Instruction::Idivi { imm, reg } => self.divide_signed(self.regs.read(reg), imm),
            Instruction::Idivr { src, dst } => {
                self.divide_signed(self.regs.read(dst), self.regs.read(src))
            }
            // The terminator has no register effect; step() handles it.
            Instruction::Exit => {}
        }
    }

    /// Unsigned divide with the fixed result routing: quotient into R0,
    /// remainder into R1, whatever registers the operands named. A zero
    /// divisor skips both stores entirely.
    fn divide_unsigned(&mut self, dividend: u16, divisor: u16) {
        if divisor == 0 {
            return;
        }
        self.regs.write(Register::R0, dividend / divisor);
        self.regs.write(Register::R1, dividend % divisor);
    }

    /// Signed divide into the same fixed R0/R1 targets. Wrapping division:
    /// `i16::MIN / -1` stays `i16::MIN` instead of trapping.
    fn divide_signed(&mut self, dividend: u16, divisor: u16) {
        if divisor == 0 {
            return;
        }
        let dividend = dividend as i16;
        let divisor = divisor as i16;
        self.regs.write(Register::R0, dividend.wrapping_div(divisor) as u16);
        self.regs.write(Register::R1, dividend.wrapping_rem(divisor) as u16);
    }

    /// Byte offset of the next instruction in the current buffer.
    pub fn offset(&self) -> usize {
        self.pc
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    /// Check if the CPU has halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if a fatal error aborted the run.
    pub fn is_aborted(&self) -> bool {
        self.state == CpuState::Aborted
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("fault at offset {offset}: {source}")]
    Fault { offset: usize, source: DecodeError },
}
