//! CPU emulation for the TY-16 machine.
//!
//! This module implements the complete TY-16 architecture:
//! - eleven 16-bit register slots: R0-R7, SP, BP, and a reserved flags slot
//! - a 15-instruction byte-coded set: moves, wrapping and signed arithmetic,
//!   and an EXIT terminator

pub mod registers;
pub mod decode;
pub mod execute;

pub use registers::{Register, RegisterFile};
pub use decode::{Opcode, Instruction, OperandRole, DecodeError, decode, encode};
pub use execute::{Cpu, CpuState, CpuError};
