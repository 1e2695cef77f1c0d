//! Global simulator constants.
//!
//! This module defines the fixed encodings and addresses the pipeline
//! depends on. It includes:
//! 1. **Instruction Constants:** The canonical NOP and the halt marker.
//! 2. **Exception Constants:** The fixed exception handler address.
//! 3. **Field Constants:** Masks and shifts for instruction field extraction.

/// Canonical NOP encoding (`addi x0, x0, 0`).
///
/// Bubbles injected by the pipeline carry this encoding so the per-cycle
/// dump shows a well-formed instruction word in stalled slots.
pub const NOP_ENCODING: u32 = 0x0000_0013;

/// Halt marker word.
///
/// Not a real RISC-V instruction; the writeback stage recognizes this raw
/// word and ends the simulation once it retires.
pub const HALT_ENCODING: u32 = 0xfeed_feed;

/// Fixed exception handler address.
///
/// Illegal instructions and memory faults redirect fetch here one cycle
/// after the faulting instruction is displayed.
pub const EXCEPTION_HANDLER_PC: u64 = 0x8000;

/// Size of one instruction in bytes. The pipeline fetches word-aligned
/// 32-bit instructions only.
pub const INSTRUCTION_BYTES: u64 = 4;

/// Bit mask for extracting the opcode field (bits 0-6).
pub const OPCODE_MASK: u32 = 0x7F;

/// Bit mask for a 5-bit register index field.
pub const REG_MASK: u32 = 0x1F;

/// Bit position of the destination register (rd) field.
pub const RD_SHIFT: u32 = 7;

/// Bit position of the first source register (rs1) field.
pub const RS1_SHIFT: u32 = 15;

/// Bit position of the second source register (rs2) field.
pub const RS2_SHIFT: u32 = 20;

/// Bit mask for the funct3 field (bits 12-14).
pub const FUNCT3_MASK: u32 = 0x7;

/// Bit position of the funct3 field.
pub const FUNCT3_SHIFT: u32 = 12;

/// Bit mask for the funct7 field (bits 25-31).
pub const FUNCT7_MASK: u32 = 0x7F;

/// Bit position of the funct7 field.
pub const FUNCT7_SHIFT: u32 = 25;

/// Number of integer registers in the architectural register file.
pub const NUM_REGISTERS: usize = 32;
