//! The instruction descriptor carried through the pipeline.
//!
//! One `Instruction` value flows from fetch to writeback, with each stage
//! of the executor filling in more fields. The pipeline controller treats
//! it as opaque data except for the hazard-relevant fields (register
//! indices, read/write flags) and the control fields (`next_pc`,
//! `is_legal`, `is_halt`, `mem_exception`).
//!
//! Display status is deliberately not part of the descriptor; it belongs
//! to the pipeline latch holding it.

use crate::common::constants::NOP_ENCODING;

/// Descriptor for one dynamic instruction.
///
/// Produced by `sim_if`, progressively populated by the later executor
/// stages, and consumed by the pipeline controller for hazard detection,
/// forwarding, and display.
#[derive(Clone, Debug, Default)]
pub struct Instruction {
    /// Raw 32-bit instruction word.
    pub word: u32,
    /// Address this instruction was fetched from.
    pub pc: u64,
    /// Major opcode (bits 0-6 of the word).
    pub opcode: u32,
    /// First source register index.
    pub rs1: usize,
    /// Second source register index.
    pub rs2: usize,
    /// Destination register index.
    pub rd: usize,
    /// Sign-extended immediate.
    pub imm: i64,
    /// Value of the first source operand (possibly forwarded).
    pub op1_val: u64,
    /// Value of the second source operand (possibly forwarded).
    pub op2_val: u64,
    /// ALU result, or link value for JAL/JALR.
    pub arith_result: u64,
    /// Value loaded from memory (loads only).
    pub mem_result: u64,
    /// Effective address for loads and stores.
    pub mem_address: u64,
    /// Address of the next instruction in program order.
    pub next_pc: u64,

    /// Whether the instruction reads `rs1`.
    pub reads_rs1: bool,
    /// Whether the instruction reads `rs2`.
    pub reads_rs2: bool,
    /// Whether the instruction writes `rd`.
    pub writes_rd: bool,
    /// Whether the instruction loads from memory.
    pub reads_mem: bool,
    /// Whether the instruction stores to memory.
    pub writes_mem: bool,
    /// Whether this is a NOP (architectural or pipeline-injected).
    pub is_nop: bool,
    /// Whether this is the halt marker.
    pub is_halt: bool,
    /// Whether the encoding decoded to a known instruction.
    pub is_legal: bool,
    /// Whether the memory stage faulted on this instruction.
    pub mem_exception: bool,
}

impl Instruction {
    /// Creates a NOP descriptor.
    ///
    /// Bubbles and squashed slots carry this value so every latch always
    /// holds a well-formed instruction word.
    pub fn nop() -> Self {
        Self {
            word: NOP_ENCODING,
            is_nop: true,
            is_legal: true,
            ..Self::default()
        }
    }

    /// Creates a NOP descriptor pinned to a fetch address.
    ///
    /// Used for the IF placeholder that reserves the slot while an
    /// instruction-cache miss is outstanding.
    pub fn nop_at(pc: u64) -> Self {
        Self {
            pc,
            ..Self::nop()
        }
    }

    /// Whether this instruction resolves its target in decode
    /// (conditional branch or JALR).
    pub fn is_branch_or_jalr(&self) -> bool {
        use crate::isa::opcodes::{OP_BRANCH, OP_JALR};
        self.opcode == OP_BRANCH || self.opcode == OP_JALR
    }

    /// Whether this instruction touches the data cache.
    pub fn accesses_memory(&self) -> bool {
        self.reads_mem || self.writes_mem
    }

    /// The value this instruction produces for consumers: the loaded data
    /// for loads, the ALU/link result otherwise.
    pub fn result_value(&self) -> u64 {
        if self.reads_mem {
            self.mem_result
        } else {
            self.arith_result
        }
    }
}
