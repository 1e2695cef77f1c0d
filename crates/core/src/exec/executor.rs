//! RV64I executor.
//!
//! Implements the per-stage collaborator contract for the RV64I base
//! integer set. The executor owns the architectural state (register file
//! and memory) and knows nothing about pipeline timing: it computes what
//! each instruction does, while the controller decides when.
//!
//! Decode coverage: LUI, AUIPC, JAL, JALR, the six conditional branches,
//! loads (LB/LH/LW/LD and unsigned variants), stores (SB/SH/SW/SD), and
//! the OP-IMM/OP arithmetic groups. Anything else decodes as illegal and
//! takes the exception redirect path.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::common::constants::{HALT_ENCODING, INSTRUCTION_BYTES, NOP_ENCODING};
use crate::common::reg::RegisterFile;
use crate::config::MemoryConfig;
use crate::exec::memory::MemoryStore;
use crate::exec::InstructionSimulator;
use crate::isa::decode::{imm_b, imm_i, imm_j, imm_s, imm_u, InstructionBits};
use crate::isa::opcodes::{
    self, alu, branch, OP_AUIPC, OP_BRANCH, OP_IMM, OP_JAL, OP_JALR, OP_LOAD, OP_LUI, OP_REG,
    OP_STORE,
};
use crate::isa::Instruction;

/// Number of bytes moved by a load/store, from its funct3 width field.
fn access_bytes(funct3: u32) -> u64 {
    match funct3 & 0x3 {
        0 => 1,
        1 => 2,
        2 => 4,
        _ => 8,
    }
}

/// RV64I executor: register file plus backing memory.
pub struct Rv64Executor {
    regs: RegisterFile,
    mem: MemoryStore,
}

impl Rv64Executor {
    /// Creates an executor with zeroed registers over a fresh memory.
    pub fn new(mem_config: &MemoryConfig) -> Self {
        Self {
            regs: RegisterFile::new(),
            mem: MemoryStore::new(mem_config),
        }
    }

    /// Creates an executor over an existing memory (already loaded with a
    /// program image).
    pub fn with_memory(mem: MemoryStore) -> Self {
        Self {
            regs: RegisterFile::new(),
            mem,
        }
    }

    /// Read access to the register file (test and dump surface).
    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    /// Write access to the register file (program setup).
    pub fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    /// Read access to memory.
    pub fn memory(&self) -> &MemoryStore {
        &self.mem
    }

    /// Write access to memory (program loading).
    pub fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.mem
    }

    /// Writes the register file to `<prefix>_registers.txt`.
    pub fn dump_registers(&self, output_prefix: &str) -> io::Result<()> {
        let path = format!("{}_registers.txt", output_prefix);
        let mut out = BufWriter::new(File::create(path)?);
        let regs = self.regs.dump();
        for (i, pair) in regs.chunks(2).enumerate() {
            writeln!(
                out,
                "x{:<2} = {:#018x}    x{:<2} = {:#018x}",
                i * 2,
                pair[0],
                i * 2 + 1,
                pair[1]
            )?;
        }
        out.flush()
    }

    /// ALU for the OP-IMM and OP groups. `rhs` is the immediate or the
    /// second operand; `alt` selects SUB/SRA encodings.
    fn alu_op(funct3: u32, lhs: u64, rhs: u64, alt: bool) -> u64 {
        match funct3 {
            alu::ADD_SUB => {
                if alt {
                    lhs.wrapping_sub(rhs)
                } else {
                    lhs.wrapping_add(rhs)
                }
            }
            alu::SLL => lhs << (rhs & 0x3F),
            alu::SLT => u64::from((lhs as i64) < (rhs as i64)),
            alu::SLTU => u64::from(lhs < rhs),
            alu::XOR => lhs ^ rhs,
            alu::SRL_SRA => {
                if alt {
                    ((lhs as i64) >> (rhs & 0x3F)) as u64
                } else {
                    lhs >> (rhs & 0x3F)
                }
            }
            alu::OR => lhs | rhs,
            _ => lhs & rhs,
        }
    }

    /// Sign- or zero-extends a loaded value according to the load funct3.
    fn extend_load(funct3: u32, raw: u64) -> u64 {
        match funct3 {
            opcodes::load::LB => raw as u8 as i8 as i64 as u64,
            opcodes::load::LH => raw as u16 as i16 as i64 as u64,
            opcodes::load::LW => raw as u32 as i32 as i64 as u64,
            _ => raw,
        }
    }
}

impl InstructionSimulator for Rv64Executor {
    fn sim_if(&mut self, pc: u64) -> Instruction {
        Instruction {
            word: self.mem.fetch_word(pc),
            pc,
            ..Instruction::default()
        }
    }

    fn sim_id(&mut self, inst: Instruction) -> Instruction {
        let word = inst.word;
        let mut out = Instruction {
            word,
            pc: inst.pc,
            opcode: word.opcode(),
            next_pc: inst.pc.wrapping_add(INSTRUCTION_BYTES),
            ..Instruction::default()
        };

        if word == HALT_ENCODING {
            out.is_halt = true;
            out.is_legal = true;
            return out;
        }

        out.rd = word.rd();
        out.rs1 = word.rs1();
        out.rs2 = word.rs2();
        out.is_legal = true;

        match out.opcode {
            OP_LUI => {
                out.imm = imm_u(word);
                out.writes_rd = true;
            }
            OP_AUIPC => {
                out.imm = imm_u(word);
                out.writes_rd = true;
            }
            OP_JAL => {
                out.imm = imm_j(word);
                out.writes_rd = true;
                // Target depends only on the PC; resolved at decode.
                out.next_pc = inst.pc.wrapping_add(out.imm as u64);
            }
            OP_JALR => {
                out.imm = imm_i(word);
                out.reads_rs1 = true;
                out.writes_rd = true;
            }
            OP_BRANCH => {
                out.imm = imm_b(word);
                out.reads_rs1 = true;
                out.reads_rs2 = true;
            }
            OP_LOAD => {
                out.imm = imm_i(word);
                out.reads_rs1 = true;
                out.writes_rd = true;
                out.reads_mem = true;
                if word.funct3() == 0b111 {
                    out.is_legal = false;
                }
            }
            OP_STORE => {
                out.imm = imm_s(word);
                out.reads_rs1 = true;
                out.reads_rs2 = true;
                out.writes_mem = true;
                if word.funct3() > opcodes::store::SD {
                    out.is_legal = false;
                }
            }
            OP_IMM => {
                out.imm = imm_i(word);
                out.reads_rs1 = true;
                out.writes_rd = true;
                if word == NOP_ENCODING {
                    out.is_nop = true;
                }
            }
            OP_REG => {
                out.reads_rs1 = true;
                out.reads_rs2 = true;
                out.writes_rd = true;
                let f7 = word.funct7();
                if f7 != opcodes::FUNCT7_BASE && f7 != opcodes::FUNCT7_ALT {
                    out.is_legal = false;
                }
            }
            _ => {
                out.is_legal = false;
            }
        }

        if !out.is_legal {
            out.reads_rs1 = false;
            out.reads_rs2 = false;
            out.writes_rd = false;
            out.reads_mem = false;
            out.writes_mem = false;
            return out;
        }

        if out.reads_rs1 {
            out.op1_val = self.regs.read(out.rs1);
        }
        if out.reads_rs2 {
            out.op2_val = self.regs.read(out.rs2);
        }
        out
    }

    fn sim_next_pc(&mut self, mut inst: Instruction) -> Instruction {
        match inst.opcode {
            OP_BRANCH => {
                let lhs = inst.op1_val;
                let rhs = inst.op2_val;
                let taken = match inst.word.funct3() {
                    branch::BEQ => lhs == rhs,
                    branch::BNE => lhs != rhs,
                    branch::BLT => (lhs as i64) < (rhs as i64),
                    branch::BGE => (lhs as i64) >= (rhs as i64),
                    branch::BLTU => lhs < rhs,
                    branch::BGEU => lhs >= rhs,
                    _ => false,
                };
                inst.next_pc = if taken {
                    inst.pc.wrapping_add(inst.imm as u64)
                } else {
                    inst.pc.wrapping_add(INSTRUCTION_BYTES)
                };
            }
            OP_JALR => {
                inst.next_pc = inst.op1_val.wrapping_add(inst.imm as u64) & !1;
            }
            _ => {}
        }
        inst
    }

    fn sim_ex(&mut self, mut inst: Instruction) -> Instruction {
        match inst.opcode {
            OP_LUI => inst.arith_result = inst.imm as u64,
            OP_AUIPC => inst.arith_result = inst.pc.wrapping_add(inst.imm as u64),
            OP_JAL | OP_JALR => {
                inst.arith_result = inst.pc.wrapping_add(INSTRUCTION_BYTES);
            }
            OP_LOAD | OP_STORE => {
                inst.mem_address = inst.op1_val.wrapping_add(inst.imm as u64);
            }
            OP_IMM => {
                let alt = inst.word.funct3() == alu::SRL_SRA
                    && (inst.word >> 30) & 1 == 1;
                inst.arith_result =
                    Self::alu_op(inst.word.funct3(), inst.op1_val, inst.imm as u64, alt);
            }
            OP_REG => {
                let alt = inst.word.funct7() == opcodes::FUNCT7_ALT;
                inst.arith_result =
                    Self::alu_op(inst.word.funct3(), inst.op1_val, inst.op2_val, alt);
            }
            _ => {}
        }
        inst
    }

    fn sim_mem(&mut self, mut inst: Instruction) -> Instruction {
        if inst.reads_mem {
            let bytes = access_bytes(inst.word.funct3());
            match self.mem.read(inst.mem_address, bytes) {
                Some(raw) => {
                    inst.mem_result = Self::extend_load(inst.word.funct3(), raw);
                }
                None => inst.mem_exception = true,
            }
        } else if inst.writes_mem {
            let bytes = access_bytes(inst.word.funct3());
            if !self.mem.write(inst.mem_address, bytes, inst.op2_val) {
                inst.mem_exception = true;
            }
        }
        inst
    }

    fn sim_wb(&mut self, mut inst: Instruction) -> Instruction {
        if inst.word == HALT_ENCODING {
            inst.is_halt = true;
        }
        if inst.writes_rd && inst.is_legal && !inst.is_nop && !inst.mem_exception {
            self.regs.write(inst.rd, inst.result_value());
        }
        inst
    }
}

/// Builds an executor with a program image placed at address zero.
///
/// Convenience for the CLI and tests; equivalent to constructing the
/// memory, loading the image, and wrapping it.
pub fn executor_with_program(mem_config: &MemoryConfig, image: &[u8]) -> Rv64Executor {
    let mut mem = MemoryStore::new(mem_config);
    mem.load_image(0, image);
    Rv64Executor::with_memory(mem)
}
