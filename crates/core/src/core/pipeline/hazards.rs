//! Hazard detection.
//!
//! Pure predicates over the pre-tick latch snapshot. The stage driver
//! evaluates these before any latch is overwritten and turns them into
//! stall or bubble decisions. Two rules hold everywhere: a producer that is
//! a NOP, squashed, or idle never causes a hazard, and `rd == 0` never
//! causes a hazard (the architectural zero register).

use crate::core::pipeline::latches::StageLatch;
use crate::isa::Instruction;

/// Whether `producer` produces a value that `src_reg` consumers must see.
///
/// Matches the forwarding definition: the producer writes a non-zero `rd`
/// equal to `src_reg`. NOPs never write, so bubbles and squashed slots are
/// excluded without an explicit status check.
pub fn writes_to(producer: &Instruction, src_reg: usize) -> bool {
    producer.writes_rd && producer.rd != 0 && producer.rd == src_reg
}

/// Load-use stall: the instruction in EX is a load whose result the
/// instruction in ID needs next cycle.
///
/// Triggers when EX is an active load writing a non-zero `rd` and ID reads
/// that register as `rs1`, or as `rs2` while ID is not a store. The
/// load-to-store-data pair (the load's result feeding only a store's data
/// operand) is exempt; it is repaired by forwarding at the memory stage.
pub fn load_use_stall(ex: &StageLatch, id: &StageLatch) -> bool {
    if !ex.is_active() || !ex.inst.reads_mem || ex.inst.rd == 0 {
        return false;
    }
    let hazard_rs1 = id.inst.reads_rs1 && ex.inst.rd == id.inst.rs1;
    let hazard_rs2 = id.inst.reads_rs2 && ex.inst.rd == id.inst.rs2;
    if !(hazard_rs1 || hazard_rs2) {
        return false;
    }
    let only_store_data = !hazard_rs1 && hazard_rs2 && id.inst.writes_mem;
    !only_store_data
}

/// Arith-branch stall: a branch or JALR in ID needs an ALU result still in
/// EX. The value exists only after execute runs, so decode cannot resolve
/// the branch this cycle.
pub fn arith_branch_stall(ex: &StageLatch, id: &StageLatch) -> bool {
    if !ex.is_active() || ex.inst.reads_mem || ex.inst.rd == 0 || !ex.inst.writes_rd {
        return false;
    }
    if !id.inst.is_branch_or_jalr() {
        return false;
    }
    (id.inst.reads_rs1 && id.inst.rs1 == ex.inst.rd)
        || (id.inst.reads_rs2 && id.inst.rs2 == ex.inst.rd)
}

/// Load-branch stall: a branch or JALR in ID needs a value still being
/// loaded in MEM.
pub fn load_branch_stall(mem: &StageLatch, id: &StageLatch) -> bool {
    if !mem.is_active() || !mem.inst.reads_mem || !mem.inst.writes_rd || mem.inst.rd == 0 {
        return false;
    }
    if !id.inst.is_branch_or_jalr() {
        return false;
    }
    (id.inst.reads_rs1 && id.inst.rs1 == mem.inst.rd)
        || (id.inst.reads_rs2 && id.inst.rs2 == mem.inst.rd)
}

/// Branch stall at decode time: the freshly decoded branch/JALR has an
/// operand that cannot be forwarded this cycle.
///
/// Two producers block resolution: the instruction that just entered EX
/// (its result does not exist until execute finishes), and a load that just
/// entered MEM (its data arrives at end of cycle, too late for decode).
/// Both latch arguments are the post-update values of this tick.
pub fn branch_operand_stall(decoded: &Instruction, ex: &StageLatch, mem: &StageLatch) -> bool {
    debug_assert!(decoded.is_branch_or_jalr());
    let needs = |src: usize, reads: bool| -> bool {
        if !reads {
            return false;
        }
        if writes_to(&ex.inst, src) && ex.is_active() {
            return true;
        }
        writes_to(&mem.inst, src) && mem.is_active() && mem.inst.reads_mem
    };
    needs(decoded.rs1, decoded.reads_rs1) || needs(decoded.rs2, decoded.reads_rs2)
}
