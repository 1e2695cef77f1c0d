//! Operand forwarding network.
//!
//! Routes the freshest producer result to a consumer's source operands.
//! Producers are checked in priority order `mem` latch, then `wb` latch,
//! then `done` latch (the retired-one-cycle-ago slot that extends reach by
//! one cycle). The forwarded value is the loaded data when the producer is
//! a load, the ALU/link result otherwise.
//!
//! Forwarding mutates only the local descriptor copy that is about to be
//! handed to the executor; the latch behind the consumer is untouched.
//!
//! Three application points exist:
//! 1. EX entry - both operands of the instruction leaving decode.
//! 2. ID - branch/JALR operands, so decode can resolve the target.
//! 3. MEM entry - a store's data operand (`rs2`), from `wb`/`done` only.
//!    This is what lets a load-to-store-data pair run without a stall:
//!    the store may issue while the load is still missing in the data
//!    cache, and picks the loaded value up here once the load retires.

use crate::core::pipeline::hazards::writes_to;
use crate::core::pipeline::latches::StageLatch;
use crate::isa::Instruction;

/// Resolves one source operand against the producer chain.
///
/// Returns the forwarded value, or `None` when no producer matches and the
/// register-file value already in the descriptor stands.
fn forward_source(src_reg: usize, producers: &[&StageLatch]) -> Option<u64> {
    for latch in producers {
        if writes_to(&latch.inst, src_reg) {
            return Some(latch.inst.result_value());
        }
    }
    None
}

/// Forwards both operands of `consumer` from the standard producer chain.
///
/// Used at EX entry for the instruction leaving decode, and in decode for
/// branch/JALR operand resolution. `mem`, `wb`, and `done` are the
/// post-update latches of the current tick, freshest first.
pub fn forward_operands(
    consumer: &mut Instruction,
    mem: &StageLatch,
    wb: &StageLatch,
    done: &StageLatch,
) {
    let chain = [mem, wb, done];
    if consumer.reads_rs1 {
        if let Some(val) = forward_source(consumer.rs1, &chain) {
            consumer.op1_val = val;
        }
    }
    if consumer.reads_rs2 {
        if let Some(val) = forward_source(consumer.rs2, &chain) {
            consumer.op2_val = val;
        }
    }
}

/// Repairs a store's data operand at MEM entry.
///
/// The producer chain here is `wb` then `done`; the instruction ahead of
/// the store has already left MEM by the time the store arrives. Non-store
/// instructions are left alone.
pub fn forward_store_data(consumer: &mut Instruction, wb: &StageLatch, done: &StageLatch) {
    if !consumer.writes_mem || !consumer.reads_rs2 {
        return;
    }
    if let Some(val) = forward_source(consumer.rs2, &[wb, done]) {
        consumer.op2_val = val;
    }
}
