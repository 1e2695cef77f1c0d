//! Hazard predicate tests.
//!
//! Builds latch snapshots directly and checks the stall predicates:
//! load-use (with the store-data exemption), arith-branch, load-branch,
//! and decode-time branch operand stalls.

use rvpipe_core::core::pipeline::hazards::{
    arith_branch_stall, branch_operand_stall, load_branch_stall, load_use_stall, writes_to,
};
use rvpipe_core::core::pipeline::latches::{StageLatch, StageStatus};
use rvpipe_core::isa::opcodes::{OP_BRANCH, OP_IMM, OP_JALR, OP_LOAD, OP_STORE};
use rvpipe_core::isa::Instruction;

// ──────────────────────────────────────────────────────────
// Helpers: hand-built latch entries
// ──────────────────────────────────────────────────────────

/// A load writing `rd`, occupying a stage as real work.
fn load_latch(rd: usize) -> StageLatch {
    StageLatch::new(
        Instruction {
            word: 0x1,
            opcode: OP_LOAD,
            rd,
            writes_rd: true,
            reads_mem: true,
            is_legal: true,
            ..Instruction::default()
        },
        StageStatus::Normal,
    )
}

/// An ALU instruction writing `rd`.
fn alu_latch(rd: usize) -> StageLatch {
    StageLatch::new(
        Instruction {
            word: 0x1,
            opcode: OP_IMM,
            rd,
            writes_rd: true,
            is_legal: true,
            ..Instruction::default()
        },
        StageStatus::Normal,
    )
}

/// A consumer reading `rs1`/`rs2`; `store` marks it as a store.
fn consumer_latch(rs1: usize, rs2: usize, store: bool) -> StageLatch {
    StageLatch::new(
        Instruction {
            word: 0x2,
            opcode: if store { OP_STORE } else { OP_IMM },
            rs1,
            rs2,
            reads_rs1: true,
            reads_rs2: true,
            writes_mem: store,
            is_legal: true,
            ..Instruction::default()
        },
        StageStatus::Normal,
    )
}

/// A branch reading `rs1`/`rs2`.
fn branch_inst(rs1: usize, rs2: usize) -> Instruction {
    Instruction {
        word: 0x3,
        opcode: OP_BRANCH,
        rs1,
        rs2,
        reads_rs1: true,
        reads_rs2: true,
        is_legal: true,
        ..Instruction::default()
    }
}

fn branch_latch(rs1: usize, rs2: usize) -> StageLatch {
    StageLatch::new(branch_inst(rs1, rs2), StageStatus::Normal)
}

fn idle() -> StageLatch {
    StageLatch::nop(StageStatus::Idle)
}

// ══════════════════════════════════════════════════════════
// 1. writes_to
// ══════════════════════════════════════════════════════════

#[test]
fn writes_to_matches_producer() {
    let latch = alu_latch(5);
    assert!(writes_to(&latch.inst, 5));
    assert!(!writes_to(&latch.inst, 6));
}

/// The zero register never hazards.
#[test]
fn writes_to_x0_never_matches() {
    let latch = alu_latch(0);
    assert!(!writes_to(&latch.inst, 0));
}

/// NOPs write nothing, so bubbles cannot be producers.
#[test]
fn bubble_never_produces() {
    let bubble = StageLatch::nop(StageStatus::Bubble);
    assert!(!writes_to(&bubble.inst, 0));
    assert!(!load_use_stall(&bubble, &consumer_latch(1, 2, false)));
}

// ══════════════════════════════════════════════════════════
// 2. Load-use
// ══════════════════════════════════════════════════════════

#[test]
fn load_use_on_rs1() {
    assert!(load_use_stall(&load_latch(5), &consumer_latch(5, 0, false)));
}

#[test]
fn load_use_on_rs2() {
    assert!(load_use_stall(&load_latch(7), &consumer_latch(1, 7, false)));
}

#[test]
fn no_load_use_without_dependency() {
    assert!(!load_use_stall(&load_latch(5), &consumer_latch(6, 7, false)));
}

#[test]
fn no_load_use_from_alu_producer() {
    assert!(!load_use_stall(&alu_latch(5), &consumer_latch(5, 0, false)));
}

#[test]
fn no_load_use_for_x0_load() {
    assert!(!load_use_stall(&load_latch(0), &consumer_latch(0, 0, false)));
}

/// Load feeding only a store's data operand does not stall; the value is
/// repaired by forwarding at the memory stage.
#[test]
fn store_data_pair_exempt() {
    assert!(!load_use_stall(&load_latch(2), &consumer_latch(1, 2, true)));
}

/// Load feeding a store's address operand still stalls.
#[test]
fn store_address_pair_stalls() {
    assert!(load_use_stall(&load_latch(2), &consumer_latch(2, 3, true)));
}

/// Load feeding both store operands stalls (the address need dominates).
#[test]
fn store_both_operands_stalls() {
    assert!(load_use_stall(&load_latch(2), &consumer_latch(2, 2, true)));
}

#[test]
fn squashed_load_never_stalls() {
    let mut latch = load_latch(5);
    latch.status = StageStatus::Squashed;
    assert!(!load_use_stall(&latch, &consumer_latch(5, 0, false)));
}

// ══════════════════════════════════════════════════════════
// 3. Arith-branch and load-branch
// ══════════════════════════════════════════════════════════

#[test]
fn arith_branch_stalls_on_ex_producer() {
    assert!(arith_branch_stall(&alu_latch(4), &branch_latch(4, 0)));
}

#[test]
fn arith_branch_ignores_loads() {
    // A load in EX is the load-use detector's problem, not this one's.
    assert!(!arith_branch_stall(&load_latch(4), &branch_latch(4, 0)));
}

#[test]
fn arith_branch_ignores_non_branches() {
    assert!(!arith_branch_stall(&alu_latch(4), &consumer_latch(4, 0, false)));
}

#[test]
fn load_branch_stalls_on_mem_load() {
    assert!(load_branch_stall(&load_latch(9), &branch_latch(0, 9)));
}

#[test]
fn load_branch_ignores_alu_in_mem() {
    assert!(!load_branch_stall(&alu_latch(9), &branch_latch(0, 9)));
}

// ══════════════════════════════════════════════════════════
// 4. Branch operand stall at decode
// ══════════════════════════════════════════════════════════

#[test]
fn branch_stalls_when_producer_just_entered_ex() {
    let decoded = branch_inst(3, 0);
    assert!(branch_operand_stall(&decoded, &alu_latch(3), &idle()));
}

#[test]
fn branch_stalls_when_load_just_entered_mem() {
    let decoded = branch_inst(0, 6);
    assert!(branch_operand_stall(&decoded, &idle(), &load_latch(6)));
}

/// An ALU result already in MEM is forwardable, so no stall.
#[test]
fn branch_proceeds_on_forwardable_mem_producer() {
    let decoded = branch_inst(3, 0);
    assert!(!branch_operand_stall(&decoded, &idle(), &alu_latch(3)));
}

#[test]
fn jalr_uses_same_stall_rules() {
    let decoded = Instruction {
        word: 0x4,
        opcode: OP_JALR,
        rs1: 2,
        reads_rs1: true,
        writes_rd: true,
        rd: 1,
        is_legal: true,
        ..Instruction::default()
    };
    assert!(branch_operand_stall(&decoded, &alu_latch(2), &idle()));
    assert!(!branch_operand_stall(&decoded, &idle(), &alu_latch(2)));
}
