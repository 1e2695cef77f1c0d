//! Stall behavior through the full pipeline.
//!
//! Runs small programs through the controller with the real executor and
//! checks stall accounting, commit counts, and forwarded results.

use crate::common::encode;
use crate::common::harness::TestContext;
use rvpipe_core::core::pipeline::latches::StageStatus;

// ══════════════════════════════════════════════════════════
// 1. Load-use
// ══════════════════════════════════════════════════════════

/// `lw x2 <- [x1]; add x3 = x2 + x4; add x5 = x3 + x6`
///
/// One load-use stall; the first add sees the loaded value through
/// forwarding after one bubble; everything commits exactly once.
#[test]
fn load_use_stalls_once_and_forwards() {
    let mut ctx = TestContext::new().load_program(&[
        encode::lw(2, 1, 0),
        encode::add(3, 2, 4),
        encode::add(5, 3, 6),
        encode::halt(),
        encode::nop(),
        encode::nop(),
        encode::nop(),
    ]);
    ctx.set_reg(1, 0x100);
    ctx.set_reg(4, 5);
    ctx.set_reg(6, 7);
    ctx.write_mem_u32(0x100, 42);

    ctx.run_till_halt(100);

    let stats = ctx.stats();
    assert_eq!(stats.load_use_stalls, 1, "exactly one load-use stall");
    assert_eq!(stats.committed, 4, "lw, two adds, halt");
    assert_eq!(ctx.get_reg(3), 47, "add must see the forwarded load");
    assert_eq!(ctx.get_reg(5), 54);
    assert_eq!(stats.dc_misses, 1, "cold load misses once");
    assert_eq!(stats.dc_hits, 0);
    assert_eq!(stats.cycles, 11);
}

/// Back-to-back dependent ALU work needs no stall at all; forwarding
/// covers EX-to-EX distance.
#[test]
fn alu_chain_never_stalls() {
    let mut ctx = TestContext::new().load_program(&[
        encode::addi(1, 0, 10),
        encode::add(2, 1, 1),
        encode::add(3, 2, 1),
        encode::halt(),
        encode::nop(),
        encode::nop(),
    ]);

    ctx.run_till_halt(100);

    let stats = ctx.stats();
    assert_eq!(stats.load_use_stalls, 0);
    assert_eq!(stats.committed, 4);
    assert_eq!(ctx.get_reg(2), 20);
    assert_eq!(ctx.get_reg(3), 30);
}

// ══════════════════════════════════════════════════════════
// 2. Load to store-data
// ══════════════════════════════════════════════════════════

/// `lw x2 <- [x1]; sw x2 -> [x5]`
///
/// No stall: the store issues behind the load and picks the value up via
/// writeback-to-MEM forwarding, even though the load missed in the
/// D-cache.
#[test]
fn load_store_data_pair_does_not_stall() {
    let mut ctx = TestContext::new().load_program(&[
        encode::lw(2, 1, 0),
        encode::sw(2, 5, 0),
        encode::halt(),
        encode::nop(),
        encode::nop(),
        encode::nop(),
    ]);
    ctx.set_reg(1, 0x100);
    ctx.set_reg(5, 0x200);
    ctx.write_mem_u32(0x100, 99);

    ctx.run_till_halt(100);

    let stats = ctx.stats();
    assert_eq!(stats.load_use_stalls, 0, "store-data pair must not stall");
    assert_eq!(stats.committed, 3, "lw, sw, halt");
    assert_eq!(ctx.read_mem_u32(0x200), 99, "store must write the loaded value");
    assert_eq!(stats.dc_misses, 2, "both accesses are cold");
}

/// Same pair where the load's value feeds the store's address register:
/// that is an address dependency and must stall.
#[test]
fn load_store_address_pair_stalls() {
    let mut ctx = TestContext::new().load_program(&[
        encode::lw(2, 1, 0),
        encode::sw(3, 2, 0),
        encode::halt(),
        encode::nop(),
        encode::nop(),
        encode::nop(),
    ]);
    ctx.set_reg(1, 0x100);
    ctx.set_reg(3, 0x5A);
    ctx.write_mem_u32(0x100, 0x200);

    ctx.run_till_halt(100);

    let stats = ctx.stats();
    assert_eq!(stats.load_use_stalls, 1);
    assert_eq!(ctx.read_mem_u32(0x200), 0x5A, "store lands at the loaded address");
}

// ══════════════════════════════════════════════════════════
// 3. Branch operand stalls
// ══════════════════════════════════════════════════════════

/// A branch immediately after its ALU producer waits one cycle, then
/// resolves via forwarding from MEM; the taken path is followed.
#[test]
fn arith_branch_waits_one_cycle() {
    let mut ctx = TestContext::new().load_program(&[
        encode::addi(1, 0, 1),
        encode::beq(1, 2, 8), // taken (x1 == x2), over the addi to the halt
        encode::addi(3, 0, 7),
        encode::halt(),
        encode::nop(),
        encode::nop(),
    ]);
    ctx.set_reg(2, 1);

    ctx.run_till_halt(100);

    // x1 == x2 == 1, so the branch is taken over the addi x3.
    assert_eq!(ctx.get_reg(3), 0, "branch target skips the addi");
    let stats = ctx.stats();
    assert_eq!(stats.committed, 3, "addi, branch, halt");
    assert_eq!(stats.load_use_stalls, 0, "ALU producer is not a load stall");
}

/// During a stall cycle the EX slot shows a bubble.
#[test]
fn stall_injects_bubble_into_ex() {
    let mut ctx = TestContext::new().load_program(&[
        encode::lw(2, 1, 0),
        encode::add(3, 2, 4),
        encode::halt(),
        encode::nop(),
        encode::nop(),
        encode::nop(),
    ]);
    ctx.set_reg(1, 0x100);
    ctx.write_mem_u32(0x100, 1);

    let mut saw_bubble_with_held_consumer = false;
    for _ in 0..40 {
        if ctx.tick() == rvpipe_core::RunStatus::Halt {
            break;
        }
        let l = ctx.latches();
        if l.ex_latch.status == StageStatus::Bubble
            && l.id_latch.inst.word == encode::add(3, 2, 4)
        {
            saw_bubble_with_held_consumer = true;
        }
    }
    assert!(
        saw_bubble_with_held_consumer,
        "stall must hold the consumer in ID while EX shows a bubble"
    );
}
