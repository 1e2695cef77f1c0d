//! Pipeline latch structures.
//!
//! Five stage latches carry one instruction descriptor each between ticks,
//! paired with a display status. The status describes how the slot should
//! be printed, not what the instruction means; keeping it on the latch
//! rather than the descriptor separates "what instruction is here" from
//! "how to show it".

use crate::isa::Instruction;

/// Display status of a pipeline slot for the per-cycle dump.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageStatus {
    /// Real work, including HALT and illegal instructions on the cycle
    /// they are displayed.
    Normal,
    /// A stall-injected NOP.
    Bubble,
    /// A flushed or wrong-path instruction that must not retire.
    Squashed,
    /// The stage has never held real work since reset.
    Idle,
    /// Fetched past an unresolved branch. Part of the display vocabulary
    /// for the dump format; single-cycle branch resolution means the
    /// current controller has no cycle on which to emit it.
    Speculative,
}

impl StageStatus {
    /// Single-letter code used in the per-cycle dump.
    pub fn code(&self) -> char {
        match self {
            StageStatus::Normal => 'N',
            StageStatus::Bubble => 'B',
            StageStatus::Squashed => 'X',
            StageStatus::Idle => 'I',
            StageStatus::Speculative => 'S',
        }
    }
}

/// One stage latch: an instruction descriptor plus its display status.
#[derive(Clone, Debug)]
pub struct StageLatch {
    /// The instruction occupying the stage.
    pub inst: Instruction,
    /// How the slot is displayed this cycle.
    pub status: StageStatus,
}

impl StageLatch {
    /// A NOP latch with the given status.
    pub fn nop(status: StageStatus) -> Self {
        Self {
            inst: Instruction::nop(),
            status,
        }
    }

    /// A NOP latch pinned to a fetch address, used for the IF placeholder
    /// while an instruction-cache miss is outstanding.
    pub fn nop_at(pc: u64, status: StageStatus) -> Self {
        Self {
            inst: Instruction::nop_at(pc),
            status,
        }
    }

    /// A real instruction with the given status.
    pub fn new(inst: Instruction, status: StageStatus) -> Self {
        Self { inst, status }
    }

    /// Whether this latch can act as a forwarding producer or hazard
    /// source. Bubbles, squashed slots, and idle slots never do.
    pub fn is_active(&self) -> bool {
        !self.inst.is_nop
            && !matches!(self.status, StageStatus::Squashed | StageStatus::Idle)
    }
}

impl Default for StageLatch {
    /// Latches reset to idle NOPs.
    fn default() -> Self {
        Self::nop(StageStatus::Idle)
    }
}

/// The five stage latches plus the retired-instruction latch.
///
/// `done` holds the previously retired instruction for one extra cycle,
/// extending forwarding reach by one slot past writeback.
#[derive(Clone, Debug, Default)]
pub struct PipelineLatches {
    /// Fetch output.
    pub if_latch: StageLatch,
    /// Decode output.
    pub id_latch: StageLatch,
    /// Execute output.
    pub ex_latch: StageLatch,
    /// Memory output.
    pub mem_latch: StageLatch,
    /// Writeback output.
    pub wb_latch: StageLatch,
    /// Last retired instruction, one cycle stale.
    pub done_latch: StageLatch,
}
