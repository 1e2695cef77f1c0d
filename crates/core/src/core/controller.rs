//! The pipeline controller.
//!
//! One `PipelineController` value owns everything with per-cycle timing:
//! the five stage latches, the PC, both caches and their in-flight miss
//! state, the exception redirect queue, and the statistics counters. The
//! executor behind `InstructionSimulator` owns the architectural state and
//! is driven stage by stage from here.
//!
//! A tick updates stages latest-first (WB, MEM, EX, ID, IF). Each stage
//! therefore reads the pre-tick value of the latch it consumes and the
//! freshly written values of later-stage latches, which is exactly the
//! one-cycle pipeline register behavior; reordering the updates produces
//! one-cycle-off forwarding bugs.

use crate::common::constants::{EXCEPTION_HANDLER_PC, INSTRUCTION_BYTES};
use crate::common::error::{RunStatus, SimError};
use crate::config::SimConfig;
use crate::core::pipeline::forward;
use crate::core::pipeline::hazards;
use crate::core::pipeline::latches::{PipelineLatches, StageLatch, StageStatus};
use crate::core::units::cache::{Cache, CacheKind, CacheOp};
use crate::exec::InstructionSimulator;
use crate::isa::Instruction;
use crate::output::{PipeState, PipeStateWriter};
use crate::stats::SimStats;

/// Cycle-accurate five-stage pipeline controller.
pub struct PipelineController<S: InstructionSimulator> {
    sim: S,
    i_cache: Cache,
    d_cache: Cache,
    latches: PipelineLatches,

    /// Next fetch address.
    pc: u64,
    /// Remaining penalty cycles of an in-flight I-cache miss.
    i_miss_remaining: u64,
    /// Whether an I-cache miss is waiting to resolve.
    i_miss_active: bool,
    /// Remaining penalty cycles of an in-flight D-cache miss.
    d_miss_remaining: u64,
    /// Whether a D-cache miss is waiting to resolve.
    d_miss_active: bool,
    /// The memory instruction held in MEM while its miss is outstanding.
    latched_mem_inst: Instruction,
    /// One-slot exception redirect queue.
    pending_flush: bool,
    pending_flush_pc: u64,

    stats: SimStats,
    trace: bool,
    writer: Option<PipeStateWriter>,
}

impl<S: InstructionSimulator> PipelineController<S> {
    /// Builds a controller over a validated configuration and an executor.
    pub fn new(config: &SimConfig, sim: S) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            sim,
            i_cache: Cache::new(config.i_cache, CacheKind::Instruction),
            d_cache: Cache::new(config.d_cache, CacheKind::Data),
            latches: PipelineLatches::default(),
            pc: 0,
            i_miss_remaining: 0,
            i_miss_active: false,
            d_miss_remaining: 0,
            d_miss_active: false,
            latched_mem_inst: Instruction::nop(),
            pending_flush: false,
            pending_flush_pc: 0,
            stats: SimStats::default(),
            trace: false,
            writer: None,
        })
    }

    /// Enables per-cycle diagnostics on stderr.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Attaches the per-cycle pipeline dump writer.
    pub fn attach_writer(&mut self, output_prefix: &str) -> Result<(), SimError> {
        self.writer = Some(PipeStateWriter::new(output_prefix)?);
        Ok(())
    }

    /// The executor collaborator.
    pub fn simulator(&self) -> &S {
        &self.sim
    }

    /// Mutable access to the executor (program setup in tests and the CLI).
    pub fn simulator_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    /// Current latch contents.
    pub fn latches(&self) -> &PipelineLatches {
        &self.latches
    }

    /// Next fetch address.
    pub fn pc(&self) -> u64 {
        self.pc
    }

    /// The instruction cache.
    pub fn i_cache(&self) -> &Cache {
        &self.i_cache
    }

    /// The data cache.
    pub fn d_cache(&self) -> &Cache {
        &self.d_cache
    }

    /// Statistics with the cache counters filled in.
    pub fn stats(&self) -> SimStats {
        SimStats {
            ic_hits: self.i_cache.hits(),
            ic_misses: self.i_cache.misses(),
            dc_hits: self.d_cache.hits(),
            dc_misses: self.d_cache.misses(),
            ..self.stats
        }
    }

    /// Maps a stage result onto a latch, carrying the source slot's
    /// display status forward. Idle and squashed slots stay empty nops;
    /// stall-injected bubbles stay bubbles; everything else is real work,
    /// architectural NOPs included.
    fn passthrough(source: &StageLatch, result: Instruction) -> StageLatch {
        match source.status {
            StageStatus::Idle => StageLatch::nop(StageStatus::Idle),
            StageStatus::Squashed => StageLatch::nop(StageStatus::Squashed),
            StageStatus::Bubble => StageLatch::new(result, StageStatus::Bubble),
            _ => StageLatch::new(result, StageStatus::Normal),
        }
    }

    /// Advances the machine by one cycle.
    ///
    /// Returns `Halt` on the cycle the halt marker retires; dump I/O
    /// failures are terminal.
    pub fn tick(&mut self) -> Result<RunStatus, SimError> {
        let cycle = self.stats.cycles;
        self.stats.cycles += 1;

        // Pending exception redirect from the previous cycle. The faulting
        // instruction was already displayed; now the wrong-path work in
        // IF/ID is squashed and fetch restarts at the handler.
        let apply_flush = self.pending_flush;
        self.pending_flush = false;
        if apply_flush {
            self.pc = self.pending_flush_pc;
            self.i_miss_remaining = 0;
        }

        // Hazard detection against the pre-tick latches.
        let id_snap = self.latches.id_latch.clone();
        let ex_snap = self.latches.ex_latch.clone();
        let mem_snap = self.latches.mem_latch.clone();

        let load_use = hazards::load_use_stall(&ex_snap, &id_snap);
        let stall = load_use
            || hazards::arith_branch_stall(&ex_snap, &id_snap)
            || hazards::load_branch_stall(&mem_snap, &id_snap);
        let mem_stall = self.d_miss_active;
        let mut branch_stall = false;
        let mut flush = false;

        // PC of the slot IF would fetch next, captured before any redirect
        // so a squashed wrong-path slot displays its own address.
        let speculative_pc = self.pc;

        let mut halted = false;

        // ==== WB ====
        let prev_mem = self.latches.mem_latch.clone();
        if mem_stall {
            // The pipeline is frozen behind the D-miss; nothing retires.
            self.latches.wb_latch = StageLatch::nop(StageStatus::Bubble);
        } else {
            let result = self.sim.sim_wb(prev_mem.inst.clone());
            self.latches.wb_latch = Self::passthrough(&prev_mem, result);
            // Every Normal-status retirement commits, architectural NOPs
            // included; bubbles, squashed, and idle slots never do.
            let retired = &self.latches.wb_latch.inst;
            if self.latches.wb_latch.status == StageStatus::Normal && retired.is_legal {
                self.stats.committed += 1;
            }
            if retired.is_halt {
                halted = true;
            }
        }

        // ==== MEM ====
        let prev_ex = self.latches.ex_latch.clone();
        if self.d_miss_active {
            if self.d_miss_remaining > 0 {
                self.d_miss_remaining -= 1;
            }
            if self.d_miss_remaining == 0 {
                let result = self.sim.sim_mem(self.latched_mem_inst.clone());
                let status = if result.is_nop {
                    StageStatus::Bubble
                } else {
                    StageStatus::Normal
                };
                self.latches.mem_latch = StageLatch::new(result, status);
                self.d_miss_active = false;
            } else {
                self.latches.mem_latch =
                    StageLatch::new(self.latched_mem_inst.clone(), StageStatus::Normal);
            }
        } else if prev_ex.is_active() && prev_ex.inst.accesses_memory() {
            let op = if prev_ex.inst.reads_mem {
                CacheOp::Read
            } else {
                CacheOp::Write
            };
            let mut inst = prev_ex.inst.clone();
            forward::forward_store_data(&mut inst, &self.latches.wb_latch, &self.latches.done_latch);
            if self
                .d_cache
                .access(inst.mem_address, op)
                .is_hit()
            {
                let result = self.sim.sim_mem(inst);
                self.latches.mem_latch = Self::passthrough(&prev_ex, result);
            } else {
                // Detection cycle: latch the access and start the penalty.
                // EX and younger stages are not held until next cycle.
                self.latched_mem_inst = inst;
                self.d_miss_remaining = self.d_cache.config().miss_latency;
                self.d_miss_active = true;
                self.latches.mem_latch =
                    StageLatch::new(self.latched_mem_inst.clone(), StageStatus::Normal);
            }
        } else {
            let result = self.sim.sim_mem(prev_ex.inst.clone());
            self.latches.mem_latch = Self::passthrough(&prev_ex, result);
        }

        // ==== EX ====
        let prev_id = self.latches.id_latch.clone();
        if apply_flush {
            // The instruction in ID was the faulting one; it must not
            // reach execute.
            self.latches.ex_latch = StageLatch::nop(StageStatus::Squashed);
        } else if mem_stall {
            // Hold: the latch keeps the instruction issued on the miss
            // detection cycle.
        } else if stall {
            if load_use {
                self.stats.load_use_stalls += 1;
            }
            self.latches.ex_latch = if prev_id.inst.is_nop && prev_id.status == StageStatus::Idle {
                StageLatch::nop(StageStatus::Idle)
            } else {
                StageLatch::nop(StageStatus::Bubble)
            };
        } else if prev_id.inst.is_nop && prev_id.status != StageStatus::Normal {
            self.latches.ex_latch = match prev_id.status {
                StageStatus::Idle => StageLatch::nop(StageStatus::Idle),
                StageStatus::Squashed => StageLatch::nop(StageStatus::Squashed),
                _ => StageLatch::nop(StageStatus::Bubble),
            };
        } else {
            let mut inst = prev_id.inst.clone();
            forward::forward_operands(
                &mut inst,
                &self.latches.mem_latch,
                &self.latches.wb_latch,
                &self.latches.done_latch,
            );
            let result = self.sim.sim_ex(inst);
            self.latches.ex_latch = StageLatch::new(result, StageStatus::Normal);
        }

        // ==== ID ====
        let prev_if = self.latches.if_latch.clone();
        if apply_flush {
            self.latches.id_latch = StageLatch::nop(StageStatus::Squashed);
        } else if !(stall || mem_stall) {
            // A nop descriptor in IF is pipeline-made (miss placeholder,
            // parked slot, squash); a fetched NOP word is not flagged
            // until decode and takes the real path below.
            if prev_if.inst.is_nop {
                match prev_if.status {
                    // Fetch has nothing (startup, or parked past the
                    // program); keep decode idle until it has seen work,
                    // drain it afterwards.
                    StageStatus::Idle => {
                        if self.latches.id_latch.status != StageStatus::Idle {
                            self.latches.id_latch = StageLatch::nop(StageStatus::Bubble);
                        }
                    }
                    StageStatus::Squashed => {
                        self.latches.id_latch = StageLatch::nop(StageStatus::Squashed);
                    }
                    _ => {
                        self.latches.id_latch = StageLatch::nop(StageStatus::Bubble);
                    }
                }
            } else {
                let mut decoded = self.sim.sim_id(prev_if.inst.clone());
                if !decoded.is_nop && !decoded.is_legal {
                    // Display the illegal word once, then redirect.
                    self.pending_flush = true;
                    self.pending_flush_pc = EXCEPTION_HANDLER_PC;
                    self.latches.id_latch = StageLatch::new(decoded, StageStatus::Normal);
                } else {
                    if decoded.is_branch_or_jalr()
                        && hazards::branch_operand_stall(
                            &decoded,
                            &self.latches.ex_latch,
                            &self.latches.mem_latch,
                        )
                    {
                        branch_stall = true;
                    }

                    if branch_stall {
                        // Stall cycles induced by load producers count into
                        // the load-use statistic.
                        let hazard_on = |latch: &StageLatch| -> bool {
                            latch.is_active()
                                && latch.inst.reads_mem
                                && ((decoded.reads_rs1
                                    && hazards::writes_to(&latch.inst, decoded.rs1))
                                    || (decoded.reads_rs2
                                        && hazards::writes_to(&latch.inst, decoded.rs2)))
                        };
                        if hazard_on(&ex_snap) {
                            self.stats.load_use_stalls += 1;
                        }
                        if hazard_on(&self.latches.mem_latch) {
                            self.stats.load_use_stalls += 1;
                        }
                        self.latches.id_latch = StageLatch::nop(StageStatus::Bubble);
                    } else {
                        if decoded.is_branch_or_jalr() {
                            forward::forward_operands(
                                &mut decoded,
                                &self.latches.mem_latch,
                                &self.latches.wb_latch,
                                &self.latches.done_latch,
                            );
                            decoded = self.sim.sim_next_pc(decoded);
                        }
                        let fall_through = prev_if.inst.pc.wrapping_add(INSTRUCTION_BYTES);
                        let redirect = !decoded.is_halt && decoded.next_pc != fall_through;
                        // Anything decoded from a fetched word is real
                        // work, architectural NOPs included.
                        self.latches.id_latch = StageLatch::new(decoded, StageStatus::Normal);
                        if redirect {
                            // Branch resolved against prediction: redirect
                            // fetch this very cycle.
                            flush = true;
                            self.pc = self.latches.id_latch.inst.next_pc;
                        }
                    }
                }
            }
        }

        // ==== IF ====
        //
        // The streaming front end runs one fetch ahead of decode, so a
        // sequential miss fills its line within the access and still
        // delivers the word the same cycle; only redirects (branch flush,
        // exception redirect) land on a cold slot and wait out the full
        // penalty. A fetch slot past the loaded image (an all-zero word)
        // parks without touching the cache.
        if apply_flush {
            // Restart fetch at the exception handler; a miss there starts
            // the penalty immediately.
            let inst = self.sim.sim_if(self.pc);
            if inst.word == 0 {
                self.i_miss_active = false;
                self.latches.if_latch = StageLatch::nop_at(self.pc, StageStatus::Idle);
            } else if self.i_cache.access(self.pc, CacheOp::Read).is_hit() {
                self.latches.if_latch = StageLatch::new(inst, StageStatus::Normal);
                self.pc = self.pc.wrapping_add(INSTRUCTION_BYTES);
                self.i_miss_active = false;
            } else {
                self.i_miss_remaining = self.i_cache.config().miss_latency;
                self.i_miss_active = true;
                self.latches.if_latch = StageLatch::nop_at(self.pc, StageStatus::Normal);
            }
        } else if stall || branch_stall || mem_stall {
            // IF holds its slot, but an outstanding miss keeps resolving;
            // the fetched word materializes on the next non-stall cycle.
            if self.i_miss_active && self.i_miss_remaining > 0 {
                self.i_miss_remaining -= 1;
                if self.i_miss_remaining == 0 {
                    self.i_miss_active = false;
                }
            }
        } else if flush {
            // Branch misprediction: begin the corrected-path access and
            // squash the wrong-path slot, which keeps its own address.
            if self.i_cache.access(self.pc, CacheOp::Read).is_hit() {
                self.i_miss_active = false;
            } else {
                self.i_miss_remaining = self.i_cache.config().miss_latency;
                self.i_miss_active = true;
            }
            self.latches.if_latch = StageLatch::nop_at(speculative_pc, StageStatus::Squashed);
        } else if self.i_miss_remaining > 0 {
            self.i_miss_remaining -= 1;
            if self.i_miss_remaining == 0 {
                let inst = self.sim.sim_if(self.pc);
                if inst.word == 0 {
                    self.i_miss_active = false;
                    self.latches.if_latch = StageLatch::nop_at(self.pc, StageStatus::Idle);
                } else {
                    self.latches.if_latch = StageLatch::new(inst, StageStatus::Normal);
                    self.pc = self.pc.wrapping_add(INSTRUCTION_BYTES);
                    self.i_miss_active = false;
                }
            } else {
                self.latches.if_latch = StageLatch::nop_at(self.pc, StageStatus::Normal);
            }
        } else {
            let inst = self.sim.sim_if(self.pc);
            if inst.word == 0 {
                // Ran off the end of the program; fetch parks here.
                self.latches.if_latch = StageLatch::nop_at(self.pc, StageStatus::Idle);
            } else {
                // Count the access either way; a sequential miss fills
                // the line without delaying delivery.
                self.i_cache.access(self.pc, CacheOp::Read);
                self.latches.if_latch = StageLatch::new(inst, StageStatus::Normal);
                self.pc = self.pc.wrapping_add(INSTRUCTION_BYTES);
                self.i_miss_active = false;
            }
        }

        // A memory fault observed this cycle redirects next cycle, after
        // the faulting instruction has been displayed in MEM.
        if self.latches.mem_latch.inst.mem_exception {
            self.pending_flush = true;
            self.pending_flush_pc = EXCEPTION_HANDLER_PC;
        }

        self.latches.done_latch = self.latches.wb_latch.clone();

        let state = self.pipe_state(cycle);
        if let Some(writer) = &mut self.writer {
            writer.record(&state)?;
        }
        if self.trace {
            self.print_diagram(&state);
        }

        if halted {
            Ok(RunStatus::Halt)
        } else {
            Ok(RunStatus::Success)
        }
    }

    /// Runs `cycles` ticks, or forever when `cycles == 0`; stops early on
    /// HALT.
    pub fn run_cycles(&mut self, cycles: u64) -> Result<RunStatus, SimError> {
        let mut count = 0;
        while cycles == 0 || count < cycles {
            count += 1;
            if self.tick()? == RunStatus::Halt {
                return Ok(RunStatus::Halt);
            }
        }
        Ok(RunStatus::Success)
    }

    /// Runs single cycles until the halt marker retires.
    pub fn run_till_halt(&mut self) -> Result<RunStatus, SimError> {
        loop {
            if self.run_cycles(1)? == RunStatus::Halt {
                return Ok(RunStatus::Halt);
            }
        }
    }

    /// Writes the final statistics and flushes the per-cycle dump.
    ///
    /// # Returns
    ///
    /// The final statistics, for callers that also print them.
    pub fn finalize(&mut self, output_prefix: &str) -> Result<SimStats, SimError> {
        let stats = self.stats();
        crate::output::write_sim_stats(&stats, output_prefix)?;
        if let Some(writer) = &mut self.writer {
            writer.flush()?;
        }
        Ok(stats)
    }

    /// Snapshot of the latches for the per-cycle dump.
    fn pipe_state(&self, cycle: u64) -> PipeState {
        let l = &self.latches;
        PipeState {
            cycle,
            if_pc: l.if_latch.inst.pc,
            if_status: l.if_latch.status,
            id_word: l.id_latch.inst.word,
            id_status: l.id_latch.status,
            ex_word: l.ex_latch.inst.word,
            ex_status: l.ex_latch.status,
            mem_word: l.mem_latch.inst.word,
            mem_status: l.mem_latch.status,
            wb_word: l.wb_latch.inst.word,
            wb_status: l.wb_latch.status,
        }
    }

    /// One-line stage diagram on stderr.
    fn print_diagram(&self, state: &PipeState) {
        eprintln!(
            "cyc {:>6}  IF[{:#010x} {}] -> ID[{:#010x} {}] -> EX[{:#010x} {}] -> MEM[{:#010x} {}] -> WB[{:#010x} {}]",
            state.cycle,
            state.if_pc,
            state.if_status.code(),
            state.id_word,
            state.id_status.code(),
            state.ex_word,
            state.ex_status.code(),
            state.mem_word,
            state.mem_status.code(),
            state.wb_word,
            state.wb_status.code(),
        );
    }
}
