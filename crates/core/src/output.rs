//! Per-cycle pipeline-state and final statistics writers.
//!
//! The controller emits one `PipeState` snapshot per tick; the writer
//! appends it as a fixed-width row to `<prefix>_pipe_state.log`. The final
//! statistics go to `<prefix>_sim_stats.txt` as `key value` lines. Opening
//! either file is the only I/O that can fail terminally (the run stops
//! with an error rather than continuing blind).

use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::core::pipeline::latches::StageStatus;
use crate::stats::SimStats;

/// Snapshot of the five pipeline slots at the end of one cycle.
#[derive(Clone, Copy, Debug)]
pub struct PipeState {
    /// Cycle number (starting at 0).
    pub cycle: u64,
    /// Fetch-slot PC.
    pub if_pc: u64,
    /// Fetch-slot display status.
    pub if_status: StageStatus,
    /// Decode-slot instruction word.
    pub id_word: u32,
    /// Decode-slot display status.
    pub id_status: StageStatus,
    /// Execute-slot instruction word.
    pub ex_word: u32,
    /// Execute-slot display status.
    pub ex_status: StageStatus,
    /// Memory-slot instruction word.
    pub mem_word: u32,
    /// Memory-slot display status.
    pub mem_status: StageStatus,
    /// Writeback-slot instruction word.
    pub wb_word: u32,
    /// Writeback-slot display status.
    pub wb_status: StageStatus,
}

/// Appending writer for the per-cycle pipeline dump.
pub struct PipeStateWriter {
    out: BufWriter<File>,
}

impl PipeStateWriter {
    /// Creates `<prefix>_pipe_state.log` and writes the column header.
    pub fn new(output_prefix: &str) -> io::Result<Self> {
        let path = format!("{}_pipe_state.log", output_prefix);
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(
            out,
            "{:>8}  {:>10} IF  {:>10} ID  {:>10} EX  {:>10} MEM  {:>10} WB",
            "cycle", "pc", "word", "word", "word", "word"
        )?;
        Ok(Self { out })
    }

    /// Appends one cycle row.
    ///
    /// Status codes: N normal, B bubble, X squashed, I idle, S speculative.
    pub fn record(&mut self, state: &PipeState) -> io::Result<()> {
        writeln!(
            self.out,
            "{:>8}  {:#010x} {}   {:#010x} {}   {:#010x} {}   {:#010x} {}    {:#010x} {}",
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
        )
    }

    /// Flushes buffered rows to disk.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Writes the final statistics to `<prefix>_sim_stats.txt`.
pub fn write_sim_stats(stats: &SimStats, output_prefix: &str) -> io::Result<()> {
    let path = format!("{}_sim_stats.txt", output_prefix);
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "committed        {}", stats.committed)?;
    writeln!(out, "cycles           {}", stats.cycles)?;
    writeln!(out, "icache_hits      {}", stats.ic_hits)?;
    writeln!(out, "icache_misses    {}", stats.ic_misses)?;
    writeln!(out, "dcache_hits      {}", stats.dc_hits)?;
    writeln!(out, "dcache_misses    {}", stats.dc_misses)?;
    writeln!(out, "load_use_stalls  {}", stats.load_use_stalls)?;
    out.flush()
}
