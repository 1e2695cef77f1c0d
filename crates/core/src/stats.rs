//! Simulation statistics collection and reporting.
//!
//! Tracks the counters the final report is built from:
//! 1. **Progress:** Total cycles and committed (retired) instructions.
//! 2. **Stalls:** Load-use stall count.
//! 3. **Caches:** Hit/miss counts for the instruction and data caches.

/// Simulation statistics.
///
/// The pipeline counters are maintained live by the controller; the cache
/// counters are copied in from the caches when a report is taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Total simulator cycles elapsed.
    pub cycles: u64,
    /// Instructions committed (each dynamic retirement counts).
    pub committed: u64,
    /// Cycles lost to load-use stalls.
    pub load_use_stalls: u64,
    /// Instruction cache hit count.
    pub ic_hits: u64,
    /// Instruction cache miss count.
    pub ic_misses: u64,
    /// Data cache hit count.
    pub dc_hits: u64,
    /// Data cache miss count.
    pub dc_misses: u64,
}

impl SimStats {
    /// Cycles per committed instruction; 0 when nothing committed.
    pub fn cpi(&self) -> f64 {
        if self.committed == 0 {
            return 0.0;
        }
        self.cycles as f64 / self.committed as f64
    }

    /// Prints the report to stdout as aligned `key value` lines.
    pub fn print(&self) {
        let rate = |hits: u64, misses: u64| -> f64 {
            let total = hits + misses;
            if total == 0 {
                0.0
            } else {
                100.0 * hits as f64 / total as f64
            }
        };
        println!("----------------------------------------");
        println!("PIPELINE SIMULATION STATISTICS");
        println!("----------------------------------------");
        println!("sim_cycles           {}", self.cycles);
        println!("sim_insts            {}", self.committed);
        println!("sim_cpi              {:.4}", self.cpi());
        println!("stalls.load_use      {}", self.load_use_stalls);
        println!(
            "icache               hits: {:<10} misses: {:<10} hit_rate: {:.2}%",
            self.ic_hits,
            self.ic_misses,
            rate(self.ic_hits, self.ic_misses)
        );
        println!(
            "dcache               hits: {:<10} misses: {:<10} hit_rate: {:.2}%",
            self.dc_hits,
            self.dc_misses,
            rate(self.dc_hits, self.dc_misses)
        );
        println!("----------------------------------------");
    }
}
