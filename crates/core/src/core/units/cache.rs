//! Set-associative cache model.
//!
//! This module implements the timing-only cache shared by the instruction
//! and data sides. It models residency and replacement; it does not hold
//! data. A miss always fills within the same `access` call, and the miss
//! penalty is charged by the pipeline controller, not here.
//!
//! Replacement is true LRU via per-line stamps: one monotonically
//! increasing counter per cache, bumped on every hit and fill. The line
//! with the smallest stamp in a set is the victim. A 64-bit counter makes
//! wraparound irrelevant over any realistic run.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::config::CacheConfig;

/// Which side of the split L1 this cache serves. Affects naming in dumps
/// and statistics only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheKind {
    /// Instruction cache.
    Instruction,
    /// Data cache.
    Data,
}

impl CacheKind {
    /// Short lowercase label used in dump file names.
    pub fn label(&self) -> &'static str {
        match self {
            CacheKind::Instruction => "icache",
            CacheKind::Data => "dcache",
        }
    }
}

/// Access operation. The cache is write-through with write-allocate and
/// identical timing for both operations, so this selects statistics labels
/// only; it does not change eviction or residency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheOp {
    Read,
    Write,
}

/// Outcome of a single cache access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessOutcome {
    Hit,
    Miss,
}

impl AccessOutcome {
    /// Convenience predicate for callers branching on the outcome.
    pub fn is_hit(&self) -> bool {
        matches!(self, AccessOutcome::Hit)
    }
}

/// One cache line: validity, tag, and LRU stamp.
#[derive(Clone, Copy, Default)]
struct CacheLine {
    valid: bool,
    tag: u64,
    stamp: u64,
}

/// Set-associative cache with true-LRU replacement.
pub struct Cache {
    kind: CacheKind,
    config: CacheConfig,
    /// Flat line storage; index = set * ways + way.
    lines: Vec<CacheLine>,
    num_sets: u64,
    ways: usize,
    block_offset_bits: u32,
    set_index_bits: u32,
    /// Global stamp source; strictly increasing across the cache lifetime.
    lru_stamp: u64,
    hits: u64,
    misses: u64,
}

impl Cache {
    /// Builds a cache from a validated configuration.
    ///
    /// Geometry invariants (power-of-two block size and set count,
    /// `ways >= 1`) are checked by `CacheConfig::validate` before
    /// construction; nothing here re-validates.
    pub fn new(config: CacheConfig, kind: CacheKind) -> Self {
        let num_sets = config.num_sets();
        let ways = config.ways as usize;
        Self {
            kind,
            lines: vec![CacheLine::default(); (num_sets as usize) * ways],
            num_sets,
            ways,
            block_offset_bits: config.block_offset_bits(),
            set_index_bits: config.set_index_bits(),
            lru_stamp: 0,
            hits: 0,
            misses: 0,
            config,
        }
    }

    /// The configuration this cache was built from.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Which side of the split L1 this cache serves.
    pub fn kind(&self) -> CacheKind {
        self.kind
    }

    /// Total hits recorded so far.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Total misses recorded so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Decomposes an address into its set index and tag.
    fn index_and_tag(&self, address: u64) -> (usize, u64) {
        let set_mask = self.num_sets - 1;
        let set = (address >> self.block_offset_bits) & set_mask;
        let tag = address >> (self.block_offset_bits + self.set_index_bits);
        (set as usize, tag)
    }

    /// Probes the cache, filling on a miss.
    ///
    /// On a hit the matched line's stamp is refreshed. On a miss a victim
    /// is chosen (first invalid way, else the smallest stamp, ties broken
    /// by the lowest way index) and overwritten immediately; the caller
    /// models the penalty cycles. After this returns, exactly one line in
    /// the addressed set matches the tag.
    ///
    /// # Arguments
    ///
    /// * `address` - Full byte address of the access.
    /// * `_op` - Read or write; recorded identically today because the
    ///   cache is write-through with write-allocate.
    pub fn access(&mut self, address: u64, _op: CacheOp) -> AccessOutcome {
        let (set, tag) = self.index_and_tag(address);
        let base = set * self.ways;

        for way in 0..self.ways {
            let line = &mut self.lines[base + way];
            if line.valid && line.tag == tag {
                self.lru_stamp += 1;
                line.stamp = self.lru_stamp;
                self.hits += 1;
                return AccessOutcome::Hit;
            }
        }

        let victim = self.select_victim(base);
        self.lru_stamp += 1;
        self.lines[base + victim] = CacheLine {
            valid: true,
            tag,
            stamp: self.lru_stamp,
        };
        self.misses += 1;
        AccessOutcome::Miss
    }

    /// Selects the way to replace within one set.
    ///
    /// First invalid way wins; otherwise the valid line with the smallest
    /// stamp. Strict `<` comparison breaks ties toward the lowest index.
    fn select_victim(&self, base: usize) -> usize {
        let mut victim = 0;
        let mut min_stamp = u64::MAX;
        for way in 0..self.ways {
            let line = &self.lines[base + way];
            if !line.valid {
                return way;
            }
            if line.stamp < min_stamp {
                min_stamp = line.stamp;
                victim = way;
            }
        }
        victim
    }

    /// Whether the addressed block is currently resident. Does not touch
    /// stamps or counters.
    pub fn contains(&self, address: u64) -> bool {
        let (set, tag) = self.index_and_tag(address);
        let base = set * self.ways;
        (0..self.ways).any(|way| {
            let line = &self.lines[base + way];
            line.valid && line.tag == tag
        })
    }

    /// Number of valid lines in the set holding `address`.
    pub fn valid_lines_in_set(&self, address: u64) -> usize {
        let (set, _) = self.index_and_tag(address);
        let base = set * self.ways;
        (0..self.ways)
            .filter(|&way| self.lines[base + way].valid)
            .count()
    }

    /// Writes the valid-line table to `<prefix>_<kind>_cache.txt` for
    /// debugging.
    pub fn dump(&self, output_prefix: &str) -> io::Result<()> {
        let path = format!("{}_{}_cache.txt", output_prefix, self.kind.label());
        let mut out = BufWriter::new(File::create(Path::new(&path))?);
        writeln!(
            out,
            "# {} | size {} | block {} | ways {} | sets {}",
            self.kind.label(),
            self.config.size_bytes,
            self.config.block_bytes,
            self.ways,
            self.num_sets
        )?;
        for set in 0..self.num_sets as usize {
            for way in 0..self.ways {
                let line = &self.lines[set * self.ways + way];
                if line.valid {
                    writeln!(
                        out,
                        "set {:4} way {:2} tag {:#014x} stamp {}",
                        set, way, line.tag, line.stamp
                    )?;
                }
            }
        }
        out.flush()
    }
}
