//! Pipeline simulator CLI.
//!
//! Loads a program image at address zero, builds the split caches from a
//! JSON configuration (or defaults), and runs the pipeline either for a
//! fixed number of cycles or until the halt marker retires. Per-cycle
//! pipeline state and final statistics are written under the output
//! prefix.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process;

use rvpipe_core::exec::executor::executor_with_program;
use rvpipe_core::exec::loader;
use rvpipe_core::{PipelineController, RunStatus, SimConfig};

#[derive(Parser, Debug)]
#[command(
    name = "rvpipe",
    author,
    version,
    about = "Cycle-accurate five-stage RISC-V pipeline simulator",
    long_about = "Run a program image through a five-stage in-order pipeline with split\n\
                  L1 caches. The image is placed at address 0 and fetch starts there.\n\n\
                  Examples:\n  \
                  rvpipe program.bin\n  \
                  rvpipe program.hex --cycles 1000 -o run1\n  \
                  rvpipe program.bin --config caches.json --trace --dump-caches"
)]
struct Cli {
    /// Program image: raw little-endian binary, or `.hex` text with one
    /// 32-bit word per line.
    image: PathBuf,

    /// JSON configuration file (cache geometry, memory size).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of cycles to run; 0 runs until HALT.
    #[arg(long, default_value_t = 0)]
    cycles: u64,

    /// Prefix for the pipeline dump and statistics files.
    #[arg(short = 'o', long, default_value = "rvpipe")]
    output_prefix: String,

    /// Echo the per-cycle stage diagram to stderr.
    #[arg(long)]
    trace: bool,

    /// Write the cache line tables and register file at exit.
    #[arg(long)]
    dump_caches: bool,
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            process::exit(1);
        }
    };

    let image = loader::load_image(&cli.image).unwrap_or_else(|e| {
        eprintln!("Error reading image {}: {}", cli.image.display(), e);
        process::exit(1);
    });

    println!(
        "rvpipe: image={} ({} bytes)  icache={}B/{}B/{}-way  dcache={}B/{}B/{}-way  miss={}cyc/{}cyc",
        cli.image.display(),
        image.len(),
        config.i_cache.size_bytes,
        config.i_cache.block_bytes,
        config.i_cache.ways,
        config.d_cache.size_bytes,
        config.d_cache.block_bytes,
        config.d_cache.ways,
        config.i_cache.miss_latency,
        config.d_cache.miss_latency,
    );

    let executor = executor_with_program(&config.memory, &image);
    let mut controller = PipelineController::new(&config, executor).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    controller.set_trace(cli.trace);
    if let Err(e) = controller.attach_writer(&cli.output_prefix) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let outcome = if cli.cycles == 0 {
        controller.run_till_halt()
    } else {
        controller.run_cycles(cli.cycles)
    };

    match outcome {
        Ok(RunStatus::Halt) => println!("[*] HALT retired"),
        Ok(RunStatus::Success) => println!("[*] Ran {} cycles", cli.cycles),
        Err(e) => {
            eprintln!("\n[!] {}", e);
            process::exit(1);
        }
    }

    match controller.finalize(&cli.output_prefix) {
        Ok(stats) => stats.print(),
        Err(e) => {
            eprintln!("[!] {}", e);
            process::exit(1);
        }
    }

    if cli.dump_caches {
        let dump = controller
            .i_cache()
            .dump(&cli.output_prefix)
            .and_then(|_| controller.d_cache().dump(&cli.output_prefix))
            .and_then(|_| controller.simulator().dump_registers(&cli.output_prefix));
        if let Err(e) = dump {
            eprintln!("[!] dump failed: {}", e);
            process::exit(1);
        }
    }
}

/// Loads the JSON configuration, or defaults when no file is given.
fn load_config(path: Option<&std::path::Path>) -> Result<SimConfig, String> {
    let config = match path {
        Some(p) => {
            let text = fs::read_to_string(p)
                .map_err(|e| format!("reading config {}: {}", p.display(), e))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("parsing config {}: {}", p.display(), e))?
        }
        None => SimConfig::default(),
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}
