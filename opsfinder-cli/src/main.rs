//! opsfinder CLI
//!
//! Selects o-Ps->3g candidates from recorded hit windows.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};

use opsfinder_algorithms::{GeometricSolver, Pipeline, TrilaterationSolver};
use opsfinder_core::TimeWindow;
use opsfinder_io::{
    load_tot_normalization, CandidateWriter, MappedWindowFile, RunConfig, WindowReader,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    OpsfinderIo(#[from] opsfinder_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] opsfinder_core::Error),
}

/// Positronium three-photon candidate finder.
#[derive(Parser)]
#[command(name = "opsfinder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select candidates from a JSON Lines file of hit windows
    Process {
        /// Input file, one time window per line
        input: PathBuf,

        /// Cut configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file (.csv or .jsonl)
        #[arg(short, long)]
        output: PathBuf,

        /// Per-slot TOT normalization table
        #[arg(long)]
        tot_norm: Option<PathBuf>,

        /// Memory-map the input instead of streaming it
        #[arg(long)]
        mmap: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show hit and unfiltered cluster statistics of an input file
    Info {
        /// Input file, one time window per line
        input: PathBuf,

        /// Cut configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Load and validate a cut configuration
    CheckConfig {
        /// Cut configuration (JSON)
        config: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Windows read either streamed or memory-mapped.
type Windows<'a> = Box<dyn Iterator<Item = opsfinder_io::Result<TimeWindow>> + 'a>;

/// Streams every window of the input to `visit`.
fn for_each_window<F>(input: &Path, mut visit: F) -> Result<()>
where
    F: FnMut(TimeWindow) -> Result<()>,
{
    for window in WindowReader::open(input)? {
        visit(window?)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            config,
            output,
            tot_norm,
            mmap,
            verbose,
        } => {
            init_logging(verbose);

            let run = RunConfig::from_file(&config)?;
            let mut pipeline = Pipeline::with_solver(
                run.cuts,
                TrilaterationSolver::new(run.chamber_radius_cm),
            )?;
            if let Some(path) = &tot_norm {
                pipeline = pipeline.with_normalization(load_tot_normalization(path)?);
            }
            log::info!(
                "processing {} with the {} solver",
                input.display(),
                pipeline.solver().name()
            );

            let start = Instant::now();
            let mut writer = CandidateWriter::create(&output)?;
            let mapped;
            let windows: Windows<'_> = if mmap {
                mapped = MappedWindowFile::open(&input)?;
                log::debug!("mapped {} bytes from {}", mapped.len(), mapped.path().display());
                Box::new(mapped.windows())
            } else {
                Box::new(WindowReader::open(&input)?)
            };
            let stats = pipeline.process_windows(windows, |index, candidates| {
                writer.write_window(index, candidates)
            })?;
            writer.flush()?;
            let elapsed = start.elapsed();

            stats.report();
            println!(
                "Processed {} windows in {:.2}s",
                stats.windows_processed + stats.windows_dropped,
                elapsed.as_secs_f64()
            );
            println!("Candidates written: {}", writer.written());
            println!("Output: {}", output.display());
        }

        Commands::Info { input, config } => {
            init_logging(false);

            let run = RunConfig::from_file(&config)?;
            let pipeline = Pipeline::new(run.cuts)?;

            let mut windows = 0u64;
            let mut hits = 0u64;
            let mut unordered = 0u64;
            let mut time_range: Option<(f64, f64)> = None;
            let mut multiplicities: BTreeMap<usize, u64> = BTreeMap::new();

            for_each_window(&input, |window| {
                windows += 1;
                hits += window.len() as u64;
                if window.check_order().is_err() {
                    unordered += 1;
                }
                for hit in &window.hits {
                    time_range = Some(match time_range {
                        Some((lo, hi)) => (lo.min(hit.time), hi.max(hit.time)),
                        None => (hit.time, hit.time),
                    });
                }
                for size in pipeline.cluster_multiplicities(&window) {
                    *multiplicities.entry(size).or_default() += 1;
                }
                Ok(())
            })?;

            println!("File: {}", input.display());
            println!("Windows: {}", windows);
            println!("Unordered windows: {}", unordered);
            println!("Hits: {}", hits);
            if let Some((lo, hi)) = time_range {
                println!("Time range: {:.1} - {:.1} ps", lo, hi);
            }
            println!(
                "Clusters ({} ps window, unfiltered):",
                pipeline.clusterer().window_ps()
            );
            for (size, count) in &multiplicities {
                println!("  {:>3} hits: {}", size, count);
            }
        }

        Commands::CheckConfig { config } => {
            init_logging(false);

            let run = RunConfig::from_file(&config)?;
            let cuts = &run.cuts;
            println!("Configuration: {}", config.display());
            println!(
                "  annihilation TOT: ({}, {}) ns",
                cuts.tot_annihilation.low, cuts.tot_annihilation.high
            );
            println!(
                "  prompt TOT:       ({}, {}) ns",
                cuts.tot_prompt.low, cuts.tot_prompt.high
            );
            println!("  cluster window:   {} ps", cuts.cluster_time_window_ps);
            println!(
                "  angle-sum cut:    {} deg ({})",
                cuts.angle_sum_cut_deg,
                if cuts.angle_cut_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            println!("  theta veto:       {} deg", cuts.same_element_theta_veto_deg);
            println!("  dvt threshold:    {}", cuts.dvt_veto_threshold);
            println!(
                "  prompt quality:   ({}, {})",
                cuts.prompt_quality_band.low, cuts.prompt_quality_band.high
            );
            match cuts.max_hit_z_cm {
                Some(z) => println!("  max |z|:          {} cm", z),
                None => println!("  max |z|:          disabled"),
            }
            println!("  chamber radius:   {} cm", run.chamber_radius_cm);
            println!("OK");
        }
    }

    Ok(())
}
