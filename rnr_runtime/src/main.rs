//! rnr-inspect: offline inspection of record & replay traces.
//!
//! Subcommands dump a trace as JSON lines, fingerprint it, show the query
//! state at a point in time, compare two captures for drift, or step a
//! replay cursor through it frame by frame.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use rnr_runtime::cursor::TraceCursor;
use rnr_runtime::drift::compare_traces;
use rnr_runtime::replay::{file_digest, rebuild_index};
use rnr_runtime::trace_store::read_entries;
use rnr_trace::TRACE_FORMAT_VERSION;

/// Default frame interval: 90 Hz.
const DEFAULT_STEP_NS: i64 = 11_111_111;

#[derive(Parser)]
#[command(name = "rnr-inspect", version, about = "Inspect librnr trace files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every entry as one JSON object per line
    Dump { trace: PathBuf },
    /// Print the content digest of a trace
    Digest { trace: PathBuf },
    /// Print the latest entry per key at a time relative to the first entry
    State {
        trace: PathBuf,
        #[arg(long, default_value_t = i64::MAX)]
        at_ns: i64,
    },
    /// Compare two traces; exits non-zero on drift
    Diff { a: PathBuf, b: PathBuf },
    /// Step a replay cursor through the trace at a fixed frame interval
    Step {
        trace: PathBuf,
        #[arg(long, default_value_t = DEFAULT_STEP_NS, value_parser = clap::value_parser!(i64).range(1..))]
        step_ns: i64,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Dump { trace } => {
            let entries = read_entries(&trace)
                .with_context(|| format!("reading {}", trace.display()))?;
            for entry in &entries {
                println!("{}", serde_json::to_string(entry)?);
            }
        }
        Command::Digest { trace } => {
            let digest = file_digest(&trace)
                .with_context(|| format!("digesting {}", trace.display()))?;
            println!(
                "{}",
                json!({
                    "format_version": TRACE_FORMAT_VERSION,
                    "digest": digest,
                })
            );
        }
        Command::State { trace, at_ns } => {
            let entries = read_entries(&trace)
                .with_context(|| format!("reading {}", trace.display()))?;
            let index = rebuild_index(&entries, at_ns);
            for (key, entry) in index.iter() {
                println!("{}", json!({ "key": key.to_string(), "entry": entry }));
            }
        }
        Command::Diff { a, b } => {
            let entries_a =
                read_entries(&a).with_context(|| format!("reading {}", a.display()))?;
            let entries_b =
                read_entries(&b).with_context(|| format!("reading {}", b.display()))?;
            let report = compare_traces(&entries_a, &entries_b);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.is_clean() {
                println!("[OK] traces match ({} entries)", report.entries_a);
            } else {
                println!("[FAIL] traces drift");
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Step { trace, step_ns } => {
            let mut cursor = TraceCursor::open(&trace)
                .with_context(|| format!("opening {}", trace.display()))?;
            let mut frames: u64 = 0;
            let mut time = 0;
            while cursor.advance_to(time) {
                frames += 1;
                time += step_ns;
            }
            println!(
                "{}",
                json!({
                    "frames": frames,
                    "step_ns": step_ns,
                    "lines_read": cursor.lines_read(),
                    "lines_skipped": cursor.lines_skipped(),
                    "keys": cursor.index().len(),
                    "watermark": cursor.watermark(),
                })
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}
