/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 */

use padbench::error::Result;
use padbench::harness::{self, BenchConfig, DataPoint};
use padbench::layout::NodeLayout;
use padbench::types::{Padding, ThreadCount};
use padbench::workload::AccessPattern;
use std::env;
use std::path::PathBuf;
use structopt::StructOpt;

/// Number of worker threads exercising the layout.
const THREADS: usize = 2;

#[derive(StructOpt)]
#[structopt(name = "padbench")]
/// Measures atomic vs. non-atomic access throughput under configurable
/// cache-line sharing between two threads
struct Options {
    /// Byte stride between per-thread nodes; 0 shares a single node
    /// between all threads
    pad: Padding,

    /// Access pattern: s (atomic add), r (atomic read), w (one writer,
    /// relaxed readers), a (non-atomic add)
    mode: AccessPattern,

    #[structopt(long = "csv")]
    /// CSV output file for per-sample measurements
    csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    let options = Options::from_args();

    let threads = ThreadCount(THREADS);
    let layout = NodeLayout::new(threads, options.pad)?;

    let print_samples = env::var("BENCH_PRINT").map(|v| v == "y").unwrap_or(false);
    let config = BenchConfig {
        threads,
        print_samples,
        ..BenchConfig::default()
    };

    let mut csv_file = options.csv.as_ref().map(std::fs::File::create).transpose()?;

    let template = DataPoint::from_workload(options.mode, options.pad, threads)?;
    let summary = harness::benchmark_auto(
        &config,
        &layout,
        &options.mode,
        template,
        csv_file.as_mut(),
    )?;

    println!(
        "{} {:.2} {:.2} {:.2}",
        options.pad, summary.avg, summary.err, summary.u
    );

    Ok(())
}
