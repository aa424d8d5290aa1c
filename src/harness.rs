/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Auto-calibrating measurement loop.
//!
//! Spawns the workload on a worker pool, grows the per-thread iteration count
//! until one sample meets the minimum sample duration, then repeats samples
//! until the relative standard error of the mean drops below the configured
//! bound or the sample budget runs out.

use crate::error::{ErrorKind, Result};
use crate::layout::{NodeLayout, WorkerContext};
use crate::types::{Padding, ThreadCount};
use crate::workload::{AccessPattern, Workload};
use average::{Estimate, Variance};
use serde_derive::Serialize;
use std::io;
use std::time::{Duration, Instant};

/// Accepted samples required before the error bound may end the run.
const MIN_SAMPLES: u64 = 5;

/// Calibration stops doubling here even if the sample is still too short.
const MAX_CALIBRATION_ITERS: u64 = 1 << 32;

/// Measurement configuration handed to [`benchmark_auto`].
#[derive(Clone, Debug)]
pub struct BenchConfig {
    pub threads: ThreadCount,
    /// Per-sample diagnostics on stderr.
    pub print_samples: bool,
    pub max_samples: u32,
    /// A calibrated sample takes at least this long.
    pub min_sample_time: Duration,
    /// Maximum tolerated relative standard error of the mean, in percent.
    pub max_error_percent: f64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            threads: ThreadCount(2),
            print_samples: false,
            max_samples: 100,
            min_sample_time: Duration::from_millis(10),
            max_error_percent: 10.0,
        }
    }
}

/// Aggregate statistics over the accepted samples, in nanoseconds per
/// operation: mean, standard error of the mean, and sample standard
/// deviation.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct Summary {
    pub avg: f64,
    pub err: f64,
    pub u: f64,
}

/// One timed sample, serialized as a CSV row when an output file is given.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DataPoint {
    pub hostname: String,
    pub pattern: Option<AccessPattern>,
    pub padding: Option<Padding>,
    pub threads: Option<ThreadCount>,
    pub warm_up: bool,
    pub iters_per_thread: u64,
    pub ns: u64,
    pub ns_per_op: f64,
}

impl DataPoint {
    /// Template with the host and workload fields filled in; the harness
    /// completes the per-sample fields.
    pub fn from_workload(
        pattern: AccessPattern,
        padding: Padding,
        threads: ThreadCount,
    ) -> Result<Self> {
        let hostname = hostname::get()
            .map_err(|e| ErrorKind::IoError(e))?
            .into_string()
            .map_err(|_| ErrorKind::RuntimeError("hostname is not valid UTF-8".to_string()))?;

        Ok(Self {
            hostname,
            pattern: Some(pattern),
            padding: Some(padding),
            threads: Some(threads),
            ..Self::default()
        })
    }
}

/// Runs `workload` on `config.threads` workers until the measurement
/// converges and returns the aggregate statistics.
///
/// The workload's `init` hook runs once per worker before any timed sample.
/// The first sample is a warm-up and does not count towards the statistics,
/// though it is still written to the CSV output with its `warm_up` flag set.
pub fn benchmark_auto<B, W>(
    config: &BenchConfig,
    layout: &NodeLayout,
    workload: &B,
    template: DataPoint,
    writer: Option<&mut W>,
) -> Result<Summary>
where
    B: Workload,
    W: io::Write,
{
    let ThreadCount(threads) = config.threads;
    if threads == 0 {
        return Err(ErrorKind::InvalidArgument("thread count must be nonzero".to_string()).into());
    }
    if threads > layout.threads().0 {
        return Err(ErrorKind::InvalidArgument(format!(
            "layout holds {} nodes but {} threads were requested",
            layout.threads().0,
            threads
        ))
        .into());
    }
    if config.max_samples == 0 {
        return Err(ErrorKind::InvalidArgument("sample budget must be nonzero".to_string()).into());
    }

    let contexts: Vec<WorkerContext> = (0..threads).map(|tid| layout.context(tid)).collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| ErrorKind::RuntimeError(format!("couldn't build worker pool: {}", e)))?;

    pool.scope(|s| {
        for ctx in &contexts {
            let ctx = *ctx;
            s.spawn(move |_| workload.init(ctx));
        }
    });

    let iters = calibrate(&pool, &contexts, workload, config.min_sample_time);

    let mut accepted = 0u64;
    let mut stats = Variance::new();
    let mut rows: Vec<DataPoint> = Vec::new();
    let mut summary = Summary::default();

    // Sample 0 is the warm-up, then up to max_samples timed samples.
    for sample in 0..=config.max_samples {
        let warm_up = sample == 0;
        let ns = run_sample(&pool, &contexts, workload, iters);
        let ns_per_op = ns as f64 / iters as f64;

        if config.print_samples {
            eprintln!(
                "sample {}: {} iters/thread, {} ns, {:.2} ns/op{}",
                sample,
                iters,
                ns,
                ns_per_op,
                if warm_up { " (warm-up)" } else { "" }
            );
        }

        rows.push(DataPoint {
            warm_up,
            iters_per_thread: iters,
            ns,
            ns_per_op,
            ..template.clone()
        });

        if warm_up {
            continue;
        }

        accepted += 1;
        stats.add(ns_per_op);
        summary = Summary {
            avg: stats.mean(),
            err: stats.error(),
            u: stats.sample_variance().sqrt(),
        };

        if accepted >= MIN_SAMPLES
            && summary.avg > 0.0
            && summary.err / summary.avg * 100.0 <= config.max_error_percent
        {
            break;
        }
    }

    if let Some(w) = writer {
        let mut csv = csv::Writer::from_writer(w);
        rows.iter().try_for_each(|row| csv.serialize(row))?;
    }

    Ok(summary)
}

/// Doubles the per-thread iteration count until one sample meets the minimum
/// sample duration.
fn calibrate<B: Workload>(
    pool: &rayon::ThreadPool,
    contexts: &[WorkerContext],
    workload: &B,
    min_sample_time: Duration,
) -> u64 {
    let target_ns =
        min_sample_time.as_secs() * 10_u64.pow(9) + u64::from(min_sample_time.subsec_nanos());

    let mut iters = 1u64;
    loop {
        let ns = run_sample(pool, contexts, workload, iters);
        if ns >= target_ns || iters >= MAX_CALIBRATION_ITERS {
            return iters;
        }
        iters = iters.saturating_mul(2);
    }
}

/// Times one invocation of the workload with `iters` iterations per worker.
fn run_sample<B: Workload>(
    pool: &rayon::ThreadPool,
    contexts: &[WorkerContext],
    workload: &B,
    iters: u64,
) -> u64 {
    let timer = Instant::now();

    pool.scope(|s| {
        for ctx in contexts {
            let ctx = *ctx;
            s.spawn(move |_| workload.run(ctx, iters));
        }
    });

    let duration = timer.elapsed();
    duration.as_secs() * 10_u64.pow(9) + u64::from(duration.subsec_nanos())
}
