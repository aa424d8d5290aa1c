/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Cross-thread counter properties of the access patterns: exactness under
//! isolation and false sharing, atomicity under true sharing, and the
//! writer/reader role split.

use padbench::layout::NodeLayout;
use padbench::types::{Padding, ThreadCount};
use padbench::workload::{AccessPattern, Workload};

const ITERS: u64 = 100_000;

/// Runs the pattern concurrently on both worker threads, as the harness does.
fn run_pair(pattern: AccessPattern, layout: &NodeLayout, iters: u64) {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(2)
        .build()
        .unwrap();

    pool.scope(|s| {
        for tid in 0..2 {
            let ctx = layout.context(tid);
            s.spawn(move |_| pattern.run(ctx, iters));
        }
    });
}

#[test]
fn unsync_add_is_exact_on_separate_cache_lines() {
    let layout = NodeLayout::new(ThreadCount(2), Padding(128)).unwrap();
    run_pair(AccessPattern::UnsyncAdd, &layout, ITERS);

    // No true sharing, so no lost updates.
    assert_eq!(layout.counter(0), ITERS);
    assert_eq!(layout.counter(1), ITERS);
}

#[test]
fn unsync_add_is_exact_per_node_under_false_sharing() {
    // Node-sized stride: both nodes share a cache line but each thread still
    // owns a distinct address, so the counters stay exact.
    let layout = NodeLayout::new(ThreadCount(2), Padding(16)).unwrap();
    run_pair(AccessPattern::UnsyncAdd, &layout, ITERS);

    assert_eq!(layout.counter(0), ITERS);
    assert_eq!(layout.counter(1), ITERS);
}

#[test]
fn atomic_add_total_is_exact_under_true_sharing() {
    let layout = NodeLayout::new(ThreadCount(2), Padding(0)).unwrap();
    run_pair(AccessPattern::AtomicAdd, &layout, ITERS);

    // Both thread ids read the same shared node.
    assert_eq!(layout.counter(0), 2 * ITERS);
    assert_eq!(layout.counter(1), 2 * ITERS);
}

#[test]
fn atomic_add_total_is_exact_with_disjoint_nodes() {
    let layout = NodeLayout::new(ThreadCount(2), Padding(64)).unwrap();
    run_pair(AccessPattern::AtomicAdd, &layout, ITERS);

    assert_eq!(layout.counter(0) + layout.counter(1), 2 * ITERS);
}

#[test]
fn atomic_read_never_mutates() {
    let layout = NodeLayout::new(ThreadCount(2), Padding(0)).unwrap();
    run_pair(AccessPattern::AtomicRead, &layout, ITERS);

    assert_eq!(layout.counter(0), 0);
}

#[test]
fn writer_counter_survives_concurrent_readers() {
    // True sharing: thread 0 increments the node that thread 1 reads.
    let layout = NodeLayout::new(ThreadCount(2), Padding(0)).unwrap();
    run_pair(AccessPattern::WriterReaders, &layout, ITERS);

    assert_eq!(layout.counter(0), ITERS, "readers must not corrupt the counter");
}
