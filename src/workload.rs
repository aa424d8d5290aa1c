/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The four access patterns exercising a worker's node.
//!
//! Every pattern performs exactly `iters` operations and advances through the
//! node's `next` pointer after each one. On the single-element circular list
//! the pointer chase never changes the address, but it executes exactly as it
//! would on a longer list, so timings stay comparable across list shapes.

use crate::layout::{Node, WorkerContext};
use serde_derive::Serialize;
use std::hint;
use std::str::FromStr;
use std::sync::atomic::Ordering;

/// Access pattern selected by a single command-line character.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum AccessPattern {
    /// `a`: non-atomic `val += 1`. Races with other threads when nodes
    /// alias; that race is the quantity under measurement.
    UnsyncAdd,
    /// `s`: relaxed `fetch_add(1)`.
    AtomicAdd,
    /// `r`: relaxed load, result discarded.
    AtomicRead,
    /// `w`: thread 0 performs the non-atomic increment, every other thread
    /// performs relaxed loads of the same counter.
    WriterReaders,
}

impl FromStr for AccessPattern {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "a" => Ok(AccessPattern::UnsyncAdd),
            "s" => Ok(AccessPattern::AtomicAdd),
            "r" => Ok(AccessPattern::AtomicRead),
            "w" => Ok(AccessPattern::WriterReaders),
            _ => Err(format!("unknown mode '{}', expected one of s, r, w, a", s)),
        }
    }
}

/// Per-thread callback contract consumed by the harness.
pub trait Workload: Sync {
    /// Invoked once per worker before any timed sample.
    fn init(&self, _ctx: WorkerContext) {}

    /// Perform exactly `iters` operations on the worker's node.
    fn run(&self, ctx: WorkerContext, iters: u64);
}

impl Workload for AccessPattern {
    fn run(&self, ctx: WorkerContext, iters: u64) {
        match self {
            AccessPattern::UnsyncAdd => unsafe { unsync_add(ctx.node(), iters) },
            AccessPattern::AtomicAdd => unsafe { atomic_add(ctx.node(), iters) },
            AccessPattern::AtomicRead => unsafe { atomic_read(ctx.node(), iters) },
            AccessPattern::WriterReaders => unsafe {
                if ctx.id() == 0 {
                    unsync_add(ctx.node(), iters)
                } else {
                    atomic_read(ctx.node(), iters)
                }
            },
        }
    }
}

/// Non-atomic read-modify-write of the counter.
///
/// Goes through the atomic's raw pointer on purpose: the increment must not
/// be indivisible, otherwise the pattern measures the same thing as
/// [`atomic_add`]. Under true sharing this is a data race.
unsafe fn unsync_add(node: *mut Node, iters: u64) {
    let mut l = node;
    for _ in 0..iters {
        let p = (*l).val().as_ptr();
        p.write(p.read().wrapping_add(1));
        l = (*l).next();
    }
}

unsafe fn atomic_add(node: *mut Node, iters: u64) {
    let mut l = node;
    for _ in 0..iters {
        (*l).val().fetch_add(1, Ordering::Relaxed);
        l = (*l).next();
    }
}

unsafe fn atomic_read(node: *mut Node, iters: u64) {
    let mut l = node;
    let mut r = 0;
    for _ in 0..iters {
        r = (*l).val().load(Ordering::Relaxed);
        l = (*l).next();
    }
    // Keeps the loads live, like the discarded-result sink in hand-written
    // read benchmarks.
    hint::black_box(r);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::NodeLayout;
    use crate::types::{Padding, ThreadCount};

    fn isolated_layout() -> NodeLayout {
        NodeLayout::new(ThreadCount(2), Padding(128)).unwrap()
    }

    #[test]
    fn parses_all_selectors() {
        assert_eq!("a".parse(), Ok(AccessPattern::UnsyncAdd));
        assert_eq!("s".parse(), Ok(AccessPattern::AtomicAdd));
        assert_eq!("r".parse(), Ok(AccessPattern::AtomicRead));
        assert_eq!("w".parse(), Ok(AccessPattern::WriterReaders));
    }

    #[test]
    fn rejects_unknown_selectors() {
        assert!("x".parse::<AccessPattern>().is_err());
        assert!("".parse::<AccessPattern>().is_err());
        assert!("sa".parse::<AccessPattern>().is_err());
    }

    #[test]
    fn unsync_add_counts_every_iteration() {
        let layout = isolated_layout();
        AccessPattern::UnsyncAdd.run(layout.context(0), 1000);
        assert_eq!(layout.counter(0), 1000);
        assert_eq!(layout.counter(1), 0);
    }

    #[test]
    fn atomic_add_counts_every_iteration() {
        let layout = isolated_layout();
        AccessPattern::AtomicAdd.run(layout.context(1), 1000);
        assert_eq!(layout.counter(0), 0);
        assert_eq!(layout.counter(1), 1000);
    }

    #[test]
    fn atomic_read_leaves_counters_untouched() {
        let layout = isolated_layout();
        AccessPattern::AtomicRead.run(layout.context(0), 1000);
        AccessPattern::AtomicRead.run(layout.context(1), 1000);
        assert_eq!(layout.counter(0), 0);
        assert_eq!(layout.counter(1), 0);
    }

    #[test]
    fn writer_readers_splits_roles_by_thread_id() {
        let layout = isolated_layout();
        AccessPattern::WriterReaders.run(layout.context(0), 1000);
        AccessPattern::WriterReaders.run(layout.context(1), 1000);
        assert_eq!(layout.counter(0), 1000, "thread 0 is the writer");
        assert_eq!(layout.counter(1), 0, "other threads only read");
    }

    #[test]
    fn zero_iterations_is_a_no_op() {
        let layout = isolated_layout();
        AccessPattern::AtomicAdd.run(layout.context(0), 0);
        assert_eq!(layout.counter(0), 0);
    }
}
