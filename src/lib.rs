/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Measures the throughput cost of atomic versus non-atomic memory access
//! under controlled cache-line sharing between two concurrent threads.
//!
//! Each worker thread owns one node of a single-element circular list. The
//! byte stride between the nodes is configurable, so the same workload can be
//! run with the nodes fully isolated on separate cache lines, packed onto one
//! cache line (false sharing), or aliased onto a single node (true sharing).

pub mod error;
pub mod harness;
pub mod layout;
pub mod types;
pub mod workload;
