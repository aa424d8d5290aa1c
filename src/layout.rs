/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Per-thread node placement inside one aligned memory region.
//!
//! The region holds `threads * pad` bytes and one node is carved out per
//! thread at stride `pad`. Every node links to itself, forming a circular
//! list of length one, so the workload loops traverse it exactly like a
//! longer list without ever leaving the node.

use crate::error::{ErrorKind, Result};
use crate::types::{Padding, ThreadCount};
use std::io::Error as IoError;
use std::mem::size_of;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Covers one cache line on every CPU this runs on, including lines that the
/// prefetcher pairs up.
pub const CACHE_LINE_ALIGN: usize = 128;

/// Single element of the traversal list: a self-referential `next` pointer
/// and the counter the access patterns exercise.
#[repr(C)]
pub struct Node {
    next: *mut Node,
    val: AtomicU64,
}

impl Node {
    #[inline]
    pub(crate) fn next(&self) -> *mut Node {
        self.next
    }

    #[inline]
    pub(crate) fn val(&self) -> &AtomicU64 {
        &self.val
    }
}

/// Per-thread handle passed into the workload callbacks.
///
/// Binds a worker's thread id to its node, replacing any process-wide
/// id-to-node table. The node pointer stays valid for the lifetime of the
/// `NodeLayout` the context was taken from.
#[derive(Clone, Copy, Debug)]
pub struct WorkerContext {
    id: usize,
    node: *mut Node,
}

// The layout hands the region off to the workers for the duration of a run
// and touches it again only after they have joined.
unsafe impl Send for WorkerContext {}
unsafe impl Sync for WorkerContext {}

impl WorkerContext {
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub(crate) fn node(&self) -> *mut Node {
        self.node
    }
}

/// One zero-initialized, cache-line-aligned region with one node per thread.
#[derive(Debug)]
pub struct NodeLayout {
    base: *mut u8,
    pad: Padding,
    threads: ThreadCount,
}

unsafe impl Send for NodeLayout {}
unsafe impl Sync for NodeLayout {}

impl NodeLayout {
    /// Allocates the region and initializes the per-thread nodes.
    ///
    /// `pad` must be zero or at least `size_of::<Node>()`; anything else is
    /// rejected before any allocation happens. A padding of zero allocates a
    /// single node that all thread indices alias, which makes the race on one
    /// shared counter (true sharing) an explicit, in-bounds mode rather than
    /// a zero-length allocation.
    pub fn new(threads: ThreadCount, pad: Padding) -> Result<Self> {
        let ThreadCount(nthreads) = threads;
        let Padding(stride) = pad;

        if nthreads == 0 {
            return Err(ErrorKind::InvalidArgument(
                "thread count must be nonzero".to_string(),
            )
            .into());
        }
        if stride != 0 && stride < size_of::<Node>() {
            return Err(ErrorKind::InvalidArgument(format!(
                "padding must be 0 or at least {} bytes, got {}",
                size_of::<Node>(),
                stride
            ))
            .into());
        }

        let bytes = if stride == 0 {
            size_of::<Node>()
        } else {
            nthreads.checked_mul(stride).ok_or_else(|| {
                ErrorKind::InvalidArgument(format!(
                    "region size overflows: {} threads x {} bytes",
                    nthreads, stride
                ))
            })?
        };

        let mut base: *mut libc::c_void = ptr::null_mut();
        let errno = unsafe { libc::posix_memalign(&mut base, CACHE_LINE_ALIGN, bytes) };
        if errno != 0 {
            return Err(ErrorKind::IoError(IoError::from_raw_os_error(errno)).into());
        }
        let base = base as *mut u8;

        unsafe {
            ptr::write_bytes(base, 0, bytes);
            for i in 0..nthreads {
                let node = base.add(i * stride) as *mut Node;
                ptr::write(
                    node,
                    Node {
                        next: node,
                        val: AtomicU64::new(0),
                    },
                );
            }
        }

        Ok(Self { base, pad, threads })
    }

    pub fn threads(&self) -> ThreadCount {
        self.threads
    }

    pub fn padding(&self) -> Padding {
        self.pad
    }

    /// Explicit thread-to-node binding for worker `tid`.
    ///
    /// With zero padding every `tid` maps to the same node.
    pub fn context(&self, tid: usize) -> WorkerContext {
        assert!(tid < self.threads.0, "thread id {} out of range", tid);

        let node = unsafe { self.base.add(tid * self.pad.0) } as *mut Node;
        WorkerContext { id: tid, node }
    }

    /// Relaxed read of the counter in thread `tid`'s node. Inspection hook
    /// used after the workers have joined.
    pub fn counter(&self, tid: usize) -> u64 {
        let node = self.context(tid).node;
        unsafe { (*node).val.load(Ordering::Relaxed) }
    }
}

impl Drop for NodeLayout {
    fn drop(&mut self) {
        unsafe { libc::free(self.base as *mut libc::c_void) };
    }
}
