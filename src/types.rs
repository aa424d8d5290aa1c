/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 */

use serde_derive::Serialize;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Byte stride between per-thread nodes.
///
/// A padding of zero is the true-sharing mode: all threads address the same
/// node. Any nonzero padding must be at least the node size, so that each
/// thread's node fits inside its own slice of the region.
#[derive(Copy, Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Padding(pub usize);

impl fmt::Display for Padding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Padding {
    type Err = ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<usize>().map(Padding)
    }
}

/// Thread count
///
/// The number of CPU worker threads.
#[derive(Copy, Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ThreadCount(pub usize);
