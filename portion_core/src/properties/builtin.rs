// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in properties.

use alloc::string::String;
use alloc::vec::Vec;
use core::time::Duration;

use super::Property;

macro_rules! counting_property {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        ///
        /// Sums across the tree. Finished children keep contributing.
        #[derive(Clone, Copy, Debug)]
        pub enum $name {}

        impl Property for $name {
            type Value = u64;
            type Summary = u64;

            fn default_value() -> u64 {
                0
            }

            fn default_summary() -> u64 {
                0
            }

            fn reduce(into: &mut u64, value: &u64) {
                *into = into.saturating_add(*value);
            }

            fn merge(lhs: u64, rhs: u64) -> u64 {
                lhs.saturating_add(rhs)
            }

            fn terminate(parent: u64, child: u64) -> u64 {
                Self::merge(parent, child)
            }
        }
    };
}

counting_property!(
    /// Number of files a unit of work will process.
    TotalFileCount
);

counting_property!(
    /// Number of files a unit of work has processed.
    CompletedFileCount
);

counting_property!(
    /// Number of bytes a unit of work will process.
    TotalByteCount
);

counting_property!(
    /// Number of bytes a unit of work has processed.
    CompletedByteCount
);

/// Current transfer rate in bytes per second.
///
/// Sums across running work. A finished child no longer transfers anything,
/// so its last reported rate drops out.
#[derive(Clone, Copy, Debug)]
pub enum Throughput {}

impl Property for Throughput {
    type Value = u64;
    type Summary = u64;

    fn default_value() -> u64 {
        0
    }

    fn default_summary() -> u64 {
        0
    }

    fn reduce(into: &mut u64, value: &u64) {
        *into = into.saturating_add(*value);
    }

    fn merge(lhs: u64, rhs: u64) -> u64 {
        lhs.saturating_add(rhs)
    }

    fn terminate(parent: u64, _child: u64) -> u64 {
        parent
    }
}

/// Estimated time until a unit of work finishes.
///
/// Work proceeds in parallel, so the summary is the longest estimate among
/// running work.
#[derive(Clone, Copy, Debug)]
pub enum EstimatedTimeRemaining {}

impl Property for EstimatedTimeRemaining {
    type Value = Duration;
    type Summary = Duration;

    fn default_value() -> Duration {
        Duration::ZERO
    }

    fn default_summary() -> Duration {
        Duration::ZERO
    }

    fn reduce(into: &mut Duration, value: &Duration) {
        *into = (*into).max(*value);
    }

    fn merge(lhs: Duration, rhs: Duration) -> Duration {
        lhs.max(rhs)
    }

    fn terminate(parent: Duration, _child: Duration) -> Duration {
        parent
    }
}

/// Name of the file currently being processed.
///
/// The summary collects the names reported by running work, in tree order.
#[derive(Clone, Copy, Debug)]
pub enum FileName {}

impl Property for FileName {
    type Value = Option<String>;
    type Summary = Vec<String>;

    fn default_value() -> Option<String> {
        None
    }

    fn default_summary() -> Vec<String> {
        Vec::new()
    }

    fn reduce(into: &mut Vec<String>, value: &Option<String>) {
        if let Some(name) = value {
            into.push(name.clone());
        }
    }

    fn merge(mut lhs: Vec<String>, rhs: Vec<String>) -> Vec<String> {
        lhs.extend(rhs);
        lhs
    }

    fn terminate(parent: Vec<String>, _child: Vec<String>) -> Vec<String> {
        parent
    }
}
