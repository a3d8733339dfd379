// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable progress output.
//!
//! [`PrettyPrintObserver`] implements [`ProgressObserver`] and writes one
//! line per event to a [`Write`](std::io::Write) destination (default:
//! stderr).

use std::io::Write;

use parking_lot::Mutex;
use portion_core::{ProgressEvent, ProgressObserver, ProgressSnapshot};

/// Writes human-readable progress lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPrintObserver<W: Write + Send = Box<dyn Write + Send>> {
    writer: Mutex<W>,
}

impl<W: Write + Send> std::fmt::Debug for PrettyPrintObserver<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintObserver").finish_non_exhaustive()
    }
}

impl PrettyPrintObserver {
    /// Creates an observer that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an observer that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> PrettyPrintObserver<W> {
    /// Creates an observer that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the observer and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }
}

fn describe(s: &ProgressSnapshot) -> String {
    let mut line = if s.indeterminate {
        format!("{} done, total unknown", s.completed)
    } else {
        format!(
            "{}/{} ({:.1}%)",
            s.completed,
            s.total,
            s.fraction_completed() * 100.0
        )
    };
    if s.finished {
        line.push_str(" finished");
    }
    line
}

impl<W: Write + Send> ProgressObserver for PrettyPrintObserver<W> {
    fn on_total_count_updated(&self, e: &ProgressEvent) {
        let _ = writeln!(
            self.writer.lock(),
            "[total] node={} {}",
            e.node,
            describe(&e.snapshot),
        );
    }

    fn on_fraction_updated(&self, e: &ProgressEvent) {
        let _ = writeln!(
            self.writer.lock(),
            "[fraction] node={} {}",
            e.node,
            describe(&e.snapshot),
        );
    }
}
