// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderObserver`](super::recorder::RecorderObserver)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//! Every node becomes a counter track showing its percentage complete; total
//! count changes appear as instant events on the node's thread row.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use portion_core::ProgressEventKind;
use serde_json::{Value, json};

use crate::recorder::try_decode;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidData`] if `bytes` is not a well-formed
/// recording, and any error produced by `writer`.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let recorded =
        try_decode(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut events: Vec<Value> = Vec::with_capacity(recorded.len());

    for r in recorded {
        let node = r.event.node.get();
        let ts = nanos_to_us(r.at_nanos);
        let s = r.event.snapshot;
        match r.event.kind {
            ProgressEventKind::FractionUpdated => {
                events.push(json!({
                    "ph": "C",
                    "name": format!("node {}", r.event.node),
                    "cat": "Progress",
                    "ts": ts,
                    "pid": 0,
                    "tid": node,
                    "args": {
                        "percent": s.fraction_completed() * 100.0,
                    }
                }));
            }
            ProgressEventKind::TotalCountUpdated => {
                events.push(json!({
                    "ph": "i",
                    "name": "TotalCountUpdated",
                    "cat": "Progress",
                    "ts": ts,
                    "pid": 0,
                    "tid": node,
                    "s": "t",
                    "args": {
                        "completed": s.completed,
                        "total": s.total,
                        "indeterminate": s.indeterminate,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}
