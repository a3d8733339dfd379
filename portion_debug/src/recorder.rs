// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderObserver`] implements [`ProgressObserver`] and encodes events
//! into a `Vec<u8>` as fixed-size little-endian records, each stamped with
//! the nanoseconds elapsed since the recorder was created. [`decode`] reads
//! them back as an iterator of [`RecordedEvent`]; [`try_decode`] does the
//! same but reports malformed input instead of stopping at it.
//!
//! Record layout (34 bytes):
//!
//! ```text
//! tag: u8 | at_nanos: u64 | node: u64 | completed: i64 | total: i64 | flags: u8
//! ```

use std::time::Instant;

use parking_lot::Mutex;
use portion_core::{NodeId, ProgressEvent, ProgressEventKind, ProgressObserver, ProgressSnapshot};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_TOTAL_COUNT_UPDATED: u8 = 1;
const TAG_FRACTION_UPDATED: u8 = 2;

const FLAG_INDETERMINATE: u8 = 1 << 0;
const FLAG_FINISHED: u8 = 1 << 1;

/// Size of one encoded record, tag included.
pub const RECORD_LEN: usize = 1 + 8 + 8 + 8 + 8 + 1;

// ---------------------------------------------------------------------------
// RecorderObserver
// ---------------------------------------------------------------------------

/// A [`ProgressObserver`] that encodes events into a compact binary buffer.
#[derive(Debug)]
pub struct RecorderObserver {
    origin: Instant,
    buf: Mutex<Vec<u8>>,
}

impl Default for RecorderObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderObserver {
    /// Creates an empty recorder. Timestamps are relative to this call.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            buf: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of the bytes recorded so far.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.buf.lock().clone()
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_inner()
    }

    fn record(&self, e: &ProgressEvent) {
        let at_nanos = u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX);
        encode(&mut self.buf.lock(), at_nanos, e);
    }
}

impl ProgressObserver for RecorderObserver {
    fn on_total_count_updated(&self, e: &ProgressEvent) {
        self.record(e);
    }

    fn on_fraction_updated(&self, e: &ProgressEvent) {
        self.record(e);
    }
}

fn encode(buf: &mut Vec<u8>, at_nanos: u64, e: &ProgressEvent) {
    buf.push(match e.kind {
        ProgressEventKind::TotalCountUpdated => TAG_TOTAL_COUNT_UPDATED,
        ProgressEventKind::FractionUpdated => TAG_FRACTION_UPDATED,
    });
    buf.extend_from_slice(&at_nanos.to_le_bytes());
    buf.extend_from_slice(&e.node.get().to_le_bytes());
    buf.extend_from_slice(&e.snapshot.completed.to_le_bytes());
    buf.extend_from_slice(&e.snapshot.total.to_le_bytes());
    let mut flags = 0;
    if e.snapshot.indeterminate {
        flags |= FLAG_INDETERMINATE;
    }
    if e.snapshot.finished {
        flags |= FLAG_FINISHED;
    }
    buf.push(flags);
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Nanoseconds between recorder creation and the event.
    pub at_nanos: u64,
    /// The event as delivered to the recorder.
    pub event: ProgressEvent,
}

/// Malformed recording input.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The input ended in the middle of a record.
    #[error("recording truncated at byte {offset}")]
    Truncated {
        /// Offset of the incomplete record.
        offset: usize,
    },
    /// A record started with a tag this decoder does not know.
    #[error("unknown record tag {tag} at byte {offset}")]
    UnknownTag {
        /// The offending tag.
        tag: u8,
        /// Offset of the record.
        offset: usize,
    },
}

/// Decodes a byte slice produced by [`RecorderObserver`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first malformed record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Decodes a whole recording, failing on the first malformed record.
pub fn try_decode(bytes: &[u8]) -> Result<Vec<RecordedEvent>, DecodeError> {
    let mut iter = decode(bytes);
    std::iter::from_fn(|| iter.next_record()).collect()
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes: [u8; N] = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read().map(u64::from_le_bytes)
    }

    fn read_i64(&mut self) -> Option<i64> {
        self.read().map(i64::from_le_bytes)
    }

    fn next_record(&mut self) -> Option<Result<RecordedEvent, DecodeError>> {
        let offset = self.pos;
        let [tag] = self.read::<1>()?;
        let kind = match tag {
            TAG_TOTAL_COUNT_UPDATED => ProgressEventKind::TotalCountUpdated,
            TAG_FRACTION_UPDATED => ProgressEventKind::FractionUpdated,
            _ => {
                self.pos = self.data.len();
                return Some(Err(DecodeError::UnknownTag { tag, offset }));
            }
        };
        let record = self.decode_body(kind);
        if record.is_none() {
            self.pos = self.data.len();
        }
        Some(record.ok_or(DecodeError::Truncated { offset }))
    }

    fn decode_body(&mut self, kind: ProgressEventKind) -> Option<RecordedEvent> {
        let at_nanos = self.read_u64()?;
        let node = NodeId::from_raw(self.read_u64()?);
        let completed = self.read_i64()?;
        let total = self.read_i64()?;
        let [flags] = self.read::<1>()?;
        Some(RecordedEvent {
            at_nanos,
            event: ProgressEvent {
                node,
                kind,
                snapshot: ProgressSnapshot {
                    completed,
                    total,
                    indeterminate: flags & FLAG_INDETERMINATE != 0,
                    finished: flags & FLAG_FINISHED != 0,
                },
            },
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()?.ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use portion_core::ProgressNode;

    use super::*;

    fn sample(kind: ProgressEventKind, completed: i64, total: i64) -> ProgressEvent {
        ProgressEvent {
            node: NodeId::from_raw(3),
            kind,
            snapshot: ProgressSnapshot {
                completed,
                total,
                indeterminate: total == 0,
                finished: total > 0 && completed >= total,
            },
        }
    }

    #[test]
    fn records_are_fixed_size() {
        let mut buf = Vec::new();
        encode(&mut buf, 5, &sample(ProgressEventKind::FractionUpdated, 1, 2));
        assert_eq!(buf.len(), RECORD_LEN);
    }

    #[test]
    fn decodes_what_was_encoded() {
        let events = [
            sample(ProgressEventKind::TotalCountUpdated, 0, 0),
            sample(ProgressEventKind::FractionUpdated, 3, 4),
            sample(ProgressEventKind::FractionUpdated, 4, 4),
        ];
        let mut buf = Vec::new();
        for (at, e) in (10..).zip(&events) {
            encode(&mut buf, at, e);
        }
        let decoded: Vec<_> = decode(&buf).collect();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].at_nanos, 10);
        assert!(decoded[0].event.snapshot.indeterminate);
        assert_eq!(decoded[1].event, events[1]);
        assert!(decoded[2].event.snapshot.finished);
        assert_eq!(try_decode(&buf).unwrap(), decoded);
    }

    #[test]
    fn records_a_live_tree() {
        let recorder = Arc::new(RecorderObserver::new());
        let root = ProgressNode::new(Some(2));
        root.add_observer(recorder.clone());
        let child = root.subprogress(2).start(Some(2));
        child.complete(1);
        root.set_total_count(Some(4));

        let events = try_decode(&recorder.bytes()).unwrap();
        let kinds: Vec<_> = events.iter().map(|r| r.event.kind).collect();
        assert_eq!(
            kinds,
            [
                ProgressEventKind::FractionUpdated,
                ProgressEventKind::TotalCountUpdated,
                ProgressEventKind::FractionUpdated,
            ]
        );
        assert!(events.iter().all(|r| r.event.node == root.id()));
        assert!(events.windows(2).all(|w| w[0].at_nanos <= w[1].at_nanos));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0);
        assert_eq!(try_decode(&[]), Ok(Vec::new()));
    }

    #[test]
    fn truncated_record_is_reported() {
        let mut buf = Vec::new();
        encode(&mut buf, 0, &sample(ProgressEventKind::FractionUpdated, 1, 2));
        encode(&mut buf, 1, &sample(ProgressEventKind::FractionUpdated, 2, 2));
        buf.truncate(RECORD_LEN + 5);
        assert_eq!(decode(&buf).count(), 1);
        assert_eq!(
            try_decode(&buf),
            Err(DecodeError::Truncated { offset: RECORD_LEN })
        );
    }

    #[test]
    fn unknown_tag_is_reported() {
        let mut buf = vec![9];
        buf.extend_from_slice(&[0; RECORD_LEN - 1]);
        assert_eq!(decode(&buf).count(), 0);
        let err = try_decode(&buf).unwrap_err();
        assert_eq!(err, DecodeError::UnknownTag { tag: 9, offset: 0 });
        assert_eq!(err.to_string(), "unknown record tag 9 at byte 0");
    }
}
