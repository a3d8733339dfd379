// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical, thread-safe progress tracking.
//!
//! `portion_core` lets independent units of work report how far along they
//! are, and composes those reports into a tree. Each node reserves a
//! *portion* of its own total for each child; a child's fractional progress
//! counts toward its parent weighted by that portion. Any thread may update
//! any node at any time.
//!
//! # Architecture
//!
//! ```text
//!   ProgressNode::subprogress(n) ──► SubprogressToken ──► start(total) ──► child
//!                                         │
//!                                         └─ dropped unused: parent.complete(n)
//!
//!   child.complete(k) ──► child lock: recompute aggregate ──► report
//!                                                               │
//!                ┌──────────────────────────────────────────────┘
//!                ▼
//!   parent lock: fold delta into children fraction ──► report ──► ... root
//! ```
//!
//! **[`fraction`]**: Exact rational arithmetic that degrades to a sticky
//! floating-point approximation instead of overflowing.
//!
//! **[`properties`]**: Typed metadata (byte counts, file names, ...) that
//! each node sets for itself and that is summarized over whole subtrees
//! through a per-property reduce/merge/terminate algebra.
//!
//! **[`ProgressNode`]**: The tree node. Owns its counts, its child slots and
//! its property values, behind its own lock. See the [`node`] module docs
//! for the locking discipline.
//!
//! **[`SubprogressToken`]**: A single-use reservation that either becomes a
//! child or completes its portion when dropped.
//!
//! **[`ProgressNode::assign`]**: Links an existing node under another one,
//! after checking that the link cannot close a cycle.
//!
//! **[`observe`]**: [`ProgressObserver`] callbacks for collaborators that
//! mirror progress elsewhere.
//!
//! # Crate features
//!
//! - `tracing` (enabled by default): Emits diagnostics through the
//!   [`tracing`](https://docs.rs/tracing) crate. `trace` level for every
//!   propagated update, `debug` for structural changes and `warn` when a
//!   fraction first falls back to an approximation.
//!
//! # Panics
//!
//! Misuse is a programming error and panics rather than producing a progress
//! value that can never reach 100%: reserving zero units, linking a node
//! into a cycle, or combining two indeterminate fractions.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod fraction;
pub mod id;
mod log;
pub mod node;
pub mod observe;
pub mod properties;

pub use fraction::Fraction;
pub use id::NodeId;
pub use node::{ProgressNode, ProgressReporter, ProgressValues, SubprogressToken};
pub use observe::{
    NoopObserver, ProgressEvent, ProgressEventKind, ProgressObserver, ProgressSnapshot,
};
