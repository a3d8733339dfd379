// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for portion progress
//! trees.
//!
//! This crate provides [`ProgressObserver`](portion_core::ProgressObserver)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintObserver`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderObserver`]: compact binary recording with
//!   [`recorder::decode`] and [`recorder::try_decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes, one counter track per node.

pub mod chrome;
pub mod pretty;
pub mod recorder;
