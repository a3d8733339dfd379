// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed metadata that aggregates up the progress tree.
//!
//! A *property* is a marker type implementing [`Property`]. Each node holds
//! at most one value per property (its *own* value), plus, for every child
//! slot, the last summary that child reported for its own subtree. Summaries
//! are folded through the property's algebra:
//!
//! ```text
//! summary = default_summary
//!         ⊕ reduce(own value)
//!         ⊕ for each child slot:
//!               summary = merge(summary, child summary)        (child running)
//!               summary = terminate(summary, child summary)    (child finished)
//! ```
//!
//! A child's summary already has its own finished children terminated, so a
//! finished descendant is accounted for once, at its direct parent.
//!
//! This keeps counting properties ([`TotalByteCount`], [`CompletedFileCount`],
//! ...) additive across the whole tree, while properties such as
//! [`Throughput`] or [`FileName`] can let finished children drop out.
//!
//! # Example
//!
//! ```rust
//! use portion_core::ProgressNode;
//! use portion_core::properties::TotalByteCount;
//!
//! let overall = ProgressNode::new(Some(2));
//! let a = overall.subprogress(1).start(Some(10));
//! let b = overall.subprogress(1).start(Some(10));
//! a.with_properties(|v| v.set_total_byte_count(100));
//! b.with_properties(|v| v.set_total_byte_count(100));
//! assert_eq!(overall.summary::<TotalByteCount>(), 200);
//! ```

mod builtin;
mod store;

pub use builtin::{
    CompletedByteCount, CompletedFileCount, EstimatedTimeRemaining, FileName, Throughput,
    TotalByteCount, TotalFileCount,
};
pub(crate) use store::{Contribution, PropertyStore};

/// A kind of metadata carried by progress nodes and summarized up the tree.
///
/// Implementors are usually uninhabited or unit marker types; the property
/// is identified by the implementing type itself.
///
/// `merge` must be associative, and every method must accept the
/// `default_summary` as a neutral input: slots whose child never set a value
/// are skipped, so summaries must not depend on every child contributing.
pub trait Property: 'static {
    /// The per-node value.
    type Value: Clone + PartialEq + Send + Sync + 'static;

    /// The aggregated result of [`ProgressNode::summary`](crate::ProgressNode::summary).
    ///
    /// Children send their summaries to their parent, so summaries must be
    /// shareable across threads.
    type Summary: Clone + Send + Sync + 'static;

    /// The value a node reports when it never set one.
    fn default_value() -> Self::Value;

    /// The starting point of every fold.
    fn default_summary() -> Self::Summary;

    /// Folds one value into a summary.
    fn reduce(into: &mut Self::Summary, value: &Self::Value);

    /// Combines the summary so far with the summary of a running child.
    fn merge(lhs: Self::Summary, rhs: Self::Summary) -> Self::Summary;

    /// Combines the summary so far with the summary of a finished child.
    fn terminate(parent: Self::Summary, child: Self::Summary) -> Self::Summary;
}
