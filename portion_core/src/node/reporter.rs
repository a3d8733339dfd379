// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only views of a node.

use alloc::sync::Arc;

use super::{NodeState, Shared};
use crate::fraction::Fraction;
use crate::id::NodeId;
use crate::observe::{ProgressObserver, ProgressSnapshot};
use crate::properties::Property;

/// A read-only handle to a [`ProgressNode`](crate::ProgressNode).
///
/// A reporter can query and observe a node but not change it. Handing out a
/// reporter lets the node's owner keep exclusive control over its progress
/// while other code displays it, or links it into another tree with
/// [`ProgressNode::assign`](crate::ProgressNode::assign).
///
/// A reporter keeps its node alive.
#[derive(Clone, Debug)]
pub struct ProgressReporter {
    pub(super) inner: Arc<Shared>,
}

impl ProgressReporter {
    pub(super) fn new(inner: Arc<Shared>) -> Self {
        Self { inner }
    }

    /// Returns the viewed node's identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Returns the viewed node's total, or `None` if indeterminate.
    #[must_use]
    pub fn total_count(&self) -> Option<u64> {
        self.inner.read(NodeState::total_count)
    }

    /// Returns the viewed node's completed count.
    #[must_use]
    pub fn completed_count(&self) -> u64 {
        self.inner.read(NodeState::completed_count)
    }

    /// Returns the viewed node's progress, `0.0` when indeterminate.
    #[must_use]
    pub fn fraction_completed(&self) -> f64 {
        self.inner.read(NodeState::fraction_completed)
    }

    /// Returns the viewed node's progress as an exact fraction.
    #[must_use]
    pub fn fraction(&self) -> Fraction {
        self.inner.read(NodeState::aggregate)
    }

    /// Returns whether the viewed node is finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.read(NodeState::is_finished)
    }

    /// Returns whether the viewed node's total is unknown.
    #[must_use]
    pub fn is_indeterminate(&self) -> bool {
        self.inner.read(|state| state.total.is_none())
    }

    /// Returns the viewed node's current `(completed, total)` pair.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.inner.read(NodeState::snapshot)
    }

    /// Summarizes property `P` over the viewed node and its descendants.
    #[must_use]
    pub fn summary<P: Property>(&self) -> P::Summary {
        self.inner.read(NodeState::summary::<P>)
    }

    /// Returns the viewed node's own value of property `P`.
    #[must_use]
    pub fn value<P: Property>(&self) -> P::Value {
        self.inner.read(|state| state.properties.value::<P>())
    }

    /// Registers an observer for the viewed node's changes.
    pub fn add_observer(&self, observer: Arc<dyn ProgressObserver>) {
        self.inner.add_observer(observer);
    }
}

#[cfg(test)]
mod tests {
    use crate::ProgressNode;
    use crate::properties::CompletedByteCount;

    #[test]
    fn reporter_tracks_the_node() {
        let node = ProgressNode::new(Some(4));
        let reporter = node.reporter();
        assert_eq!(reporter.id(), node.id());
        node.complete(2);
        node.with_properties(|v| v.set_completed_byte_count(10));
        assert_eq!(reporter.completed_count(), 2);
        assert_eq!(reporter.total_count(), Some(4));
        assert_eq!(reporter.fraction_completed(), 0.5);
        assert_eq!(reporter.snapshot(), node.snapshot());
        assert_eq!(reporter.value::<CompletedByteCount>(), 10);
        assert_eq!(reporter.summary::<CompletedByteCount>(), 10);
        assert!(!reporter.is_finished());
        assert!(!reporter.is_indeterminate());
    }

    #[test]
    fn reporter_keeps_the_node_alive() {
        let root = ProgressNode::new(Some(2));
        let child = root.subprogress(2).start(Some(2));
        let reporter = child.reporter();
        drop(child);
        assert_eq!(root.completed_count(), 0);
        drop(reporter);
        assert_eq!(root.completed_count(), 2);
    }
}
