// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notifications for collaborators outside the tree.
//!
//! A [`ProgressObserver`] attached to a node with
//! [`ProgressNode::add_observer`](crate::ProgressNode::add_observer) receives
//! a [`ProgressEvent`] whenever that node's total count is replaced or its
//! aggregate fraction changes, including changes that arrive from
//! descendants. All methods default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! Observers are always invoked with no node lock held. They may query any
//! node, including the one that fired the event.

use crate::fraction::Fraction;
use crate::id::NodeId;

/// A point-in-time `(completed, total)` view of a node's aggregate progress.
///
/// `completed / total` equals the node's aggregate fraction (own work plus
/// delegated work). For an indeterminate node `total` is zero and
/// `completed` is the node's own completed count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgressSnapshot {
    /// Numerator of the aggregate fraction.
    pub completed: i64,
    /// Denominator of the aggregate fraction, zero when indeterminate.
    pub total: i64,
    /// Whether the node's total count is unknown.
    pub indeterminate: bool,
    /// Whether the node is finished.
    pub finished: bool,
}

impl ProgressSnapshot {
    pub(crate) fn new(
        aggregate: Fraction,
        own_completed: i64,
        indeterminate: bool,
        finished: bool,
    ) -> Self {
        if aggregate.is_indeterminate() {
            Self {
                completed: own_completed,
                total: 0,
                indeterminate,
                finished,
            }
        } else {
            Self {
                completed: aggregate.completed(),
                total: aggregate.total(),
                indeterminate,
                finished,
            }
        }
    }

    /// Returns `completed / total`, or `0.0` when the total is zero.
    #[must_use]
    pub fn fraction_completed(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Which change an event reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgressEventKind {
    /// The node's total count was replaced.
    TotalCountUpdated,
    /// The node's aggregate fraction changed.
    FractionUpdated,
}

/// A change notification delivered to a [`ProgressObserver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressEvent {
    /// The node that changed.
    pub node: NodeId,
    /// What changed.
    pub kind: ProgressEventKind,
    /// The node's state right after the change.
    pub snapshot: ProgressSnapshot,
}

/// Receives change notifications from a progress node.
pub trait ProgressObserver: Send + Sync {
    /// Called after the node's total count was replaced.
    fn on_total_count_updated(&self, e: &ProgressEvent) {
        _ = e;
    }

    /// Called after the node's aggregate fraction changed.
    fn on_fraction_updated(&self, e: &ProgressEvent) {
        _ = e;
    }
}

/// A [`ProgressObserver`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Dispatches an event to the matching observer method.
pub(crate) fn dispatch(observer: &dyn ProgressObserver, e: &ProgressEvent) {
    match e.kind {
        ProgressEventKind::TotalCountUpdated => observer.on_total_count_updated(e),
        ProgressEventKind::FractionUpdated => observer.on_fraction_updated(e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn snapshot_of_indeterminate_keeps_own_count() {
        let snap = ProgressSnapshot::new(Fraction::INDETERMINATE, 3, true, false);
        assert_eq!(snap.completed, 3);
        assert_eq!(snap.total, 0);
        assert_eq!(snap.fraction_completed(), 0.0);
    }

    #[test]
    fn snapshot_uses_aggregate_pair() {
        let snap = ProgressSnapshot::new(Fraction::new(5, 10), 5, false, false);
        assert_eq!((snap.completed, snap.total), (5, 10));
        assert_eq!(snap.fraction_completed(), 0.5);
    }

    #[test]
    fn dispatch_routes_by_kind() {
        #[derive(Default)]
        struct Recording {
            kinds: Mutex<Vec<ProgressEventKind>>,
        }
        impl ProgressObserver for Recording {
            fn on_total_count_updated(&self, e: &ProgressEvent) {
                self.kinds.lock().unwrap().push(e.kind);
            }
            fn on_fraction_updated(&self, e: &ProgressEvent) {
                self.kinds.lock().unwrap().push(e.kind);
            }
        }

        let observer = Recording::default();
        let snapshot = ProgressSnapshot::new(Fraction::ZERO, 0, false, false);
        for kind in [
            ProgressEventKind::FractionUpdated,
            ProgressEventKind::TotalCountUpdated,
        ] {
            dispatch(
                &observer,
                &ProgressEvent {
                    node: NodeId::from_raw(1),
                    kind,
                    snapshot,
                },
            );
        }
        assert_eq!(
            *observer.kinds.lock().unwrap(),
            [
                ProgressEventKind::FractionUpdated,
                ProgressEventKind::TotalCountUpdated
            ]
        );
    }

    #[test]
    fn noop_observer_leaves_the_tree_untouched() {
        let root = crate::ProgressNode::new(Some(2));
        root.add_observer(alloc::sync::Arc::new(NoopObserver));
        let child = root.subprogress(1).start(Some(2));
        child.add_observer(alloc::sync::Arc::new(NoopObserver));
        child.complete(1);
        root.set_total_count(Some(4));
        assert_eq!(root.fraction(), Fraction::new(1, 8));
        child.complete(1);
        assert_eq!(root.completed_count(), 1);
        assert_eq!(root.fraction_completed(), 0.25);
    }
}
