// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-use reservations of a parent's units.

use alloc::sync::Arc;

use super::{ParentLink, ProgressNode};
use crate::log::debug;

/// A reserved portion of a parent's total, not yet handed to a child.
///
/// Obtained from [`ProgressNode::subprogress`]. Exactly one of two things
/// happens to every token:
///
/// - [`start`](Self::start) consumes it and attaches a new child node that
///   owns the reserved portion, or
/// - dropping it completes the reserved portion on the parent immediately,
///   so an abandoned reservation never keeps the parent below 100%.
///
/// # Example
///
/// ```rust
/// use portion_core::ProgressNode;
///
/// let root = ProgressNode::new(Some(10));
/// let skipped = root.subprogress(5);
/// drop(skipped);
/// assert_eq!(root.completed_count(), 5);
/// ```
#[derive(Debug)]
#[must_use = "dropping a token completes its portion of the parent"]
pub struct SubprogressToken {
    parent: ProgressNode,
    portion: i64,
    consumed: bool,
}

impl SubprogressToken {
    pub(super) fn new(parent: ProgressNode, portion: i64) -> Self {
        Self {
            parent,
            portion,
            consumed: false,
        }
    }

    /// Returns the number of parent units this token reserves.
    #[must_use]
    pub fn portion(&self) -> u64 {
        self.portion.unsigned_abs()
    }

    /// Consumes the token and attaches a new child node with the given total.
    ///
    /// # Panics
    ///
    /// Panics if `total_count` exceeds `i64::MAX`.
    pub fn start(mut self, total_count: Option<u64>) -> ProgressNode {
        let child = ProgressNode::new(total_count);
        let position = self.parent.inner.state.lock().register_child(self.portion);
        child.inner.state.lock().parent = Some(ParentLink {
            node: Arc::downgrade(&self.parent.inner),
            position,
        });
        debug!(
            parent = %self.parent.inner.id,
            child = %child.inner.id,
            position,
            portion = self.portion,
            "registered child"
        );
        self.consumed = true;
        child
    }
}

impl Drop for SubprogressToken {
    fn drop(&mut self) {
        if self.consumed {
            return;
        }
        debug!(
            parent = %self.parent.inner.id,
            portion = self.portion,
            "token dropped unused, completing its portion"
        );
        self.parent.complete_units(self.portion);
    }
}

#[cfg(test)]
mod tests {
    use crate::ProgressNode;

    #[test]
    fn dropped_token_completes_its_portion() {
        let root = ProgressNode::new(Some(8));
        let token = root.subprogress(5);
        assert_eq!(token.portion(), 5);
        assert_eq!(root.completed_count(), 0, "reserving changes nothing");
        drop(token);
        assert_eq!(root.completed_count(), 5);
        assert_eq!(root.fraction_completed(), 0.625);
    }

    #[test]
    fn started_token_does_not_complete() {
        let root = ProgressNode::new(Some(8));
        let child = root.subprogress(5).start(Some(1));
        assert_eq!(root.completed_count(), 0);
        child.complete(1);
        assert_eq!(root.completed_count(), 5);
    }

    #[test]
    fn children_get_consecutive_slots() {
        let root = ProgressNode::new(Some(3));
        let a = root.subprogress(1).start(None);
        let b = root.subprogress(1).start(None);
        let position = |node: &ProgressNode| {
            node.inner
                .state
                .lock()
                .parent
                .as_ref()
                .map(|link| link.position)
        };
        assert_eq!(position(&a), Some(0));
        assert_eq!(position(&b), Some(1));
        assert_eq!(root.inner.state.lock().children.len(), 2);
    }

    #[test]
    #[should_panic(expected = "assigning zero units is not valid")]
    fn zero_unit_subprogress_panics() {
        let root = ProgressNode::new(Some(1));
        let _token = root.subprogress(0);
    }
}
