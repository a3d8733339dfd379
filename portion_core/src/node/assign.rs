// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linking existing nodes into a tree.

use alloc::sync::Arc;

use parking_lot::Mutex;

use super::{ParentLink, ProgressNode, ProgressReporter, portion, propagate};
use crate::log::debug;

/// Held from the cycle check until the new parent link is in place.
static LINK_LOCK: Mutex<()> = parking_lot::const_mutex(());

impl ProgressNode {
    /// Reserves `count` units of this node's total for an existing node.
    ///
    /// The node viewed by `to` becomes a child of this node, exactly as if it
    /// had been started from a [`subprogress`](Self::subprogress) token. Its
    /// current progress and property values are folded in immediately.
    ///
    /// # Panics
    ///
    /// - `"cycle detected"` if `to` views this node or one of its ancestors.
    /// - `"node already has a parent"` if `to` views a node that is already
    ///   a child.
    /// - `"assigning zero units is not valid"` if `count` is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use portion_core::ProgressNode;
    ///
    /// let download = ProgressNode::new(Some(100));
    /// download.complete(50);
    ///
    /// let overall = ProgressNode::new(Some(2));
    /// overall.assign(1, &download.reporter());
    /// assert_eq!(overall.fraction_completed(), 0.25);
    /// ```
    pub fn assign(&self, count: u64, to: &ProgressReporter) {
        let portion = portion(count);
        let child = &to.inner;
        let forward = {
            let _link = LINK_LOCK.lock();

            let mut cursor = Some(Arc::clone(&self.inner));
            while let Some(node) = cursor {
                assert!(!Arc::ptr_eq(&node, child), "cycle detected");
                cursor = node
                    .state
                    .lock()
                    .parent
                    .as_ref()
                    .and_then(|link| link.node.upgrade());
            }
            assert!(
                child.state.lock().parent.is_none(),
                "node already has a parent"
            );

            let position = self.inner.state.lock().register_child(portion);
            let mut state = child.state.lock();
            state.parent = Some(ParentLink {
                node: Arc::downgrade(&self.inner),
                position,
            });
            debug!(
                parent = %self.inner.id,
                child = %child.id,
                position,
                portion,
                "assigned existing node"
            );
            state.full_report()
        };
        propagate::forward(forward);
    }
}

#[cfg(test)]
mod tests {
    use crate::ProgressNode;
    use crate::properties::TotalFileCount;

    #[test]
    fn assigned_node_brings_its_progress_and_properties() {
        let child = ProgressNode::new(Some(4));
        child.complete(1);
        child.with_properties(|v| v.set_total_file_count(3));

        let root = ProgressNode::new(Some(2));
        root.assign(2, &child.reporter());
        assert_eq!(root.fraction_completed(), 0.25);
        assert_eq!(root.summary::<TotalFileCount>(), 3);

        child.complete(3);
        assert!(root.is_finished());
    }

    #[test]
    fn finished_node_is_absorbed_on_assign() {
        let child = ProgressNode::new(Some(1));
        child.complete(1);
        let root = ProgressNode::new(Some(3));
        root.assign(1, &child.reporter());
        assert_eq!(root.completed_count(), 1);
    }

    #[test]
    #[should_panic(expected = "cycle detected")]
    fn assigning_to_self_panics() {
        let node = ProgressNode::new(Some(1));
        node.assign(1, &node.reporter());
    }

    #[test]
    #[should_panic(expected = "cycle detected")]
    fn assigning_an_ancestor_panics() {
        let root = ProgressNode::new(Some(1));
        let mid = root.subprogress(1).start(Some(1));
        let leaf = mid.subprogress(1).start(Some(1));
        leaf.assign(1, &root.reporter());
    }

    #[test]
    #[should_panic(expected = "node already has a parent")]
    fn assigning_an_attached_node_panics() {
        let a = ProgressNode::new(Some(1));
        let b = ProgressNode::new(Some(1));
        let child = a.subprogress(1).start(Some(1));
        b.assign(1, &child.reporter());
    }

    #[test]
    #[should_panic(expected = "assigning zero units is not valid")]
    fn assigning_zero_units_panics() {
        let a = ProgressNode::new(Some(1));
        let b = ProgressNode::new(Some(1));
        a.assign(0, &b.reporter());
    }
}
