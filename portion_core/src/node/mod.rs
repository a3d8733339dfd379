// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The progress tree.
//!
//! A [`ProgressNode`] tracks `completed` out of `total` units of its own work
//! plus the weighted progress of its children. A child is attached either by
//! consuming a [`SubprogressToken`] from [`ProgressNode::subprogress`], or by
//! linking an existing node with [`ProgressNode::assign`]. In both cases the
//! child receives a *portion* of the parent's total: when the child reports
//! `x` as its fraction, the parent counts `x * portion` units toward its own
//! total.
//!
//! # Locking
//!
//! Every node has its own lock. An update locks the node, applies the change,
//! releases the lock and only then locks the parent to fold in the change.
//! No two node locks are ever held at once, so concurrent updates in sibling
//! subtrees cannot deadlock. Each report carries a per-node version so a
//! parent ignores reports that arrive out of order.
//!
//! # Ownership
//!
//! Handles are reference counted. A parent never keeps its children alive.
//! When the last handle to an unfinished child is dropped, the parent treats
//! that child's portion as complete so the parent can still reach 100%.

mod assign;
mod propagate;
mod reporter;
mod token;
mod values;

pub use reporter::ProgressReporter;
pub use token::SubprogressToken;
pub use values::ProgressValues;

use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::fmt;

use parking_lot::{Mutex, MutexGuard};

use crate::fraction::Fraction;
use crate::id::NodeId;
use crate::log::debug;
use crate::observe::{ProgressEvent, ProgressObserver, ProgressSnapshot, dispatch};
use crate::properties::{Property, PropertyStore};
use values::Changes;

/// A node in a progress tree.
///
/// Cloning a `ProgressNode` yields another handle to the same node.
///
/// # Example
///
/// ```rust
/// use portion_core::ProgressNode;
///
/// let root = ProgressNode::new(Some(2));
///
/// let a = root.subprogress(1).start(Some(10));
/// a.complete(10);
/// assert_eq!(root.fraction_completed(), 0.5);
///
/// let b = root.subprogress(1).start(Some(7));
/// b.complete(7);
/// assert_eq!(root.fraction_completed(), 1.0);
/// assert!(root.is_finished());
/// ```
#[derive(Clone, Debug)]
pub struct ProgressNode {
    inner: Arc<Shared>,
}

/// State shared by every handle to one node.
pub(crate) struct Shared {
    id: NodeId,
    state: Mutex<NodeState>,
    observers: Mutex<Vec<Arc<dyn ProgressObserver>>>,
}

#[derive(Debug)]
struct NodeState {
    completed: i64,
    /// `None` while indeterminate.
    total: Option<i64>,
    /// Unfinished children's progress, in units of `total`.
    children_fraction: Fraction,
    parent: Option<ParentLink>,
    /// Append-only; positions index the property store's child lists.
    children: Vec<ChildSlot>,
    properties: PropertyStore,
    /// Bumped for every report sent to the parent.
    version: u64,
}

#[derive(Debug)]
struct ParentLink {
    node: Weak<Shared>,
    position: usize,
}

#[derive(Debug)]
struct ChildSlot {
    portion: i64,
    /// The child's aggregate fraction as of its last accepted report.
    last: Fraction,
    /// Version of the last accepted fraction report.
    version: u64,
    /// Set once the child's portion has been absorbed into `completed`.
    finished: bool,
}

/// The parts of a node's state that observers and the parent care about.
#[derive(Clone, Copy, Debug)]
struct Status {
    aggregate: Fraction,
    finished: bool,
    indeterminate: bool,
}

impl Status {
    fn same(&self, other: &Self) -> bool {
        let aggregate = self.aggregate == other.aggregate
            || (self.aggregate.is_indeterminate() && other.aggregate.is_indeterminate());
        aggregate && self.finished == other.finished && self.indeterminate == other.indeterminate
    }
}

impl NodeState {
    fn new(total: Option<i64>) -> Self {
        Self {
            completed: 0,
            total,
            children_fraction: Fraction::ZERO,
            parent: None,
            children: Vec::new(),
            properties: PropertyStore::default(),
            version: 0,
        }
    }

    /// Own work plus unfinished children's work, or indeterminate if the
    /// node has no positive total.
    fn aggregate(&self) -> Fraction {
        match self.total {
            Some(total) if total > 0 => Fraction::new(self.completed, total) + self.children_fraction,
            _ => Fraction::INDETERMINATE,
        }
    }

    fn is_finished(&self) -> bool {
        self.total.is_some_and(|total| total > 0 && self.completed >= total)
    }

    fn fraction_completed(&self) -> f64 {
        let aggregate = self.aggregate();
        if aggregate.is_indeterminate() {
            0.0
        } else {
            aggregate.fraction_completed()
        }
    }

    fn status(&self) -> Status {
        Status {
            aggregate: self.aggregate(),
            finished: self.is_finished(),
            indeterminate: self.total.is_none(),
        }
    }

    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::new(
            self.aggregate(),
            self.completed,
            self.total.is_none(),
            self.is_finished(),
        )
    }

    fn completed_count(&self) -> u64 {
        // Counts are only ever set from `u64`, so they are never negative.
        self.completed.unsigned_abs()
    }

    fn total_count(&self) -> Option<u64> {
        self.total.map(i64::unsigned_abs)
    }

    /// Replaces the total and re-expresses children's progress in the new
    /// unit.
    fn set_total(&mut self, total: Option<i64>) {
        let old = self.total.unwrap_or(0);
        self.total = total;
        let Some(new) = total.filter(|&total| total > 0) else {
            return;
        };
        if old > 0 {
            if old != new {
                self.children_fraction = self.children_fraction * Fraction::new(old, new);
            }
        } else {
            // Child reports received while the total was unusable were
            // only recorded in their slots.
            self.children_fraction = self
                .children
                .iter()
                .filter(|slot| !slot.finished && !slot.last.is_indeterminate())
                .fold(Fraction::ZERO, |sum, slot| {
                    sum + slot.last * Fraction::new(slot.portion, new)
                });
        }
    }

    fn register_child(&mut self, portion: i64) -> usize {
        self.children.push(ChildSlot {
            portion,
            last: Fraction::INDETERMINATE,
            version: 0,
            finished: false,
        });
        self.children.len() - 1
    }

    /// Whether the child at `position` has been absorbed.
    fn slot_finished(&self, position: usize) -> bool {
        self.children.get(position).is_some_and(|slot| slot.finished)
    }

    fn summary<P: Property>(&self) -> P::Summary {
        self.properties
            .summary::<P>(|position| self.slot_finished(position))
    }
}

impl Shared {
    fn new(total: Option<i64>) -> Self {
        Self {
            id: NodeId::next(),
            state: Mutex::new(NodeState::new(total)),
            observers: Mutex::new(Vec::new()),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&NodeState) -> R) -> R {
        f(&self.state.lock())
    }

    fn add_observer(&self, observer: Arc<dyn ProgressObserver>) {
        self.observers.lock().push(observer);
    }

    /// Delivers events to this node's observers. Must be called with no
    /// node lock held.
    fn notify(&self, events: &[ProgressEvent]) {
        if events.is_empty() {
            return;
        }
        let observers = self.observers.lock().clone();
        for e in events {
            for observer in &observers {
                dispatch(observer.as_ref(), e);
            }
        }
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Shared");
        s.field("id", &self.id);
        match self.state.try_lock() {
            Some(state) => s.field("state", &*state),
            None => s.field("state", &format_args!("<locked>")),
        };
        s.field("observers", &self.observers.lock().len());
        s.finish()
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let Some(forward) = state.abandon() {
            debug!(node = %self.id, "node dropped before finishing, parent absorbs its portion");
            propagate::forward(Some(forward));
        }
    }
}

/// Converts a public count into the signed unit used by fractions.
fn units(count: u64) -> i64 {
    match i64::try_from(count) {
        Ok(units) => units,
        Err(_) => panic!("count exceeds i64::MAX"),
    }
}

/// Converts a count of parent units reserved for a child.
fn portion(count: u64) -> i64 {
    assert!(count > 0, "assigning zero units is not valid");
    units(count)
}

impl ProgressNode {
    /// Creates a root node. A `None` total makes the node indeterminate.
    ///
    /// # Panics
    ///
    /// Panics if `total_count` exceeds `i64::MAX`.
    #[must_use]
    pub fn new(total_count: Option<u64>) -> Self {
        Self {
            inner: Arc::new(Shared::new(total_count.map(units))),
        }
    }

    /// Returns this node's identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Reserves `count` units of this node's total for a child that does not
    /// exist yet.
    ///
    /// Nothing changes until the token is consumed: starting it attaches a
    /// new child node, dropping it completes the `count` units directly.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero or exceeds `i64::MAX`.
    pub fn subprogress(&self, count: u64) -> SubprogressToken {
        SubprogressToken::new(self.clone(), portion(count))
    }

    /// Marks `count` more units of this node's own work as completed.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds `i64::MAX`.
    pub fn complete(&self, count: u64) {
        self.complete_units(units(count));
    }

    fn complete_units(&self, units: i64) {
        self.update(|values| values.add_completed(units));
    }

    /// Replaces this node's total. `None` makes the node indeterminate.
    ///
    /// Progress already reported by unfinished children keeps its weight
    /// relative to the new total. Finished children have been absorbed into
    /// the completed count and are unaffected.
    ///
    /// # Panics
    ///
    /// Panics if `total_count` exceeds `i64::MAX`.
    pub fn set_total_count(&self, total_count: Option<u64>) {
        self.update(|values| values.set_total_count(total_count));
    }

    /// Returns this node's total, or `None` if indeterminate.
    #[must_use]
    pub fn total_count(&self) -> Option<u64> {
        self.inner.read(NodeState::total_count)
    }

    /// Returns the units of this node's own work completed so far, including
    /// the portions of finished children.
    #[must_use]
    pub fn completed_count(&self) -> u64 {
        self.inner.read(NodeState::completed_count)
    }

    /// Returns own plus delegated progress as a number, `0.0` when
    /// indeterminate.
    ///
    /// Not clamped: completing more than the total reports more than `1.0`.
    #[must_use]
    pub fn fraction_completed(&self) -> f64 {
        self.inner.read(NodeState::fraction_completed)
    }

    /// Returns own plus delegated progress as an exact fraction.
    #[must_use]
    pub fn fraction(&self) -> Fraction {
        self.inner.read(NodeState::aggregate)
    }

    /// Returns whether the total is positive and fully completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.read(NodeState::is_finished)
    }

    /// Returns whether the total is unknown.
    #[must_use]
    pub fn is_indeterminate(&self) -> bool {
        self.inner.read(|state| state.total.is_none())
    }

    /// Returns the current state as a `(completed, total)` pair.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.inner.read(NodeState::snapshot)
    }

    /// Summarizes property `P` over this node and all its descendants.
    #[must_use]
    pub fn summary<P: Property>(&self) -> P::Summary {
        self.inner.read(NodeState::summary::<P>)
    }

    /// Returns this node's own value of property `P`.
    #[must_use]
    pub fn value<P: Property>(&self) -> P::Value {
        self.inner.read(|state| state.properties.value::<P>())
    }

    /// Reads and modifies this node's values in one critical section.
    ///
    /// Changes made by `f` are propagated to the ancestors after it returns.
    /// `f` runs with this node locked and must not call back into this node.
    ///
    /// # Example
    ///
    /// ```rust
    /// use portion_core::ProgressNode;
    ///
    /// let node = ProgressNode::new(Some(4));
    /// node.with_properties(|v| {
    ///     v.set_completed_count(3);
    ///     v.set_file_name(Some("report.pdf".into()));
    /// });
    /// assert_eq!(node.fraction_completed(), 0.75);
    /// ```
    pub fn with_properties<R>(&self, f: impl FnOnce(&mut ProgressValues<'_>) -> R) -> R {
        self.update(f)
    }

    /// Registers an observer for this node's changes.
    pub fn add_observer(&self, observer: Arc<dyn ProgressObserver>) {
        self.inner.add_observer(observer);
    }

    /// Returns a read-only view of this node.
    #[must_use]
    pub fn reporter(&self) -> ProgressReporter {
        ProgressReporter::new(Arc::clone(&self.inner))
    }

    /// Applies `f` under this node's lock, then notifies observers and
    /// forwards the change toward the root.
    ///
    /// Whatever `f` changed is propagated even if `f` panics.
    fn update<R>(&self, f: impl FnOnce(&mut ProgressValues<'_>) -> R) -> R {
        let mut pending = PendingUpdate::new(&self.inner);
        f(&mut pending.values())
    }
}

/// An update in progress on one locked node. Settles and propagates on drop.
struct PendingUpdate<'a> {
    shared: &'a Shared,
    state: MutexGuard<'a, NodeState>,
    before: Status,
    changes: Changes,
}

impl<'a> PendingUpdate<'a> {
    fn new(shared: &'a Shared) -> Self {
        let state = shared.state.lock();
        let before = state.status();
        Self {
            shared,
            state,
            before,
            changes: Changes::default(),
        }
    }

    fn values(&mut self) -> ProgressValues<'_> {
        ProgressValues::new(&mut self.state, &mut self.changes)
    }
}

impl Drop for PendingUpdate<'_> {
    fn drop(&mut self) {
        let settled = self
            .state
            .settle(self.shared.id, self.before, &self.changes);
        let shared = self.shared;
        MutexGuard::unlocked(&mut self.state, || {
            settled.log(shared.id);
            shared.notify(&settled.events);
            propagate::forward(settled.forward);
        });
    }
}
