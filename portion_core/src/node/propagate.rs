// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child-to-parent update propagation.

use alloc::boxed::Box;
use alloc::sync::Weak;
use alloc::vec::Vec;
use core::any::TypeId;

use super::values::Changes;
use super::{NodeState, Shared, Status};
use crate::fraction::Fraction;
use crate::id::NodeId;
use crate::log::{debug, trace, warn};
use crate::observe::{ProgressEvent, ProgressEventKind};
use crate::properties::Contribution;

/// A child's new aggregate fraction.
#[derive(Clone, Copy, Debug)]
pub(super) struct FractionUpdate {
    value: Fraction,
    finished: bool,
}

/// Everything a node tells its parent after one update.
pub(super) struct Report {
    version: u64,
    fraction: Option<FractionUpdate>,
    properties: Vec<Box<dyn Contribution>>,
}

/// A report addressed to a parent slot.
pub(super) struct Forward {
    parent: Weak<Shared>,
    position: usize,
    report: Report,
}

/// Outcome of an update on one node.
pub(super) struct Settled {
    pub(super) events: Vec<ProgressEvent>,
    pub(super) forward: Option<Forward>,
    /// Set when this update made the aggregate fall back to an approximation.
    overflowed: Option<Fraction>,
}

impl Settled {
    /// Logs the update. Called once the node's lock is released.
    #[cfg_attr(
        not(feature = "tracing"),
        expect(unused_variables, reason = "only read by the log macros")
    )]
    pub(super) fn log(&self, id: NodeId) {
        if let Some(fraction) = self.overflowed {
            warn!(
                node = %id,
                fraction = ?fraction,
                "progress overflowed exact arithmetic, continuing with an approximation"
            );
        }
        for e in &self.events {
            trace!(node = %id, kind = ?e.kind, snapshot = ?e.snapshot, "progress updated");
        }
    }
}

impl NodeState {
    /// Compares the state against `before`, collects observer events and
    /// builds the report for the parent.
    pub(super) fn settle(&mut self, id: NodeId, before: Status, changes: &Changes) -> Settled {
        let after = self.status();
        let moved = !before.same(&after);
        let overflowed = (after.aggregate.is_overflowed() && !before.aggregate.is_overflowed())
            .then_some(after.aggregate);

        let mut events = Vec::new();
        if changes.total_updated || moved {
            let snapshot = self.snapshot();
            if changes.total_updated {
                events.push(ProgressEvent {
                    node: id,
                    kind: ProgressEventKind::TotalCountUpdated,
                    snapshot,
                });
            }
            if moved {
                events.push(ProgressEvent {
                    node: id,
                    kind: ProgressEventKind::FractionUpdated,
                    snapshot,
                });
            }
        }

        let fraction = moved.then_some(FractionUpdate {
            value: after.aggregate,
            finished: after.finished,
        });
        let forward = if fraction.is_some() || !changes.properties.is_empty() {
            self.report(fraction, |state, version| {
                let finished = |position| state.slot_finished(position);
                changes
                    .properties
                    .iter()
                    .filter_map(|&key| state.properties.contribution(key, version, &finished))
                    .collect()
            })
        } else {
            None
        };
        Settled {
            events,
            forward,
            overflowed,
        }
    }

    /// Builds a report carrying the complete current state, for a parent
    /// that has never heard from this node.
    pub(super) fn full_report(&mut self) -> Option<Forward> {
        let status = self.status();
        let fraction = FractionUpdate {
            value: status.aggregate,
            finished: status.finished,
        };
        self.report(Some(fraction), |state, version| {
            state
                .properties
                .contributions(version, &|position| state.slot_finished(position))
        })
    }

    /// Builds the report that makes the parent absorb this node's portion,
    /// unless the node already finished.
    pub(super) fn abandon(&mut self) -> Option<Forward> {
        if self.is_finished() {
            return None;
        }
        let fraction = FractionUpdate {
            value: Fraction::ONE,
            finished: true,
        };
        self.report(Some(fraction), |_, _| Vec::new())
    }

    fn report(
        &mut self,
        fraction: Option<FractionUpdate>,
        properties: impl FnOnce(&Self, u64) -> Vec<Box<dyn Contribution>>,
    ) -> Option<Forward> {
        let link = self.parent.as_ref()?;
        let (parent, position) = (link.node.clone(), link.position);
        self.version += 1;
        let properties = properties(self, self.version);
        Some(Forward {
            parent,
            position,
            report: Report {
                version: self.version,
                fraction,
                properties,
            },
        })
    }

    /// Folds a child's report into this node.
    fn accept(&mut self, position: usize, report: Report) -> Accepted {
        let Report {
            version,
            fraction,
            properties,
        } = report;
        let absorbed = fraction.is_some_and(|update| self.accept_fraction(position, version, update));
        let mut properties: Vec<TypeId> = properties
            .into_iter()
            .filter_map(|contribution| contribution.install(&mut self.properties, position))
            .collect();
        if absorbed {
            // The finished slot now folds in through `terminate`, which can
            // change every summary this node reports.
            properties = self.properties.keys().collect();
        }
        Accepted {
            properties,
            absorbed,
        }
    }

    /// Applies a child's new fraction. Returns whether the child's portion
    /// was absorbed.
    fn accept_fraction(&mut self, position: usize, version: u64, update: FractionUpdate) -> bool {
        let total = self.total.unwrap_or(0);
        let Some(slot) = self.children.get_mut(position) else {
            return false;
        };
        if slot.finished || version <= slot.version {
            return false;
        }
        slot.version = version;
        let multiple = Fraction::new(slot.portion, total);
        let previous = core::mem::replace(&mut slot.last, update.value);
        if !previous.is_indeterminate() {
            self.children_fraction = self.children_fraction - previous * multiple;
        }
        if update.finished {
            slot.finished = true;
            self.completed = self.completed.saturating_add(slot.portion);
            return true;
        }
        if !update.value.is_indeterminate() {
            self.children_fraction = self.children_fraction + update.value * multiple;
        }
        false
    }
}

/// What a parent took from one child report.
struct Accepted {
    /// Property types whose summary on the parent may have changed.
    properties: Vec<TypeId>,
    /// Whether the child's slot finished and was absorbed.
    absorbed: bool,
}

/// Delivers reports up the tree, one ancestor at a time.
///
/// Each ancestor is locked only while its own state is updated, and its
/// observers run after that lock is released.
pub(super) fn forward(mut next: Option<Forward>) {
    while let Some(Forward {
        parent,
        position,
        report,
    }) = next.take()
    {
        let Some(parent) = parent.upgrade() else {
            trace!(position, "parent is gone, dropping report");
            break;
        };
        let (settled, absorbed) = {
            let mut state = parent.state.lock();
            let before = state.status();
            let accepted = state.accept(position, report);
            let changes = Changes {
                properties: accepted.properties,
                total_updated: false,
            };
            (state.settle(parent.id, before, &changes), accepted.absorbed)
        };
        if absorbed {
            debug!(node = %parent.id, position, "absorbed finished child");
        }
        settled.log(parent.id);
        parent.notify(&settled.events);
        next = settled.forward;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProgressNode;
    use crate::properties::Throughput;

    fn report(version: u64, value: Fraction, finished: bool) -> Report {
        Report {
            version,
            fraction: Some(FractionUpdate { value, finished }),
            properties: Vec::new(),
        }
    }

    #[test]
    fn stale_reports_are_ignored() {
        let mut state = NodeState::new(Some(2));
        let position = state.register_child(2);
        state.accept(position, report(2, Fraction::new(3, 4), false));
        state.accept(position, report(1, Fraction::new(1, 4), false));
        assert_eq!(state.aggregate(), Fraction::new(3, 4));
    }

    #[test]
    fn reports_after_absorption_are_ignored() {
        let mut state = NodeState::new(Some(4));
        let position = state.register_child(2);
        state.accept(position, report(1, Fraction::new(1, 2), false));
        state.accept(position, report(2, Fraction::ONE, true));
        state.accept(position, report(3, Fraction::new(1, 2), false));
        assert_eq!(state.completed, 2);
        assert_eq!(state.aggregate(), Fraction::new(1, 2));
    }

    #[test]
    fn absorbing_a_child_resends_every_property() {
        let mut state = NodeState::new(Some(2));
        state.properties.set::<Throughput>(3);
        let position = state.register_child(1);

        let accepted = state.accept(position, report(1, Fraction::new(1, 2), false));
        assert!(!accepted.absorbed);
        assert!(accepted.properties.is_empty());

        let accepted = state.accept(position, report(2, Fraction::ONE, true));
        assert!(accepted.absorbed);
        assert_eq!(accepted.properties, [TypeId::of::<Throughput>()]);
    }

    #[test]
    fn unchanged_state_sends_nothing() {
        let root = ProgressNode::new(Some(1));
        let child = root.subprogress(1).start(Some(2));
        let mut state = child.inner.state.lock();
        let before = state.status();
        let settled = state.settle(child.inner.id, before, &Changes::default());
        assert!(settled.events.is_empty());
        assert!(settled.forward.is_none());
    }

    #[test]
    fn finishing_without_moving_the_aggregate_still_reports() {
        let mut state = NodeState::new(Some(2));
        let position = state.register_child(1);
        state.accept(position, report(1, Fraction::new(1, 1), false));
        state.completed = 1;
        let before = state.status();
        assert!(!before.finished);
        state.accept(position, report(2, Fraction::ONE, true));
        let after = state.status();
        assert!(after.finished);
        assert_eq!(before.aggregate, after.aggregate);
        assert!(!before.same(&after));
    }

    #[test]
    fn abandoning_a_root_or_finished_node_sends_nothing() {
        let mut root = NodeState::new(Some(1));
        assert!(root.abandon().is_none());
        let mut done = NodeState::new(Some(1));
        done.completed = 1;
        assert!(done.abandon().is_none());
    }
}
