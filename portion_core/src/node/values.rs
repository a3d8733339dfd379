// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scoped read-write access to one node's values.

use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;
use core::time::Duration;

use super::{NodeState, units};
use crate::properties::{
    CompletedByteCount, CompletedFileCount, EstimatedTimeRemaining, FileName, Property,
    Throughput, TotalByteCount, TotalFileCount,
};

/// What a mutator changed, for propagation after the lock is released.
#[derive(Debug, Default)]
pub(super) struct Changes {
    pub(super) properties: Vec<TypeId>,
    pub(super) total_updated: bool,
}

/// Exclusive access to a node's counts and own property values.
///
/// Handed out by [`ProgressNode::with_properties`](crate::ProgressNode::with_properties).
/// Changes take effect immediately on the node and reach its ancestors once
/// the mutator returns.
pub struct ProgressValues<'a> {
    state: &'a mut NodeState,
    changes: &'a mut Changes,
}

impl fmt::Debug for ProgressValues<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressValues")
            .field("completed", &self.state.completed)
            .field("total", &self.state.total)
            .field("changes", &*self.changes)
            .finish_non_exhaustive()
    }
}

macro_rules! builtin_accessors {
    ($($property:ident: $get:ident, $set:ident -> $ty:ty;)*) => {
        $(
            #[doc = concat!("Returns this node's own [`", stringify!($property), "`](crate::properties::", stringify!($property), ").")]
            #[must_use]
            pub fn $get(&self) -> $ty {
                self.get::<$property>()
            }

            #[doc = concat!("Sets this node's own [`", stringify!($property), "`](crate::properties::", stringify!($property), ").")]
            pub fn $set(&mut self, value: $ty) {
                self.set::<$property>(value);
            }
        )*
    };
}

impl<'a> ProgressValues<'a> {
    pub(super) fn new(state: &'a mut NodeState, changes: &'a mut Changes) -> Self {
        Self { state, changes }
    }

    /// Returns the node's total, or `None` if indeterminate.
    #[must_use]
    pub fn total_count(&self) -> Option<u64> {
        self.state.total_count()
    }

    /// Replaces the node's total. See
    /// [`ProgressNode::set_total_count`](crate::ProgressNode::set_total_count).
    ///
    /// # Panics
    ///
    /// Panics if `total_count` exceeds `i64::MAX`.
    pub fn set_total_count(&mut self, total_count: Option<u64>) {
        let total = total_count.map(units);
        if self.state.total == total {
            return;
        }
        self.state.set_total(total);
        self.changes.total_updated = true;
    }

    /// Returns the node's completed count.
    #[must_use]
    pub fn completed_count(&self) -> u64 {
        self.state.completed_count()
    }

    /// Replaces the node's completed count.
    ///
    /// # Panics
    ///
    /// Panics if `completed_count` exceeds `i64::MAX`.
    pub fn set_completed_count(&mut self, completed_count: u64) {
        self.state.completed = units(completed_count);
    }

    pub(super) fn add_completed(&mut self, units: i64) {
        self.state.completed = self.state.completed.saturating_add(units);
    }

    /// Returns the node's own value of property `P`.
    #[must_use]
    pub fn get<P: Property>(&self) -> P::Value {
        self.state.properties.value::<P>()
    }

    /// Sets the node's own value of property `P`.
    pub fn set<P: Property>(&mut self, value: P::Value) {
        if self.state.properties.set::<P>(value) {
            let key = TypeId::of::<P>();
            if !self.changes.properties.contains(&key) {
                self.changes.properties.push(key);
            }
        }
    }

    builtin_accessors! {
        TotalFileCount: total_file_count, set_total_file_count -> u64;
        CompletedFileCount: completed_file_count, set_completed_file_count -> u64;
        TotalByteCount: total_byte_count, set_total_byte_count -> u64;
        CompletedByteCount: completed_byte_count, set_completed_byte_count -> u64;
        Throughput: throughput, set_throughput -> u64;
        EstimatedTimeRemaining: estimated_time_remaining, set_estimated_time_remaining -> Duration;
        FileName: file_name, set_file_name -> Option<String>;
    }
}
