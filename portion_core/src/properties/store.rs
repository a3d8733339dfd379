// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased per-node property storage.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use core::marker::PhantomData;
use std::collections::HashMap;

use super::Property;

/// All property values held by one node, keyed by property type.
#[derive(Default)]
pub(crate) struct PropertyStore {
    entries: HashMap<TypeId, Box<dyn ErasedEntry>>,
}

impl fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyStore")
            .field("properties", &self.entries.len())
            .finish()
    }
}

/// Values for one property: the node's own value plus the last summary
/// received from each child slot.
struct Entry<P: Property> {
    own: Option<P::Value>,
    /// Indexed by child slot position. Never shrinks.
    children: Vec<Option<SlotSummary<P::Summary>>>,
    _marker: PhantomData<fn() -> P>,
}

struct SlotSummary<S> {
    /// Version of the child update that produced `summary`.
    version: u64,
    summary: S,
}

impl<P: Property> Default for Entry<P> {
    fn default() -> Self {
        Self {
            own: None,
            children: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<P: Property> Entry<P> {
    /// Own value reduced, then each child slot merged in, or terminated if
    /// that child finished.
    fn summary(&self, is_finished: &dyn Fn(usize) -> bool) -> P::Summary {
        let mut summary = P::default_summary();
        if let Some(own) = &self.own {
            P::reduce(&mut summary, own);
        }
        for (position, slot) in self.children.iter().enumerate() {
            let Some(slot) = slot else {
                continue;
            };
            let child = slot.summary.clone();
            summary = if is_finished(position) {
                P::terminate(summary, child)
            } else {
                P::merge(summary, child)
            };
        }
        summary
    }
}

trait ErasedEntry: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn contribution(
        &self,
        version: u64,
        is_finished: &dyn Fn(usize) -> bool,
    ) -> Box<dyn Contribution>;
}

impl<P: Property> ErasedEntry for Entry<P> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn contribution(
        &self,
        version: u64,
        is_finished: &dyn Fn(usize) -> bool,
    ) -> Box<dyn Contribution> {
        Box::new(TypedContribution::<P> {
            version,
            summary: self.summary(is_finished),
            _marker: PhantomData,
        })
    }
}

/// A node's summary of one property, on its way to the parent's slot for
/// that node.
pub(crate) trait Contribution: Send {
    /// Stores the summary in `store` at child slot `position`.
    ///
    /// Returns the property's type id if the summary was newer than what the
    /// slot already held.
    fn install(self: Box<Self>, store: &mut PropertyStore, position: usize) -> Option<TypeId>;
}

struct TypedContribution<P: Property> {
    version: u64,
    summary: P::Summary,
    _marker: PhantomData<fn() -> P>,
}

impl<P: Property> Contribution for TypedContribution<P> {
    fn install(self: Box<Self>, store: &mut PropertyStore, position: usize) -> Option<TypeId> {
        let entry = store.entry_mut::<P>();
        if entry.children.len() <= position {
            entry.children.resize_with(position + 1, || None);
        }
        let slot = &mut entry.children[position];
        if slot.as_ref().is_some_and(|s| s.version >= self.version) {
            return None;
        }
        *slot = Some(SlotSummary {
            version: self.version,
            summary: self.summary,
        });
        Some(TypeId::of::<P>())
    }
}

impl PropertyStore {
    fn entry<P: Property>(&self) -> Option<&Entry<P>> {
        self.entries
            .get(&TypeId::of::<P>())
            .and_then(|e| e.as_any().downcast_ref::<Entry<P>>())
    }

    fn entry_mut<P: Property>(&mut self) -> &mut Entry<P> {
        let entry = self
            .entries
            .entry(TypeId::of::<P>())
            .or_insert_with(|| Box::new(Entry::<P>::default()));
        match entry.as_any_mut().downcast_mut::<Entry<P>>() {
            Some(entry) => entry,
            None => unreachable!("property entries are keyed by their own type"),
        }
    }

    /// Returns the node's own value, or the property default.
    pub(crate) fn value<P: Property>(&self) -> P::Value {
        self.entry::<P>()
            .and_then(|e| e.own.clone())
            .unwrap_or_else(P::default_value)
    }

    /// Replaces the node's own value. Returns whether it changed.
    pub(crate) fn set<P: Property>(&mut self, value: P::Value) -> bool {
        if self.value::<P>() == value {
            return false;
        }
        self.entry_mut::<P>().own = Some(value);
        true
    }

    /// Type ids of every property this node holds a value or summary for.
    pub(crate) fn keys(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.entries.keys().copied()
    }

    /// Summary of property `key`, tagged with `version`.
    pub(crate) fn contribution(
        &self,
        key: TypeId,
        version: u64,
        is_finished: &dyn Fn(usize) -> bool,
    ) -> Option<Box<dyn Contribution>> {
        self.entries
            .get(&key)
            .map(|e| e.contribution(version, is_finished))
    }

    /// Summaries of every property this node knows about.
    pub(crate) fn contributions(
        &self,
        version: u64,
        is_finished: &dyn Fn(usize) -> bool,
    ) -> Vec<Box<dyn Contribution>> {
        self.entries
            .values()
            .map(|e| e.contribution(version, is_finished))
            .collect()
    }

    /// Folds the node's own value and all child slots into a summary.
    ///
    /// `is_finished` reports whether the child at a slot position has
    /// finished; finished slots are folded with [`Property::terminate`].
    pub(crate) fn summary<P: Property>(&self, is_finished: impl Fn(usize) -> bool) -> P::Summary {
        match self.entry::<P>() {
            Some(entry) => entry.summary(&is_finished),
            None => P::default_summary(),
        }
    }
}
