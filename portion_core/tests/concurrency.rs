// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Progress trees updated from many threads at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use portion_core::properties::{CompletedByteCount, TotalByteCount};
use portion_core::{ProgressEvent, ProgressNode, ProgressObserver};

const WORKERS: u64 = 8;
const STEPS: u64 = 250;

#[test]
fn sibling_updates_sum_exactly() {
    let root = ProgressNode::new(Some(WORKERS));
    thread::scope(|s| {
        for _ in 0..WORKERS {
            let child = root.subprogress(1).start(Some(STEPS));
            s.spawn(move || {
                for _ in 0..STEPS {
                    child.complete(1);
                }
            });
        }
    });
    assert!(root.is_finished());
    assert_eq!(root.completed_count(), WORKERS);
    assert_eq!(root.fraction_completed(), 1.0);
}

#[test]
fn nested_subtrees_converge() {
    let root = ProgressNode::new(Some(2));
    let left = root.subprogress(1).start(Some(WORKERS));
    let right = root.subprogress(1).start(Some(WORKERS));
    thread::scope(|s| {
        for side in [&left, &right] {
            for _ in 0..WORKERS {
                let leaf = side.subprogress(1).start(Some(STEPS));
                s.spawn(move || {
                    for _ in 0..STEPS {
                        leaf.complete(1);
                    }
                });
            }
        }
    });
    assert!(left.is_finished());
    assert!(right.is_finished());
    assert!(root.is_finished());
}

#[test]
fn partial_progress_is_consistent_after_joins() {
    let root = ProgressNode::new(Some(WORKERS));
    let children: Vec<_> = (0..WORKERS)
        .map(|_| root.subprogress(1).start(Some(2 * STEPS)))
        .collect();
    thread::scope(|s| {
        for child in &children {
            s.spawn(move || {
                for _ in 0..STEPS {
                    child.complete(1);
                }
            });
        }
    });
    assert!(!root.is_finished());
    assert_eq!(root.fraction_completed(), 0.5);
}

#[test]
fn total_changes_race_with_finishing_children() {
    let root = ProgressNode::new(Some(16));
    thread::scope(|s| {
        for _ in 0..16 {
            let child = root.subprogress(1).start(Some(STEPS));
            s.spawn(move || {
                for _ in 0..STEPS {
                    child.complete(1);
                }
            });
        }
        s.spawn(|| {
            for i in 0..200 {
                root.set_total_count(Some(if i % 2 == 0 { 32 } else { 16 }));
            }
        });
    });
    root.set_total_count(Some(16));
    assert_eq!(root.completed_count(), 16);
    assert!(root.is_finished());
    assert_eq!(root.fraction_completed(), 1.0);
}

#[test]
fn dropped_tokens_from_many_threads_all_complete() {
    let root = ProgressNode::new(Some(WORKERS * 4));
    thread::scope(|s| {
        for _ in 0..WORKERS {
            s.spawn(|| {
                for _ in 0..4 {
                    drop(root.subprogress(1));
                }
            });
        }
    });
    assert!(root.is_finished());
}

#[test]
fn concurrent_property_updates_are_summed() {
    let root = ProgressNode::new(Some(WORKERS));
    thread::scope(|s| {
        for i in 1..=WORKERS {
            let child = root.subprogress(1).start(Some(STEPS));
            s.spawn(move || {
                child.with_properties(|v| v.set_total_byte_count(i * STEPS));
                for step in 1..=STEPS {
                    child.with_properties(|v| {
                        v.set_completed_byte_count(i * step);
                        v.set_completed_count(step);
                    });
                }
            });
        }
    });
    let expected: u64 = (1..=WORKERS).map(|i| i * STEPS).sum();
    assert_eq!(root.summary::<TotalByteCount>(), expected);
    assert_eq!(root.summary::<CompletedByteCount>(), expected);
    assert!(root.is_finished());
}

#[test]
fn concurrent_assigns_link_every_node() {
    let root = ProgressNode::new(Some(WORKERS));
    let leaves: Vec<_> = (0..WORKERS).map(|_| ProgressNode::new(Some(1))).collect();
    thread::scope(|s| {
        for leaf in &leaves {
            let root = &root;
            s.spawn(move || root.assign(1, &leaf.reporter()));
        }
    });
    for leaf in &leaves {
        leaf.complete(1);
    }
    assert!(root.is_finished());
}

#[test]
fn observers_run_without_locks_held() {
    #[derive(Default)]
    struct Counter {
        fired: AtomicUsize,
        root: std::sync::OnceLock<ProgressNode>,
    }
    impl ProgressObserver for Counter {
        fn on_fraction_updated(&self, _: &ProgressEvent) {
            if let Some(root) = self.root.get() {
                // Would deadlock if the root's lock were still held.
                let _ = root.fraction_completed();
            }
            self.fired.fetch_add(1, Ordering::Relaxed);
        }
    }

    let root = ProgressNode::new(Some(WORKERS));
    let counter = Arc::new(Counter::default());
    let _ = counter.root.set(root.clone());
    root.add_observer(counter.clone());
    thread::scope(|s| {
        for _ in 0..WORKERS {
            let child = root.subprogress(1).start(Some(STEPS));
            s.spawn(move || {
                for _ in 0..STEPS {
                    child.complete(1);
                }
            });
        }
    });
    assert!(root.is_finished());
    assert!(counter.fired.load(Ordering::Relaxed) > 0);
}
