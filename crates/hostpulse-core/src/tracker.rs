//! Dynamic entity tracking for disks, sensor groups and power outlets.
//!
//! An [`EntityTracker`] owns the sorted, navigable list of entity names for a
//! family plus the currently selected one. Each tick the family hands it the
//! names present in the snapshot; the returned [`Reconciliation`] says which
//! entities appeared or vanished so the family can create or destroy the
//! matching windows.

use std::collections::BTreeSet;

use crate::window::WindowStore;

/// Outcome of one reconcile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Newly seen entities, sorted.
    pub added: Vec<String>,
    /// Entities no longer present, sorted.
    pub removed: Vec<String>,
    pub selection_changed: bool,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && !self.selection_changed
    }

    /// Mirror the entity churn into `store`.
    ///
    /// `channels` maps an entity name to the channel keys it owns.
    pub fn apply<F>(&self, store: &mut WindowStore, channels: F)
    where
        F: Fn(&str) -> Vec<String>,
    {
        for entity in &self.removed {
            for key in channels(entity) {
                store.destroy_channel(&key);
            }
        }
        for entity in &self.added {
            for key in channels(entity) {
                store.create_channel(&key);
            }
        }
    }
}

/// Names in `current` but not `previous`, and names in `previous` but not `current`.
pub fn diff(previous: &[String], current: &[String]) -> (Vec<String>, Vec<String>) {
    let prev: BTreeSet<&String> = previous.iter().collect();
    let cur: BTreeSet<&String> = current.iter().collect();
    let added = cur.difference(&prev).map(|s| (*s).clone()).collect();
    let removed = prev.difference(&cur).map(|s| (*s).clone()).collect();
    (added, removed)
}

/// Sorted entity list with a selection cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTracker {
    entities: Vec<String>,
    selected: Option<String>,
}

impl EntityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker over `names`, selecting the first in sorted order.
    pub fn with_entities<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entities = normalize(names.into_iter().map(Into::into));
        let selected = entities.first().cloned();
        Self { entities, selected }
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.binary_search_by(|e| e.as_str().cmp(name)).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Replace the entity list with `current` and repair the selection.
    ///
    /// If the selected entity disappeared, the first remaining entity takes
    /// over. An empty list clears the selection.
    pub fn reconcile<I, S>(&mut self, current: I) -> Reconciliation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let current = normalize(current.into_iter().map(Into::into));
        let (added, removed) = diff(&self.entities, &current);
        self.entities = current;

        let before = self.selected.clone();
        let still_valid = self
            .selected
            .as_deref()
            .is_some_and(|s| self.contains(s));
        if !still_valid {
            self.selected = self.entities.first().cloned();
        }
        let selection_changed = before != self.selected;

        if !added.is_empty() || !removed.is_empty() {
            log::debug!("entities: +{added:?} -{removed:?} selected={:?}", self.selected);
        }

        Reconciliation {
            added,
            removed,
            selection_changed,
        }
    }

    /// Select `name` if it is tracked. Returns whether the selection changed.
    pub fn select(&mut self, name: &str) -> bool {
        if !self.contains(name) || self.selected.as_deref() == Some(name) {
            return false;
        }
        self.selected = Some(name.to_string());
        true
    }

    /// Advance the selection cyclically.
    pub fn next(&mut self) -> bool {
        self.step(1)
    }

    pub fn previous(&mut self) -> bool {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> bool {
        let n = self.entities.len();
        if n == 0 {
            return false;
        }
        let idx = self
            .selected
            .as_deref()
            .and_then(|s| self.entities.iter().position(|e| e == s));
        let next = match idx {
            Some(i) => (i as isize + delta).rem_euclid(n as isize) as usize,
            None => 0,
        };
        let changed = idx != Some(next);
        self.selected = Some(self.entities[next].clone());
        changed
    }
}

fn normalize(names: impl Iterator<Item = String>) -> Vec<String> {
    let set: BTreeSet<String> = names.collect();
    set.into_iter().collect()
}
