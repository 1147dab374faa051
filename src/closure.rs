//! De-duplicating closure of artifacts to materialize
//!
//! Every resolution pass writes into one `ClosureSet`; the set only grows.
//! Insertion is safe from concurrent tasks.

use crate::domain::ArtifactWithRepoType;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Concurrent set of (artifact, repository type) pairs
#[derive(Debug, Default)]
pub struct ClosureSet {
    items: Mutex<HashSet<ArtifactWithRepoType>>,
}

impl ClosureSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> MutexGuard<'_, HashSet<ArtifactWithRepoType>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an item; returns false if an equal item was already present
    pub fn add(&self, item: ArtifactWithRepoType) -> bool {
        self.items().insert(item)
    }

    /// Insert many items; returns how many were new
    pub fn extend(&self, items: impl IntoIterator<Item = ArtifactWithRepoType>) -> usize {
        let mut guard = self.items();
        items
            .into_iter()
            .filter(|item| guard.insert(item.clone()))
            .count()
    }

    /// Merge every member of another set into this one
    pub fn union(&self, other: &ClosureSet) -> usize {
        self.extend(other.snapshot())
    }

    pub fn contains(&self, item: &ArtifactWithRepoType) -> bool {
        self.items().contains(item)
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Sorted copy of the current members
    pub fn snapshot(&self) -> Vec<ArtifactWithRepoType> {
        let mut items: Vec<_> = self.items().iter().cloned().collect();
        items.sort();
        items
    }

    pub fn into_inner(self) -> HashSet<ArtifactWithRepoType> {
        self.items.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FromIterator<ArtifactWithRepoType> for ClosureSet {
    fn from_iter<T: IntoIterator<Item = ArtifactWithRepoType>>(iter: T) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().collect()),
        }
    }
}
