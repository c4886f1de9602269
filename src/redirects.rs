//! Rename tracking for one `update_many` batch.
//!
//! Ids in `EntityState::ids` are left at their batch-start values while the
//! batch runs; this table records where each batch-start id went so that
//! (a) later descriptors naming an already-renamed id reach the record's
//! current key, and (b) `ids` can be relabeled in a single pass at the end.

use core::hash::{BuildHasher, Hash};
use hashbrown::{HashMap, HashSet};

pub(crate) struct Redirects<K, S> {
    /// batch-start id -> current key, for renamed records.
    current_of: HashMap<K, K, S>,
    /// current key -> batch-start id, for renamed records.
    origin_of: HashMap<K, K, S>,
    /// batch-start ids whose record was overwritten by a rename.
    displaced: HashSet<K, S>,
}

impl<K, S> Redirects<K, S>
where
    K: Clone + Eq + Hash,
    S: BuildHasher + Clone,
{
    pub(crate) fn with_hasher(hasher: S) -> Self {
        Self {
            current_of: HashMap::with_hasher(hasher.clone()),
            origin_of: HashMap::with_hasher(hasher.clone()),
            displaced: HashSet::with_hasher(hasher),
        }
    }

    /// The key a descriptor addressed to `id` should act on.
    pub(crate) fn resolve(&self, id: &K) -> K {
        self.current_of.get(id).unwrap_or(id).clone()
    }

    fn origin(&mut self, current: K) -> K {
        self.origin_of.remove(&current).unwrap_or(current)
    }

    /// The record stored under `current` is about to be overwritten.
    pub(crate) fn displace(&mut self, current: K) {
        let origin = self.origin(current);
        self.current_of.remove(&origin);
        self.displaced.insert(origin);
    }

    /// The record stored under `from` now lives under `to`.
    pub(crate) fn rename(&mut self, from: K, to: K) {
        let origin = self.origin(from);
        self.current_of.insert(origin.clone(), to.clone());
        self.origin_of.insert(to, origin);
    }

    /// Whether `relabel` would change anything.
    pub(crate) fn relabels(&self) -> bool {
        !self.displaced.is_empty() || self.current_of.iter().any(|(o, c)| o != c)
    }

    /// Rewrite batch-start ids to their final keys, dropping displaced ones.
    /// Positions of surviving ids are kept.
    pub(crate) fn relabel(&self, ids: &mut Vec<K>) {
        if !self.displaced.is_empty() {
            ids.retain(|id| !self.displaced.contains(id));
        }
        for id in ids.iter_mut() {
            if let Some(current) = self.current_of.get(id) {
                *id = current.clone();
            }
        }
    }
}
