//! The mutation algorithms, written once against `&mut EntityState`.
//!
//! Every function returns whether it changed the state and only touches a
//! branch (`ids` or `entities`) when it actually writes to it. Writes go
//! through `Rc::make_mut`, so a branch still shared with another state is
//! copied on first write and mutated in place afterwards. Pure mode and
//! draft mode differ only in who else holds the branches (see `draft`).

use crate::entity::{Entity, Update};
use crate::entity_state::EntityState;
use crate::redirects::Redirects;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashSet;
use std::rc::Rc;

macro_rules! debug_check {
    ($state:expr) => {
        debug_assert!(
            $state.check_invariants().is_ok(),
            "entity state invariant broken: {:?}",
            $state.check_invariants()
        )
    };
}

pub(crate) fn add_one<K, R, S>(state: &mut EntityState<K, R, S>, key: K, record: R) -> bool
where
    K: Clone + Eq + Hash,
    S: BuildHasher + Clone,
{
    if state.contains_key(&key) {
        return false;
    }
    state.ids_mut().push(key.clone());
    state.entities_mut().insert(key, Rc::new(record));
    true
}

pub(crate) fn add_many<K, R, S, F, I>(state: &mut EntityState<K, R, S>, select_key: &F, records: I) -> bool
where
    K: Clone + Eq + Hash,
    S: BuildHasher + Clone,
    F: Fn(&R) -> K,
    I: IntoIterator<Item = R>,
{
    let mut added = 0usize;
    for record in records {
        let key = select_key(&record);
        if add_one(state, key, record) {
            added += 1;
        }
    }
    tracing::trace!(added, "add_many");
    debug_check!(state);
    added > 0
}

pub(crate) fn set_one<K, R, S>(state: &mut EntityState<K, R, S>, key: K, record: R) -> bool
where
    K: Clone + Eq + Hash,
    S: BuildHasher + Clone,
{
    if !state.contains_key(&key) {
        state.ids_mut().push(key.clone());
    }
    state.entities_mut().insert(key, Rc::new(record));
    true
}

pub(crate) fn set_many<K, R, S, F, I>(state: &mut EntityState<K, R, S>, select_key: &F, records: I) -> bool
where
    K: Clone + Eq + Hash,
    S: BuildHasher + Clone,
    F: Fn(&R) -> K,
    I: IntoIterator<Item = R>,
{
    let mut changed = false;
    for record in records {
        let key = select_key(&record);
        changed |= set_one(state, key, record);
    }
    debug_check!(state);
    changed
}

pub(crate) fn set_all<K, R, S, F, I>(state: &mut EntityState<K, R, S>, select_key: &F, records: I) -> bool
where
    K: Clone + Eq + Hash,
    S: BuildHasher + Clone,
    F: Fn(&R) -> K,
    I: IntoIterator<Item = R>,
{
    let had_entries = !state.is_empty();
    if had_entries {
        state.clear_entries();
    }
    let added = add_many(state, select_key, records);
    had_entries || added
}

pub(crate) fn remove_one<K, R, S, Q>(state: &mut EntityState<K, R, S>, id: &Q) -> bool
where
    K: Clone + Eq + Hash + Borrow<Q>,
    S: BuildHasher + Clone,
    Q: ?Sized + Hash + Eq,
{
    if !state.contains_key(id) {
        return false;
    }
    state.entities_mut().remove(id);
    state.ids_mut().retain(|k| <K as Borrow<Q>>::borrow(k) != id);
    true
}

pub(crate) fn remove_many<K, R, S, I>(state: &mut EntityState<K, R, S>, ids: I) -> bool
where
    K: Clone + Eq + Hash,
    S: BuildHasher + Clone,
    I: IntoIterator<Item = K>,
{
    let mut doomed = HashSet::with_hasher(state.hasher().clone());
    for id in ids {
        if state.contains_key(&id) {
            doomed.insert(id);
        }
    }
    if doomed.is_empty() {
        return false;
    }
    let entities = state.entities_mut();
    for id in doomed.iter() {
        entities.remove(id);
    }
    state.ids_mut().retain(|k| !doomed.contains(k));
    tracing::trace!(removed = doomed.len(), "remove_many");
    debug_check!(state);
    true
}

pub(crate) fn remove_all<K, R, S>(state: &mut EntityState<K, R, S>) -> bool
where
    K: Clone + Eq + Hash,
    S: BuildHasher + Clone,
{
    if state.is_empty() {
        return false;
    }
    state.clear_entries();
    true
}

/// Apply `updates` in order against a state that stays consistent after
/// each step.
///
/// A descriptor whose id was renamed earlier in the batch is redirected to
/// the record's current key; a descriptor whose (redirected) id is absent is
/// skipped. Renaming onto a key that is already taken overwrites that
/// record: the renamed record keeps its own position and the overwritten
/// one leaves both `ids` and `entities`.
pub(crate) fn update_many<K, R, S, F, I>(state: &mut EntityState<K, R, S>, select_key: &F, updates: I) -> bool
where
    K: Clone + Eq + Hash,
    R: Entity,
    S: BuildHasher + Clone,
    F: Fn(&R) -> K,
    I: IntoIterator<Item = Update<K, R::Changes>>,
{
    let mut redirects = Redirects::with_hasher(state.hasher().clone());
    let mut applied = 0usize;
    let mut skipped = 0usize;

    for Update { id, changes } in updates {
        let current = redirects.resolve(&id);
        let Some(existing) = state.entity_map().get(&current) else {
            skipped += 1;
            continue;
        };
        let mut updated = R::clone(existing);
        updated.apply(changes);
        let key = select_key(&updated);

        let entities = state.entities_mut();
        if key != current {
            entities.remove(&current);
            if entities.contains_key(&key) {
                tracing::debug!("rename overwrites an existing entity");
                redirects.displace(key.clone());
            }
            redirects.rename(current, key.clone());
        }
        entities.insert(key, Rc::new(updated));
        applied += 1;
    }

    tracing::trace!(applied, skipped, "update_many");
    if applied == 0 {
        return false;
    }
    if redirects.relabels() {
        redirects.relabel(state.ids_mut());
    }
    debug_check!(state);
    true
}

pub(crate) fn upsert_one<K, R, S>(state: &mut EntityState<K, R, S>, key: K, record: R) -> bool
where
    K: Clone + Eq + Hash,
    R: Entity,
    S: BuildHasher + Clone,
{
    let Some(existing) = state.entity_map().get(&key) else {
        return add_one(state, key, record);
    };
    let mut merged = R::clone(existing);
    merged.absorb(record);
    state.entities_mut().insert(key, Rc::new(merged));
    true
}

pub(crate) fn upsert_many<K, R, S, F, I>(state: &mut EntityState<K, R, S>, select_key: &F, records: I) -> bool
where
    K: Clone + Eq + Hash,
    R: Entity,
    S: BuildHasher + Clone,
    F: Fn(&R) -> K,
    I: IntoIterator<Item = R>,
{
    let mut changed = false;
    for record in records {
        let key = select_key(&record);
        changed |= upsert_one(state, key, record);
    }
    debug_check!(state);
    changed
}
