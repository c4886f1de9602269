//! EntityAdapter: the public operation set over `EntityState`.

use crate::draft::Target;
use crate::entity::{Entity, Update};
use crate::entity_state::{EntityState, InvariantError};
use crate::mutations;
use crate::records::Records;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;

/// Mutation operations for collections of `R` keyed by `K`.
///
/// Each operation takes a `Target`: pass `&state` to get a new state back,
/// or `&mut draft` inside `produce` to mutate the draft. When an operation
/// has nothing to do, pure mode returns a state pointer-equal to the input.
///
/// ```
/// use entity_adapter::{EntityAdapter, EntityState};
/// use serde_json::json;
///
/// let books = EntityAdapter::new(|b: &serde_json::Value| b["id"].as_str().unwrap_or_default().to_string());
/// let empty: EntityState<String, serde_json::Value> = books.initial_state();
/// let one = books.add_one(&empty, json!({"id": "tgg", "title": "The Great Gatsby"}));
/// assert_eq!(one.ids(), &["tgg".to_string()]);
/// assert!(books.add_one(&one, json!({"id": "tgg"})).ptr_eq(&one));
/// ```
pub struct EntityAdapter<R, K, F> {
    select_key: F,
    _marker: PhantomData<fn(&R) -> K>,
}

impl<R, K, F> EntityAdapter<R, K, F>
where
    R: Entity,
    K: Clone + Eq + Hash,
    F: Fn(&R) -> K,
{
    pub fn new(select_key: F) -> Self {
        Self {
            select_key,
            _marker: PhantomData,
        }
    }

    pub fn select_key(&self, record: &R) -> K {
        (self.select_key)(record)
    }

    pub fn initial_state(&self) -> EntityState<K, R> {
        EntityState::new()
    }

    pub fn initial_state_with(&self, records: impl Into<Records<K, R>>) -> EntityState<K, R> {
        self.set_all(&EntityState::new(), records)
    }

    /// Check the id/entity bijection and that every record selects the key
    /// it is stored under.
    pub fn validate<S>(&self, state: &EntityState<K, R, S>) -> Result<(), InvariantError>
    where
        S: BuildHasher,
    {
        state.check_invariants()?;
        for (position, (id, record)) in state.iter().enumerate() {
            if self.select_key(record) != *id {
                return Err(InvariantError::KeyMismatch { position });
            }
        }
        Ok(())
    }

    /// Insert `record` unless its key is already present.
    pub fn add_one<T>(&self, target: T, record: R) -> T::Output
    where
        T: Target<K, R>,
        T::Hasher: BuildHasher + Clone,
    {
        let key = self.select_key(&record);
        target.run(|state| mutations::add_one(state, key, record))
    }

    /// `add_one` for each record, in input order.
    pub fn add_many<T>(&self, target: T, records: impl Into<Records<K, R>>) -> T::Output
    where
        T: Target<K, R>,
        T::Hasher: BuildHasher + Clone,
    {
        let records = records.into();
        target.run(|state| mutations::add_many(state, &self.select_key, records))
    }

    /// Insert `record`, or replace the stored record with the same key
    /// without merging.
    pub fn set_one<T>(&self, target: T, record: R) -> T::Output
    where
        T: Target<K, R>,
        T::Hasher: BuildHasher + Clone,
    {
        let key = self.select_key(&record);
        target.run(|state| mutations::set_one(state, key, record))
    }

    pub fn set_many<T>(&self, target: T, records: impl Into<Records<K, R>>) -> T::Output
    where
        T: Target<K, R>,
        T::Hasher: BuildHasher + Clone,
    {
        let records = records.into();
        target.run(|state| mutations::set_many(state, &self.select_key, records))
    }

    /// Replace every record; `ids` follows input order. Indices are kept.
    pub fn set_all<T>(&self, target: T, records: impl Into<Records<K, R>>) -> T::Output
    where
        T: Target<K, R>,
        T::Hasher: BuildHasher + Clone,
    {
        let records = records.into();
        target.run(|state| mutations::set_all(state, &self.select_key, records))
    }

    pub fn remove_one<T, Q>(&self, target: T, id: &Q) -> T::Output
    where
        T: Target<K, R>,
        T::Hasher: BuildHasher + Clone,
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        target.run(|state| mutations::remove_one(state, id))
    }

    /// Remove every listed id that is present; unknown ids are ignored.
    pub fn remove_many<T>(&self, target: T, ids: impl IntoIterator<Item = K>) -> T::Output
    where
        T: Target<K, R>,
        T::Hasher: BuildHasher + Clone,
    {
        target.run(|state| mutations::remove_many(state, ids))
    }

    pub fn remove_all<T>(&self, target: T) -> T::Output
    where
        T: Target<K, R>,
        T::Hasher: BuildHasher + Clone,
    {
        target.run(|state| mutations::remove_all(state))
    }

    /// Merge `update.changes` into the record stored under `update.id`.
    /// A missing id is a no-op. If the merged record selects a different
    /// key, the record is relabeled in place and keeps its position.
    pub fn update_one<T>(&self, target: T, update: Update<K, R::Changes>) -> T::Output
    where
        T: Target<K, R>,
        T::Hasher: BuildHasher + Clone,
    {
        target.run(|state| mutations::update_many(state, &self.select_key, [update]))
    }

    /// Apply `updates` in order as one batch. Later descriptors see the
    /// effect of earlier ones: an id renamed earlier in the batch resolves
    /// to the record's new key.
    pub fn update_many<T>(
        &self,
        target: T,
        updates: impl IntoIterator<Item = Update<K, R::Changes>>,
    ) -> T::Output
    where
        T: Target<K, R>,
        T::Hasher: BuildHasher + Clone,
    {
        target.run(|state| mutations::update_many(state, &self.select_key, updates))
    }

    /// Insert `record`, or merge it over the stored record (`Entity::absorb`).
    pub fn upsert_one<T>(&self, target: T, record: R) -> T::Output
    where
        T: Target<K, R>,
        T::Hasher: BuildHasher + Clone,
    {
        let key = self.select_key(&record);
        target.run(|state| mutations::upsert_one(state, key, record))
    }

    pub fn upsert_many<T>(&self, target: T, records: impl Into<Records<K, R>>) -> T::Output
    where
        T: Target<K, R>,
        T::Hasher: BuildHasher + Clone,
    {
        let records = records.into();
        target.run(|state| mutations::upsert_many(state, &self.select_key, records))
    }
}
