//! EntityState: the ordered-ids + keyed-entities pair, shared through `Rc`.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::HashMap;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Reserved secondary indices. Never read or written by the mutations;
/// every operation carries it forward unchanged.
pub type Indices<K> = BTreeMap<String, Vec<K>>;

/// A normalized collection: `ids` gives the order, `entities` maps each id
/// to its record, and the two always describe the same key set.
///
/// Each branch sits behind its own `Rc`, so cloning a state is cheap and
/// operations that leave a branch alone keep sharing it. Pointer equality
/// of the branches (`ptr_eq`, `shares_ids`, `shares_entities`) is how
/// callers detect "nothing changed".
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "K: serde::Serialize + Eq + Hash, R: serde::Serialize, S: BuildHasher",
        deserialize = "K: serde::Deserialize<'de> + Eq + Hash, R: serde::Deserialize<'de>, S: BuildHasher + Default"
    ))
)]
pub struct EntityState<K, R, S = DefaultHashBuilder> {
    ids: Rc<Vec<K>>,
    entities: Rc<HashMap<K, Rc<R>, S>>,
    indices: Rc<Indices<K>>,
}

/// A broken bijection between `ids` and `entities`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InvariantError {
    #[error("id at position {position} appears earlier in ids")]
    DuplicateId { position: usize },
    #[error("id at position {position} has no entity")]
    MissingEntity { position: usize },
    #[error("{count} entities are not listed in ids")]
    OrphanedEntity { count: usize },
    #[error("entity at position {position} selects a different key than its id")]
    KeyMismatch { position: usize },
}

impl<K, R> EntityState<K, R> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, R, S> EntityState<K, R, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            ids: Rc::new(Vec::new()),
            entities: Rc::new(HashMap::with_hasher(hasher)),
            indices: Rc::new(Indices::new()),
        }
    }

    /// Ids in collection order.
    pub fn ids(&self) -> &[K] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn indices(&self) -> &Indices<K> {
        &self.indices
    }

    pub fn hasher(&self) -> &S {
        self.entities.hasher()
    }

    /// True when all three branches are the same allocations, i.e. `other`
    /// is this state, not merely an equal one.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.shares_ids(other)
            && self.shares_entities(other)
            && Rc::ptr_eq(&self.indices, &other.indices)
    }

    pub fn shares_ids(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.ids, &other.ids)
    }

    pub fn shares_entities(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.entities, &other.entities)
    }

    pub(crate) fn entity_map(&self) -> &HashMap<K, Rc<R>, S> {
        &self.entities
    }
}

impl<K, R, S> EntityState<K, R, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn get<Q>(&self, id: &Q) -> Option<&R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entities.get(id).map(|r| &**r)
    }

    pub fn contains_key<Q>(&self, id: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entities.contains_key(id)
    }

    /// Entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &R)> + '_ {
        self.ids
            .iter()
            .filter_map(move |id| self.entities.get(id).map(|r| (id, &**r)))
    }

    /// Check that `ids` and `entities` describe the same key set with no
    /// duplicate ids. Deserialized states should be checked before use.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut seen = hashbrown::HashSet::with_capacity(self.ids.len());
        for (position, id) in self.ids.iter().enumerate() {
            if !seen.insert(id) {
                return Err(InvariantError::DuplicateId { position });
            }
            if !self.entities.contains_key(id) {
                return Err(InvariantError::MissingEntity { position });
            }
        }
        // Every id is unique and present, so any surplus entity is unlisted.
        if self.entities.len() > self.ids.len() {
            return Err(InvariantError::OrphanedEntity {
                count: self.entities.len() - self.ids.len(),
            });
        }
        Ok(())
    }

    /// Run `recipe` against a draft of this state and return the committed
    /// result. See `draft::produce`.
    pub fn produce<F>(&self, recipe: F) -> Self
    where
        F: FnOnce(crate::draft::Draft<'_, K, R, S>),
    {
        crate::draft::produce(self, recipe)
    }
}

impl<K, R, S> EntityState<K, R, S>
where
    K: Clone,
{
    /// Copy-on-write access to the reserved indices.
    pub fn indices_mut(&mut self) -> &mut Indices<K> {
        Rc::make_mut(&mut self.indices)
    }
}

impl<K, R, S> EntityState<K, R, S>
where
    K: Clone + Eq + Hash,
    S: BuildHasher + Clone,
{
    pub(crate) fn ids_mut(&mut self) -> &mut Vec<K> {
        Rc::make_mut(&mut self.ids)
    }

    pub(crate) fn entities_mut(&mut self) -> &mut HashMap<K, Rc<R>, S> {
        Rc::make_mut(&mut self.entities)
    }

    /// Swap in fresh, empty `ids`/`entities` branches; `indices` stays.
    pub(crate) fn clear_entries(&mut self) {
        let hasher = self.entities.hasher().clone();
        self.ids = Rc::new(Vec::new());
        self.entities = Rc::new(HashMap::with_hasher(hasher));
    }
}

impl<K, R, S> Clone for EntityState<K, R, S> {
    fn clone(&self) -> Self {
        Self {
            ids: Rc::clone(&self.ids),
            entities: Rc::clone(&self.entities),
            indices: Rc::clone(&self.indices),
        }
    }
}

impl<K, R, S: Default> Default for EntityState<K, R, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, R, S> PartialEq for EntityState<K, R, S>
where
    K: Eq + Hash,
    R: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids && self.entities == other.entities && self.indices == other.indices
    }
}

impl<K, R, S> Eq for EntityState<K, R, S>
where
    K: Eq + Hash,
    R: Eq,
    S: BuildHasher,
{
}

impl<K: fmt::Debug, R: fmt::Debug, S> fmt::Debug for EntityState<K, R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityState")
            .field("ids", &self.ids)
            .field("entities", &self.entities)
            .field("indices", &self.indices)
            .finish()
    }
}
