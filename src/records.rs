//! Bulk input for `add_many`, `set_all`, `set_many` and `upsert_many`.

use core::hash::Hash;
use indexmap::IndexMap;

/// Records given either as a list or as a map keyed by id.
///
/// Both forms iterate in order: the list as given, the map in insertion
/// order. Map keys are not trusted; every record's key is re-derived by the
/// adapter's key selector.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(untagged),
    serde(bound(
        serialize = "K: serde::Serialize + Eq + Hash, R: serde::Serialize",
        deserialize = "K: serde::Deserialize<'de> + Eq + Hash, R: serde::Deserialize<'de>"
    ))
)]
pub enum Records<K, R> {
    List(Vec<R>),
    Keyed(IndexMap<K, R>),
}

impl<K, R> Records<K, R> {
    pub fn len(&self) -> usize {
        match self {
            Records::List(v) => v.len(),
            Records::Keyed(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, R> PartialEq for Records<K, R>
where
    K: Hash + Eq,
    R: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Records::List(a), Records::List(b)) => a == b,
            (Records::Keyed(a), Records::Keyed(b)) => a == b,
            _ => false,
        }
    }
}

impl<K, R> From<Vec<R>> for Records<K, R> {
    fn from(v: Vec<R>) -> Self {
        Records::List(v)
    }
}

impl<K, R, const N: usize> From<[R; N]> for Records<K, R> {
    fn from(v: [R; N]) -> Self {
        Records::List(Vec::from(v))
    }
}

impl<K, R> From<IndexMap<K, R>> for Records<K, R>
where
    K: Hash + Eq,
{
    fn from(m: IndexMap<K, R>) -> Self {
        Records::Keyed(m)
    }
}

/// Owning iterator over the records in input order.
pub enum IntoIter<K, R> {
    List(std::vec::IntoIter<R>),
    Keyed(indexmap::map::IntoValues<K, R>),
}

impl<K, R> Iterator for IntoIter<K, R> {
    type Item = R;

    #[inline]
    fn next(&mut self) -> Option<R> {
        match self {
            IntoIter::List(it) => it.next(),
            IntoIter::Keyed(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            IntoIter::List(it) => it.size_hint(),
            IntoIter::Keyed(it) => it.size_hint(),
        }
    }
}

impl<K, R> IntoIterator for Records<K, R> {
    type Item = R;
    type IntoIter = IntoIter<K, R>;

    fn into_iter(self) -> IntoIter<K, R> {
        match self {
            Records::List(v) => IntoIter::List(v.into_iter()),
            Records::Keyed(m) => IntoIter::Keyed(m.into_values()),
        }
    }
}
