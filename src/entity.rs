//! Record contract and change descriptors.

/// A record stored in an `EntityState`.
///
/// The collection never inspects a record structurally: keys come from the
/// adapter's key selector, and merges go through this trait. Records are
/// treated as immutable values; an update clones the stored record, merges
/// into the clone and stores the result as a new value.
pub trait Entity: Clone {
    /// Partial changes accepted by `update_one`/`update_many`.
    type Changes;

    /// Merge `changes` into `self`. Changes may alter the field the key
    /// selector reads, which turns the update into a rename.
    fn apply(&mut self, changes: Self::Changes);

    /// Merge a full incoming record over `self` for upserts; incoming fields
    /// win. Records with a fixed shape carry every field, so the default
    /// replaces the stored record.
    fn absorb(&mut self, incoming: Self) {
        *self = incoming;
    }
}

/// Change descriptor: apply `changes` to the record currently stored under `id`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Update<K, C> {
    pub id: K,
    pub changes: C,
}

impl<K, C> Update<K, C> {
    pub fn new(id: K, changes: C) -> Self {
        Self { id, changes }
    }
}

/// JSON objects merge shallowly: fields present in the incoming object
/// overwrite, all others are kept. Non-object values replace wholesale.
#[cfg(feature = "json")]
impl Entity for serde_json::Value {
    type Changes = serde_json::Value;

    fn apply(&mut self, changes: serde_json::Value) {
        match (self.as_object_mut(), changes) {
            (Some(fields), serde_json::Value::Object(incoming)) => {
                for (name, value) in incoming {
                    fields.insert(name, value);
                }
            }
            (_, other) => *self = other,
        }
    }

    fn absorb(&mut self, incoming: Self) {
        self.apply(incoming);
    }
}
