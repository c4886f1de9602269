//! entity-adapter: a normalized collection of uniquely-keyed records, kept
//! as an ordered id list plus an id -> record map, with a closed set of
//! mutations that keep the two in step.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one implementation of each mutation, usable both as a pure
//!   function over immutable states and as in-place edits on a draft.
//! - Layers:
//!   - EntityState<K, R, S>: `ids`, `entities` and reserved `indices`,
//!     each behind its own `Rc`. Cloning is three refcount bumps.
//!   - mutations: the algorithms, written against `&mut EntityState` and
//!     reporting whether they changed anything. All writes go through
//!     `Rc::make_mut`.
//!   - draft: `Target` picks the mode. `&EntityState` clones the branches,
//!     runs the algorithm and returns the result (or the input on a no-op);
//!     `&mut Draft` runs the algorithm on the draft directly. `produce`
//!     is the transaction that hands out the draft and commits it.
//!   - EntityAdapter<R, K, F>: public API; resolves keys through the
//!     caller's key selector and dispatches to `mutations` via `Target`.
//!
//! Invariants
//! - Every id in `ids` appears once and has an entity; every entity has an
//!   id. Bulk operations `debug_assert!` this after running.
//! - A no-op returns a state whose branches are pointer-equal to the input.
//!   An update that does not rename leaves `ids` pointer-equal.
//! - A rename relabels the id in place; the record keeps its position.
//! - `indices` is never touched, including by `set_all`/`remove_all`.
//!
//! Batches
//! - `update_many` applies descriptors in order. Ids renamed earlier in the
//!   batch are redirected to the record's current key (see `redirects`).
//!   Renaming onto an occupied key overwrites that record, last write wins.
//!   `ids` is relabeled once at the end of the batch.
//! - `remove_many` filters `ids` against a set in one pass.
//!
//! Notes and non-goals
//! - Single-threaded: `Rc`, not `Arc`; states are `!Send`/`!Sync`.
//! - No sorted variant, selectors or persistence; the serialized shape
//!   (feature `serde`) is `{ ids, entities, indices }`.
//! - Records are never inspected structurally. Keys come from the key
//!   selector; merges go through `Entity`.

mod adapter_proptest;
pub mod draft;
mod entity;
mod entity_adapter;
mod entity_state;
mod mutations;
pub mod records;
mod redirects;

// Public surface
pub use draft::{produce, Draft, Target};
pub use entity::{Entity, Update};
pub use entity_adapter::EntityAdapter;
pub use entity_state::{EntityState, Indices, InvariantError};
pub use records::Records;
