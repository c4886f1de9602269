//! Dual-mode dispatch: pure states and drafts.
//!
//! `EntityAdapter` operations accept any `Target`. Handing one a
//! `&EntityState` runs the operation against a clone of the state's
//! branches and returns the new state (or the input, pointer-equal, when
//! nothing changed). Handing one a `&mut Draft` runs the same algorithm
//! directly on the draft.
//!
//! `produce` is the transaction: it clones `base` (three `Rc` bumps), lends
//! the recipe a `Draft` over that working copy, and returns it. A branch is
//! copied the first time the recipe writes to it, because `base` still
//! holds it; later writes in the same recipe find the branch unshared and
//! mutate it in place. Branches the recipe never writes stay shared with
//! `base`.

use crate::entity_state::EntityState;
use core::ops::Deref;

/// Something an adapter operation can run against.
pub trait Target<K, R> {
    type Hasher;
    type Output;

    /// Run `op`, which reports whether it changed the state.
    fn run<F>(self, op: F) -> Self::Output
    where
        F: FnOnce(&mut EntityState<K, R, Self::Hasher>) -> bool;
}

impl<'s, K, R, S> Target<K, R> for &'s EntityState<K, R, S> {
    type Hasher = S;
    type Output = EntityState<K, R, S>;

    fn run<F>(self, op: F) -> EntityState<K, R, S>
    where
        F: FnOnce(&mut EntityState<K, R, S>) -> bool,
    {
        let mut next = self.clone();
        if op(&mut next) {
            next
        } else {
            self.clone()
        }
    }
}

/// Mutable view of an `EntityState` inside `produce`.
///
/// Reads go through `Deref`; writes only through adapter operations, which
/// keep `ids` and `entities` in step.
pub struct Draft<'a, K, R, S> {
    state: &'a mut EntityState<K, R, S>,
}

impl<'a, K, R, S> Draft<'a, K, R, S> {
    /// Copy-on-write access to the reserved indices.
    pub fn indices_mut(&mut self) -> &mut crate::entity_state::Indices<K>
    where
        K: Clone,
    {
        self.state.indices_mut()
    }
}

impl<'a, K, R, S> Deref for Draft<'a, K, R, S> {
    type Target = EntityState<K, R, S>;

    fn deref(&self) -> &EntityState<K, R, S> {
        &*self.state
    }
}

impl<'d, 'a, K, R, S> Target<K, R> for &'d mut Draft<'a, K, R, S> {
    type Hasher = S;
    type Output = ();

    fn run<F>(self, op: F)
    where
        F: FnOnce(&mut EntityState<K, R, S>) -> bool,
    {
        op(&mut *self.state);
    }
}

/// Run `recipe` against a draft of `base` and commit the result.
pub fn produce<K, R, S, F>(base: &EntityState<K, R, S>, recipe: F) -> EntityState<K, R, S>
where
    F: FnOnce(Draft<'_, K, R, S>),
{
    let mut working = base.clone();
    recipe(Draft {
        state: &mut working,
    });
    working
}
