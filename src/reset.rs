use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::BuildHasher;

/// A trait for objects that can be handed out by a pool more than once.
///
/// The pool calls [`Reset::reset`] exactly once every time an object is
/// returned, before the object becomes available to the next caller. It is
/// never called while the object is checked out.
pub trait Reset {
    /// Restores the object to a clean, reusable baseline.
    ///
    /// Implementations should only touch the object itself; side effects
    /// visible to unrelated objects are not allowed.
    ///
    /// A panic here does not cost the pool an object: the object goes back
    /// as it is and the panic continues out of the release. A guard dropped
    /// while its thread is already unwinding cannot survive a second panic,
    /// so resets that can fail should not be used with guards.
    fn reset(&mut self);
}

impl<T> Reset for Vec<T> {
    #[inline(always)]
    fn reset(&mut self) {
        self.clear();
    }
}

impl<T> Reset for VecDeque<T> {
    #[inline(always)]
    fn reset(&mut self) {
        self.clear();
    }
}

impl Reset for String {
    #[inline(always)]
    fn reset(&mut self) {
        self.clear();
    }
}

impl<K, V, S: BuildHasher> Reset for HashMap<K, V, S> {
    #[inline(always)]
    fn reset(&mut self) {
        self.clear();
    }
}

impl<T, S: BuildHasher> Reset for HashSet<T, S> {
    #[inline(always)]
    fn reset(&mut self) {
        self.clear();
    }
}

impl<K, V> Reset for BTreeMap<K, V> {
    #[inline(always)]
    fn reset(&mut self) {
        self.clear();
    }
}

impl<T> Reset for BTreeSet<T> {
    #[inline(always)]
    fn reset(&mut self) {
        self.clear();
    }
}

impl<T: Reset + ?Sized> Reset for Box<T> {
    #[inline(always)]
    fn reset(&mut self) {
        (**self).reset();
    }
}
