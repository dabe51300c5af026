// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Strongly Typed Arena Indices
//!
//! Phantom-typed wrappers around `usize` that address the entities of the
//! sectioning arena. A `SectionId` can never be used to look up a `Student`,
//! even though both compile down to a plain `usize`.
//!
//! `IndexVec<I, V>` is the matching storage: a `Vec<V>` that can only be
//! indexed with the id type it was declared for. Entities are pushed once while
//! the model is built and the returned id stays stable for the model's
//! lifetime.
//!
//! ## Usage
//!
//! ```rust
//! use sectioning_core::index::{IndexVec, TypedIndex, TypedIndexTag};
//!
//! #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
//! struct SectionTag;
//! impl TypedIndexTag for SectionTag { const NAME: &'static str = "SectionId"; }
//! type SectionId = TypedIndex<SectionTag>;
//!
//! let mut limits: IndexVec<SectionId, i32> = IndexVec::new();
//! let lecture = limits.push(30);
//! assert_eq!(limits[lecture], 30);
//! assert_eq!(format!("{}", lecture), "SectionId(0)");
//! ```

use std::marker::PhantomData;

/// A trait to tag typed indices with a name for debugging and display purposes.
pub trait TypedIndexTag: Clone {
    const NAME: &'static str;
}

/// A strongly typed index that is associated with a specific tag type `T`.
#[repr(transparent)]
pub struct TypedIndex<T> {
    index: usize,
    _marker: PhantomData<T>,
}

// Manual impls: deriving would put the bounds on `T` instead of the index.
impl<T> Clone for TypedIndex<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedIndex<T> {}

impl<T> PartialEq for TypedIndex<T> {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for TypedIndex<T> {}

impl<T> PartialOrd for TypedIndex<T> {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedIndex<T> {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> std::hash::Hash for TypedIndex<T> {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> TypedIndex<T> {
    /// Creates a new `TypedIndex` with the given `usize` index.
    #[inline(always)]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Returns the underlying `usize` index.
    #[inline(always)]
    pub const fn get(&self) -> usize {
        self.index
    }
}

impl<T> std::fmt::Debug for TypedIndex<T>
where
    T: TypedIndexTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> std::fmt::Display for TypedIndex<T>
where
    T: TypedIndexTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> From<usize> for TypedIndex<T> {
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

impl<T> From<TypedIndex<T>> for usize {
    fn from(typed_index: TypedIndex<T>) -> Self {
        typed_index.index
    }
}

/// Declares a tag type and the matching `TypedIndex` alias in one go.
///
/// ```rust
/// sectioning_core::typed_index!(
///     /// Index of a room.
///     RoomTag, RoomId
/// );
/// let room = RoomId::new(2);
/// assert_eq!(room.to_string(), "RoomId(2)");
/// ```
#[macro_export]
macro_rules! typed_index {
    ($(#[$meta:meta])* $tag:ident, $alias:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        pub struct $tag;

        impl $crate::index::TypedIndexTag for $tag {
            const NAME: &'static str = stringify!($alias);
        }

        $(#[$meta])*
        pub type $alias = $crate::index::TypedIndex<$tag>;
    };
}

/// A vector that can only be indexed by one typed index.
#[derive(Clone, PartialEq)]
pub struct IndexVec<I, V> {
    items: Vec<V>,
    _marker: PhantomData<I>,
}

impl<I, V> Default for IndexVec<I, V> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<I, V> std::fmt::Debug for IndexVec<I, V>
where
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T, V> IndexVec<TypedIndex<T>, V> {
    #[inline]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    /// Builds a vector of `len` clones of `value`.
    #[inline]
    pub fn from_elem(value: V, len: usize) -> Self
    where
        V: Clone,
    {
        Self {
            items: vec![value; len],
            _marker: PhantomData,
        }
    }

    /// Appends a value and returns the id under which it is stored.
    #[inline]
    pub fn push(&mut self, value: V) -> TypedIndex<T> {
        let id = TypedIndex::new(self.items.len());
        self.items.push(value);
        id
    }

    /// Returns the id the next `push` will hand out.
    #[inline]
    pub fn next_id(&self) -> TypedIndex<T> {
        TypedIndex::new(self.items.len())
    }

    #[inline]
    pub fn get(&self, id: TypedIndex<T>) -> Option<&V> {
        self.items.get(id.get())
    }

    #[inline]
    pub fn get_mut(&mut self, id: TypedIndex<T>) -> Option<&mut V> {
        self.items.get_mut(id.get())
    }

    #[inline]
    pub fn contains(&self, id: TypedIndex<T>) -> bool {
        id.get() < self.items.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.items.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, V> {
        self.items.iter_mut()
    }

    /// Iterates over `(id, value)` pairs in id order.
    #[inline]
    pub fn iter_enumerated(&self) -> impl Iterator<Item = (TypedIndex<T>, &V)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| (TypedIndex::new(i), v))
    }

    /// Iterates over every id of the vector.
    #[inline]
    pub fn ids(&self) -> impl Iterator<Item = TypedIndex<T>> + use<T, V> {
        (0..self.items.len()).map(TypedIndex::new)
    }

    #[inline]
    pub fn as_slice(&self) -> &[V] {
        &self.items
    }
}

impl<T, V> std::ops::Index<TypedIndex<T>> for IndexVec<TypedIndex<T>, V> {
    type Output = V;

    #[inline]
    fn index(&self, id: TypedIndex<T>) -> &V {
        &self.items[id.get()]
    }
}

impl<T, V> std::ops::IndexMut<TypedIndex<T>> for IndexVec<TypedIndex<T>, V> {
    #[inline]
    fn index_mut(&mut self, id: TypedIndex<T>) -> &mut V {
        &mut self.items[id.get()]
    }
}

impl<T, V> FromIterator<V> for IndexVec<TypedIndex<T>, V> {
    fn from_iter<It: IntoIterator<Item = V>>(iter: It) -> Self {
        Self {
            items: iter.into_iter().collect(),
            _marker: PhantomData,
        }
    }
}

impl<'a, T, V> IntoIterator for &'a IndexVec<TypedIndex<T>, V> {
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::typed_index!(StudentTag, StudentId);
    crate::typed_index!(RequestTag, RequestId);

    #[test]
    fn test_new_and_get() {
        let id = StudentId::new(10);
        assert_eq!(id.get(), 10);
    }

    #[test]
    fn test_conversions() {
        let id: RequestId = 42.into();
        assert_eq!(id.get(), 42);

        let raw: usize = id.into();
        assert_eq!(raw, 42);
    }

    #[test]
    fn test_debug_and_display_use_tag_name() {
        let id = StudentId::new(7);
        assert_eq!(format!("{}", id), "StudentId(7)");
        assert_eq!(format!("{:?}", id), "StudentId(7)");
    }

    #[test]
    fn test_ordering_follows_raw_index() {
        let mut ids = vec![RequestId::new(3), RequestId::new(1), RequestId::new(2)];
        ids.sort();
        assert_eq!(
            ids.iter().map(|i| i.get()).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_default_index_vec_is_empty() {
        let names: IndexVec<StudentId, String> = IndexVec::default();
        assert!(names.is_empty());
        assert_eq!(names.next_id(), StudentId::new(0));
    }

    #[test]
    fn test_index_vec_push_returns_stable_ids() {
        let mut names: IndexVec<StudentId, &str> = IndexVec::new();
        let a = names.push("ada");
        let b = names.push("bob");

        assert_eq!(a, StudentId::new(0));
        assert_eq!(b, StudentId::new(1));
        assert_eq!(names[b], "bob");
        assert_eq!(names.next_id(), StudentId::new(2));
        assert!(names.contains(a));
        assert!(!names.contains(StudentId::new(5)));
    }

    #[test]
    fn test_index_vec_enumerated_and_mutation() {
        let mut weights: IndexVec<RequestId, f64> = IndexVec::from_elem(1.0, 3);
        weights[RequestId::new(1)] = 2.5;

        let collected: Vec<(usize, f64)> = weights
            .iter_enumerated()
            .map(|(id, w)| (id.get(), *w))
            .collect();
        assert_eq!(collected, vec![(0, 1.0), (1, 2.5), (2, 1.0)]);
        assert_eq!(weights.ids().count(), 3);
    }
}
