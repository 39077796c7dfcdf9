//! Growable list of owned phone numbers.
//!
//! Used both as the per-node payload of the tries and as the result sequence
//! handed back by lookups.

use std::collections::TryReserveError;
use std::fmt;
use std::ops::Index;

use thiserror::Error;

use crate::alloc;
use crate::symbol;

/// Returned by [`NumberList::append`] when the list could not grow.
///
/// Carries the rejected number back to the caller; the list is unchanged.
#[derive(Debug, Error)]
#[error("cannot append {number:?}: {source}")]
pub struct AppendError {
    pub number: String,
    #[source]
    pub source: TryReserveError,
}

impl AppendError {
    pub fn into_inner(self) -> String {
        self.number
    }
}

/// Outcome of a removal from a [`NumberList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Removal {
    /// Nothing matched.
    Missing,
    /// Something was removed and the list still has entries.
    Kept,
    /// The list is now empty; its owner should drop it.
    Emptied,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct NumberList {
    items: Vec<String>,
}

impl NumberList {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            items: Vec::with_capacity(n),
        }
    }

    pub(crate) fn try_with_capacity(n: usize) -> Result<Self, TryReserveError> {
        Ok(Self {
            items: alloc::vec_with_capacity(n)?,
        })
    }

    /// Append `number`, doubling the capacity when full.
    pub fn append(&mut self, number: String) -> Result<(), AppendError> {
        match alloc::grow_one(&mut self.items) {
            Ok(()) => {
                self.items.push(number);
                Ok(())
            }
            Err(source) => Err(AppendError { number, source }),
        }
    }

    /// Guarantee that the next [`append_reserved`](Self::append_reserved)
    /// does not allocate.
    pub(crate) fn reserve_one(&mut self) -> Result<(), TryReserveError> {
        alloc::grow_one(&mut self.items)
    }

    pub(crate) fn append_reserved(&mut self, number: String) {
        debug_assert!(self.items.len() < self.items.capacity());
        self.items.push(number);
    }

    /// Remove the first entry equal to `number`, keeping the order of the rest.
    pub fn remove_value(&mut self, number: &str) -> Removal {
        let Some(pos) = self.items.iter().position(|n| symbol::are_equal(n, number)) else {
            return Removal::Missing;
        };
        self.items.remove(pos);
        self.after_removal()
    }

    /// Remove every entry that starts with `prefix`. Order is not preserved.
    pub fn remove_all_with_prefix(&mut self, prefix: &str) -> Removal {
        let before = self.items.len();
        let mut i = 0;
        while i < self.items.len() {
            if symbol::is_prefix_of(prefix, &self.items[i]) {
                self.items.swap_remove(i);
            } else {
                i += 1;
            }
        }
        if self.items.len() == before {
            return Removal::Missing;
        }
        self.after_removal()
    }

    fn after_removal(&self) -> Removal {
        if self.items.is_empty() {
            Removal::Emptied
        } else {
            Removal::Kept
        }
    }

    /// Sort by symbol order (`*` and `#` after `9`).
    pub fn sort(&mut self) {
        self.items.sort_unstable_by(|a, b| symbol::compare(a, b));
    }

    /// Drop adjacent duplicates. Only meaningful right after [`sort`](Self::sort).
    pub fn dedup(&mut self) {
        self.items.dedup();
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
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Number at `idx`, or `None` when out of range.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.items.get(idx).map(String::as_str)
    }

    #[inline]
    pub fn first(&self) -> Option<&str> {
        self.get(0)
    }

    pub fn contains(&self, number: &str) -> bool {
        self.items.iter().any(|n| symbol::are_equal(n, number))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.items.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }

    /// Heap bytes held by this list and its strings.
    pub fn memory_usage(&self) -> usize {
        self.items.capacity() * std::mem::size_of::<String>()
            + self.items.iter().map(String::capacity).sum::<usize>()
    }
}

impl fmt::Debug for NumberList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl Index<usize> for NumberList {
    type Output = str;

    fn index(&self, idx: usize) -> &str {
        &self.items[idx]
    }
}

impl IntoIterator for NumberList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a NumberList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl From<Vec<String>> for NumberList {
    fn from(items: Vec<String>) -> Self {
        Self { items }
    }
}

impl<S: Into<String>> FromIterator<S> for NumberList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}
