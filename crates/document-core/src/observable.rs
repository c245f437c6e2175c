//! Observable ordered collections.
//!
//! [`ObservableList`] is an ordered sequence that records every single-element mutation as a
//! [`ListChange`]. The owner drains the recorded changes with
//! [`ObservableList::take_changes`] and forwards them to whoever mirrors the list (a UI list
//! view, a problems panel, a test spy).

use crate::reconcile::{self, EditTarget};

/// A single index-based mutation of an [`ObservableList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange<T> {
    /// `item` was inserted at `index`.
    Inserted {
        /// Position of the new item after insertion.
        index: usize,
        /// The inserted item.
        item: T,
    },
    /// `item` was removed from `index`.
    Removed {
        /// Position the item occupied before removal.
        index: usize,
        /// The removed item.
        item: T,
    },
}

impl<T> ListChange<T> {
    /// Index affected by this change.
    pub fn index(&self) -> usize {
        match self {
            ListChange::Inserted { index, .. } | ListChange::Removed { index, .. } => *index,
        }
    }

    /// The inserted or removed item.
    pub fn item(&self) -> &T {
        match self {
            ListChange::Inserted { item, .. } | ListChange::Removed { item, .. } => item,
        }
    }

    /// Returns `true` for insertions.
    pub fn is_insert(&self) -> bool {
        matches!(self, ListChange::Inserted { .. })
    }
}

impl<T: Clone> ListChange<T> {
    /// Replay this change onto a mirror of the list.
    ///
    /// Changes must be applied in the order they were produced.
    pub fn apply_to(&self, mirror: &mut Vec<T>) {
        match self {
            ListChange::Inserted { index, item } => mirror.insert(*index, item.clone()),
            ListChange::Removed { index, .. } => {
                mirror.remove(*index);
            }
        }
    }
}

/// An ordered collection that records each insertion and removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableList<T> {
    items: Vec<T>,
    pending: Vec<ListChange<T>>,
}

impl<T> Default for ObservableList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pending: Vec::new(),
        }
    }
}

impl<T: Clone> ObservableList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list holding `items` without recording any change.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items,
            pending: Vec::new(),
        }
    }

    /// Current contents.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the list holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Iterate over the items in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Insert `item` at `index` and record the change.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, item: T) {
        self.items.insert(index, item.clone());
        self.pending.push(ListChange::Inserted { index, item });
    }

    /// Remove the item at `index` and record the change.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        let item = self.items.remove(index);
        self.pending.push(ListChange::Removed {
            index,
            item: item.clone(),
        });
        item
    }

    /// Append `item` and record the change.
    pub fn push(&mut self, item: T) {
        self.insert(self.items.len(), item);
    }

    /// Returns `true` if changes are waiting to be drained.
    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain the recorded changes, oldest first.
    pub fn take_changes(&mut self) -> Vec<ListChange<T>> {
        std::mem::take(&mut self.pending)
    }

    /// Consume the list, returning its items.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Clone + PartialEq> ObservableList<T> {
    /// Make the list equal to `desired` with the fewest recorded insertions and removals.
    ///
    /// Returns the number of recorded changes.
    pub fn make_like(&mut self, desired: &[T]) -> usize {
        reconcile::reconcile(self, desired)
    }
}

impl<T: Clone> EditTarget<T> for ObservableList<T> {
    fn as_slice(&self) -> &[T] {
        &self.items
    }

    fn remove_at(&mut self, index: usize) -> T {
        self.remove(index)
    }

    fn insert_at(&mut self, index: usize, item: T) {
        self.insert(index, item);
    }
}

impl<'a, T> IntoIterator for &'a ObservableList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_records_nothing() {
        let mut list = ObservableList::from_vec(vec![1, 2, 3]);
        assert_eq!(list.len(), 3);
        assert!(!list.has_pending_changes());
        assert!(list.take_changes().is_empty());
    }

    #[test]
    fn test_insert_and_remove_are_recorded_in_order() {
        let mut list = ObservableList::new();
        list.push("a");
        list.insert(0, "b");
        assert_eq!(list.remove(1), "a");

        assert_eq!(
            list.take_changes(),
            vec![
                ListChange::Inserted {
                    index: 0,
                    item: "a"
                },
                ListChange::Inserted {
                    index: 0,
                    item: "b"
                },
                ListChange::Removed {
                    index: 1,
                    item: "a"
                },
            ]
        );
        assert!(!list.has_pending_changes());
        assert_eq!(list.as_slice(), &["b"]);
    }

    #[test]
    fn test_make_like_changes_replay_onto_mirror() {
        let start = vec![5, 1, 4, 2];
        let mut list = ObservableList::from_vec(start.clone());
        let mut mirror = start;

        let desired = [1, 2, 3, 5];
        let count = list.make_like(&desired);
        let changes = list.take_changes();
        assert_eq!(count, changes.len());

        for change in &changes {
            change.apply_to(&mut mirror);
        }
        assert_eq!(mirror, desired.to_vec());
        assert_eq!(list.as_slice(), &desired);
    }

    #[test]
    fn test_make_like_same_contents_is_silent() {
        let mut list = ObservableList::from_vec(vec!['x', 'y']);
        assert_eq!(list.make_like(&['x', 'y']), 0);
        assert!(!list.has_pending_changes());
    }
}
