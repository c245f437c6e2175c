//! Minimal-edit sequence reconciliation.
//!
//! Given the sequence a host currently displays and a freshly computed target sequence, this
//! module computes the shortest script of single-element removals and insertions that turns the
//! former into the latter while keeping the relative order of the elements both sequences share.
//!
//! The algorithm is a longest-common-subsequence walk:
//!
//! 1. Strip the common prefix and suffix (the common case: nothing or little changed).
//! 2. Fill a suffix LCS table for the remaining middle section.
//! 3. Walk the table forward to decide which current elements are kept.
//! 4. Emit removals for every dropped element (highest index first), then insertions for every
//!    new element (lowest index first).
//!
//! The emitted indices are valid **at the time each edit is applied**, so the script can be
//! replayed one edit at a time against any [`EditTarget`] (a plain `Vec`, or an
//! [`ObservableList`](crate::ObservableList) that reports every step to observers).
//!
//! The number of edits is always `current.len() + desired.len() - 2 * lcs`, which is the
//! minimum for an insert/remove-only edit model.

/// A single step of a reconciliation script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqEdit {
    /// Remove the element at `index`.
    Remove {
        /// Position in the target at the time this edit is applied.
        index: usize,
    },
    /// Insert `desired[source]` at `index`.
    Insert {
        /// Position in the target at the time this edit is applied.
        index: usize,
        /// Index of the inserted element in the desired sequence.
        source: usize,
    },
}

impl SeqEdit {
    /// Position in the target at the time this edit is applied.
    pub fn index(&self) -> usize {
        match *self {
            SeqEdit::Remove { index } | SeqEdit::Insert { index, .. } => index,
        }
    }
}

/// A sequence that can be mutated one element at a time.
pub trait EditTarget<T> {
    /// Current contents of the target.
    fn as_slice(&self) -> &[T];

    /// Remove and return the element at `index`.
    fn remove_at(&mut self, index: usize) -> T;

    /// Insert `item` at `index`, shifting later elements right.
    fn insert_at(&mut self, index: usize, item: T);
}

impl<T> EditTarget<T> for Vec<T> {
    fn as_slice(&self) -> &[T] {
        self
    }

    fn remove_at(&mut self, index: usize) -> T {
        self.remove(index)
    }

    fn insert_at(&mut self, index: usize, item: T) {
        self.insert(index, item);
    }
}

/// Compute a minimal removal/insertion script turning `current` into `desired`.
///
/// `eq` decides whether a current element can stand in for a desired one. Elements that compare
/// equal are interchangeable: with duplicates, which copy is kept is unspecified but the result
/// and the edit count are not.
pub fn diff_by<T, U, F>(current: &[T], desired: &[U], mut eq: F) -> Vec<SeqEdit>
where
    F: FnMut(&T, &U) -> bool,
{
    let prefix = current
        .iter()
        .zip(desired)
        .take_while(|(c, d)| eq(*c, *d))
        .count();

    let current_rest = &current[prefix..];
    let desired_rest = &desired[prefix..];
    let suffix = current_rest
        .iter()
        .rev()
        .zip(desired_rest.iter().rev())
        .take_while(|(c, d)| eq(*c, *d))
        .count();

    let cur = &current_rest[..current_rest.len() - suffix];
    let des = &desired_rest[..desired_rest.len() - suffix];

    if cur.is_empty() && des.is_empty() {
        return Vec::new();
    }

    let (keep_current, keep_desired) = lcs_membership(cur, des, &mut eq);

    let mut edits = Vec::with_capacity(cur.len() + des.len());

    // Removing from the back keeps the indices of earlier elements stable.
    for (i, kept) in keep_current.iter().enumerate().rev() {
        if !kept {
            edits.push(SeqEdit::Remove { index: prefix + i });
        }
    }

    // After the removals the middle holds exactly the kept elements, in desired order, so
    // inserting every missing element at its final position (ascending) rebuilds `desired`.
    for (j, kept) in keep_desired.iter().enumerate() {
        if !kept {
            edits.push(SeqEdit::Insert {
                index: prefix + j,
                source: prefix + j,
            });
        }
    }

    edits
}

/// [`diff_by`] using `PartialEq`.
pub fn diff<T: PartialEq>(current: &[T], desired: &[T]) -> Vec<SeqEdit> {
    diff_by(current, desired, |a, b| a == b)
}

/// Length of the longest common subsequence under `eq`.
pub fn lcs_len_by<T, U, F>(current: &[T], desired: &[U], mut eq: F) -> usize
where
    F: FnMut(&T, &U) -> bool,
{
    let (keep, _) = lcs_membership(current, desired, &mut eq);
    keep.into_iter().filter(|k| *k).count()
}

/// Marks which elements of each side belong to one longest common subsequence.
fn lcs_membership<T, U, F>(cur: &[T], des: &[U], eq: &mut F) -> (Vec<bool>, Vec<bool>)
where
    F: FnMut(&T, &U) -> bool,
{
    let n = cur.len();
    let m = des.len();
    let mut keep_current = vec![false; n];
    let mut keep_desired = vec![false; m];

    if n == 0 || m == 0 {
        return (keep_current, keep_desired);
    }

    // table[i][j] = LCS length of cur[i..] and des[j..], stored row-major.
    let width = m + 1;
    let mut table = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if eq(&cur[i], &des[j]) {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if eq(&cur[i], &des[j]) {
            keep_current[i] = true;
            keep_desired[j] = true;
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }

    (keep_current, keep_desired)
}

/// Apply a script produced by [`diff_by`] for `desired` to `target`.
pub fn apply_edits<T, L>(target: &mut L, desired: &[T], edits: &[SeqEdit])
where
    T: Clone,
    L: EditTarget<T> + ?Sized,
{
    for edit in edits {
        match *edit {
            SeqEdit::Remove { index } => {
                target.remove_at(index);
            }
            SeqEdit::Insert { index, source } => {
                target.insert_at(index, desired[source].clone());
            }
        }
    }
}

/// Reconcile `target` in place so it ends up equal to `desired`.
///
/// Returns the number of edits applied; zero means `target` already matched.
pub fn reconcile_by<T, L, F>(target: &mut L, desired: &[T], eq: F) -> usize
where
    T: Clone,
    L: EditTarget<T> + ?Sized,
    F: FnMut(&T, &T) -> bool,
{
    let edits = diff_by(target.as_slice(), desired, eq);
    apply_edits(target, desired, &edits);
    edits.len()
}

/// [`reconcile_by`] using `PartialEq`.
pub fn reconcile<T, L>(target: &mut L, desired: &[T]) -> usize
where
    T: Clone + PartialEq,
    L: EditTarget<T> + ?Sized,
{
    reconcile_by(target, desired, |a, b| a == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay(current: &[char], desired: &[char]) -> (Vec<char>, Vec<SeqEdit>) {
        let edits = diff(current, desired);
        let mut out = current.to_vec();
        apply_edits(&mut out, desired, &edits);
        (out, edits)
    }

    #[test]
    fn test_identical_sequences_produce_no_edits() {
        let seq = ['a', 'b', 'c'];
        assert!(diff(&seq, &seq).is_empty());
        assert!(diff::<char>(&[], &[]).is_empty());
    }

    #[test]
    fn test_replace_tail_and_prepend() {
        // [B, C] -> [A, B]: drop C, then put A in front.
        let (out, edits) = replay(&['b', 'c'], &['a', 'b']);
        assert_eq!(out, vec!['a', 'b']);
        assert_eq!(
            edits,
            vec![
                SeqEdit::Remove { index: 1 },
                SeqEdit::Insert {
                    index: 0,
                    source: 0
                }
            ]
        );
    }

    #[test]
    fn test_from_and_to_empty() {
        let (out, edits) = replay(&[], &['x', 'y']);
        assert_eq!(out, vec!['x', 'y']);
        assert_eq!(edits.len(), 2);

        let (out, edits) = replay(&['x', 'y'], &[]);
        assert!(out.is_empty());
        assert_eq!(
            edits,
            vec![SeqEdit::Remove { index: 1 }, SeqEdit::Remove { index: 0 }]
        );
    }

    #[test]
    fn test_common_prefix_and_suffix_are_untouched() {
        let (out, edits) = replay(&['a', 'x', 'y', 'z'], &['a', 'q', 'z']);
        assert_eq!(out, vec!['a', 'q', 'z']);
        assert_eq!(edits.len(), 3);
        assert!(edits.iter().all(|e| e.index() >= 1));
    }

    #[test]
    fn test_duplicates_are_interchangeable() {
        let (out, edits) = replay(&['a', 'a', 'b'], &['a', 'b', 'a']);
        assert_eq!(out, vec!['a', 'b', 'a']);
        assert_eq!(edits.len(), 2);

        let (out, edits) = replay(&['a'], &['a', 'a']);
        assert_eq!(out, vec!['a', 'a']);
        assert_eq!(edits.len(), 1);
    }

    #[test]
    fn test_reversal_keeps_one_element() {
        let current = ['a', 'b', 'c', 'd'];
        let desired = ['d', 'c', 'b', 'a'];
        let (out, edits) = replay(&current, &desired);
        assert_eq!(out, desired.to_vec());
        assert_eq!(lcs_len_by(&current, &desired, |a, b| a == b), 1);
        assert_eq!(edits.len(), 6);
    }

    #[test]
    fn test_diff_by_across_element_types() {
        let current = [1u32, 2, 3];
        let desired = ["1", "3", "4"];
        let edits = diff_by(&current, &desired, |c, d| c.to_string() == *d);
        assert_eq!(
            edits,
            vec![
                SeqEdit::Remove { index: 1 },
                SeqEdit::Insert {
                    index: 2,
                    source: 2
                }
            ]
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut target = vec![3, 1, 2];
        let desired = [1, 2, 4];
        assert_eq!(reconcile(&mut target, &desired), 2);
        assert_eq!(target, desired.to_vec());
        assert_eq!(reconcile(&mut target, &desired), 0);
    }
}
