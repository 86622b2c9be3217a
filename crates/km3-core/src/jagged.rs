//! CSR-style ragged columns: flat values + per-row offsets.

use crate::error::{Error, Result};

/// A jagged (variable-length) column: flat values + per-row offsets.
///
/// `offsets` has length `n_rows + 1` and starts at 0. Row `i` holds
/// `flat[offsets[i]..offsets[i + 1]]`.
///
/// Nesting in the data model is strictly two-level (event → hits, event →
/// tracks). Deeper structures (track → rec_stages) are expressed by a second
/// `Jagged` whose rows align with the flat axis of the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Jagged<T> {
    flat: Vec<T>,
    offsets: Vec<usize>,
}

impl<T> Jagged<T> {
    /// Build from a flat buffer and offsets, validating the CSR invariants.
    pub fn new(flat: Vec<T>, offsets: Vec<usize>) -> Result<Self> {
        if offsets.first() != Some(&0) {
            return Err(Error::Deserialization(
                "jagged offsets must start at 0".into(),
            ));
        }
        if offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::Deserialization(
                "jagged offsets must be non-decreasing".into(),
            ));
        }
        if offsets.last() != Some(&flat.len()) {
            return Err(Error::Deserialization(format!(
                "jagged offsets end at {} but flat buffer holds {} values",
                offsets.last().copied().unwrap_or(0),
                flat.len()
            )));
        }
        Ok(Self { flat, offsets })
    }

    /// An empty column with zero rows.
    pub fn empty() -> Self {
        Self { flat: Vec::new(), offsets: vec![0] }
    }

    /// Build from per-row lists.
    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = T>,
    {
        let mut flat = Vec::new();
        let mut offsets = vec![0usize];
        for row in rows {
            flat.extend(row);
            offsets.push(flat.len());
        }
        Self { flat, offsets }
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total number of values across all rows.
    pub fn n_values(&self) -> usize {
        self.flat.len()
    }

    /// Values of row `i`.
    pub fn row(&self, i: usize) -> &[T] {
        &self.flat[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Length of row `i`.
    pub fn row_len(&self, i: usize) -> usize {
        self.offsets[i + 1] - self.offsets[i]
    }

    /// Per-row lengths.
    pub fn counts(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// The flat value buffer.
    pub fn flat(&self) -> &[T] {
        &self.flat
    }

    /// The offsets table (`n_rows + 1` entries).
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Iterate rows as slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        self.offsets.windows(2).map(move |w| &self.flat[w[0]..w[1]])
    }

    /// True when `other` has identical row boundaries.
    pub fn is_aligned_with<U>(&self, other: &Jagged<U>) -> bool {
        self.offsets == other.offsets
    }

    /// Element-wise map preserving the row structure.
    pub fn map<U, F>(&self, f: F) -> Jagged<U>
    where
        F: FnMut(&T) -> U,
    {
        Jagged { flat: self.flat.iter().map(f).collect(), offsets: self.offsets.clone() }
    }
}

impl<T> Default for Jagged<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone> Jagged<T> {
    /// Materialize per-row `Vec`s (test/diagnostic convenience).
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.iter_rows().map(|r| r.to_vec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_builds_flat_and_offsets() {
        let j = Jagged::from_rows(vec![vec![1, 2], vec![], vec![3]]);
        assert_eq!(j.n_rows(), 3);
        assert_eq!(j.flat(), &[1, 2, 3]);
        assert_eq!(j.offsets(), &[0, 2, 2, 3]);
        assert_eq!(j.row(0), &[1, 2]);
        assert!(j.row(1).is_empty());
        assert_eq!(j.counts(), vec![2, 0, 1]);
    }

    #[test]
    fn new_rejects_inconsistent_offsets() {
        assert!(Jagged::new(vec![1, 2, 3], vec![0, 2]).is_err());
        assert!(Jagged::new(vec![1, 2, 3], vec![1, 3]).is_err());
        assert!(Jagged::new(vec![1, 2, 3], vec![0, 2, 1, 3]).is_err());
        assert!(Jagged::new(vec![1, 2, 3], vec![0, 2, 3]).is_ok());
    }

    #[test]
    fn map_preserves_shape() {
        let j = Jagged::from_rows(vec![vec![1i64, 2], vec![], vec![3]]);
        let doubled = j.map(|v| v * 2);
        assert!(j.is_aligned_with(&doubled));
        assert_eq!(doubled.flat(), &[2, 4, 6]);
    }

    #[test]
    fn empty_column_has_no_rows() {
        let j: Jagged<f64> = Jagged::empty();
        assert_eq!(j.n_rows(), 0);
        assert_eq!(j.n_values(), 0);
    }
}
