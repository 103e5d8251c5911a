//! Sparse document-term matrices
//!
//! CSR storage with the handful of operations the preprocessing pipeline
//! needs: vertical stacking, row slicing, zero-column prepending, and npz
//! persistence of the raw CSR component arrays.

use anyhow::{ensure, Context, Result};
use ndarray::Array1;
use ndarray_npy::{NpzReader, NpzWriter};
use std::fs::File;
use std::path::Path;

/// Sparse matrix of token counts in compressed sparse row form.
///
/// Rows are documents, columns are vocabulary indices. The npz archive holds
/// four arrays: `data`, `indices`, `indptr` (all i64) and `shape`
/// (`[rows, cols]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    data: Vec<i64>,
    indices: Vec<i64>,
    indptr: Vec<i64>,
}

impl CsrMatrix {
    /// Build a matrix from per-row `(column, count)` entries.
    ///
    /// Entries within each row must be sorted by column with no duplicates;
    /// the vectorizer guarantees this.
    pub fn from_rows(cols: usize, rows: &[Vec<(usize, i64)>]) -> Self {
        let nnz = rows.iter().map(Vec::len).sum();
        let mut data = Vec::with_capacity(nnz);
        let mut indices = Vec::with_capacity(nnz);
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        indptr.push(0);
        for row in rows {
            for &(col, count) in row {
                debug_assert!(col < cols);
                indices.push(col as i64);
                data.push(count);
            }
            indptr.push(data.len() as i64);
        }
        Self {
            rows: rows.len(),
            cols,
            data,
            indices,
            indptr,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored (nonzero) entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Prepend a constant zero column, shifting every existing column right.
    pub fn prepend_zero_column(&mut self) {
        for ix in &mut self.indices {
            *ix += 1;
        }
        self.cols += 1;
    }

    /// Stack `self` on top of `other`. Column counts must match.
    pub fn vstack(&self, other: &CsrMatrix) -> Result<CsrMatrix> {
        ensure!(
            self.cols == other.cols,
            "cannot vstack matrices with {} and {} columns",
            self.cols,
            other.cols
        );
        let mut data = self.data.clone();
        data.extend_from_slice(&other.data);
        let mut indices = self.indices.clone();
        indices.extend_from_slice(&other.indices);
        let offset = *self.indptr.last().unwrap_or(&0);
        let mut indptr = self.indptr.clone();
        indptr.extend(other.indptr.iter().skip(1).map(|p| p + offset));
        Ok(CsrMatrix {
            rows: self.rows + other.rows,
            cols: self.cols,
            data,
            indices,
            indptr,
        })
    }

    /// Contiguous row slice `[start, end)`.
    pub fn slice_rows(&self, start: usize, end: usize) -> CsrMatrix {
        assert!(start <= end && end <= self.rows);
        let lo = self.indptr[start] as usize;
        let hi = self.indptr[end] as usize;
        let indptr = self.indptr[start..=end]
            .iter()
            .map(|p| p - lo as i64)
            .collect();
        CsrMatrix {
            rows: end - start,
            cols: self.cols,
            data: self.data[lo..hi].to_vec(),
            indices: self.indices[lo..hi].to_vec(),
            indptr,
        }
    }

    /// Per-column sums over all rows.
    pub fn column_sums(&self) -> Vec<i64> {
        let mut sums = vec![0i64; self.cols];
        for (ix, value) in self.indices.iter().zip(&self.data) {
            sums[*ix as usize] += value;
        }
        sums
    }

    /// Dense row-major copy. Intended for tests and small matrices.
    pub fn to_dense(&self) -> Vec<Vec<i64>> {
        let mut dense = vec![vec![0i64; self.cols]; self.rows];
        for row in 0..self.rows {
            let lo = self.indptr[row] as usize;
            let hi = self.indptr[row + 1] as usize;
            for k in lo..hi {
                dense[row][self.indices[k] as usize] = self.data[k];
            }
        }
        dense
    }

    /// Write the CSR components as an npz archive.
    pub fn save_npz(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut npz = NpzWriter::new(file);
        npz.add_array("data", &Array1::from(self.data.clone()))?;
        npz.add_array("indices", &Array1::from(self.indices.clone()))?;
        npz.add_array("indptr", &Array1::from(self.indptr.clone()))?;
        npz.add_array(
            "shape",
            &Array1::from(vec![self.rows as i64, self.cols as i64]),
        )?;
        npz.finish()?;
        Ok(())
    }

    /// Read a matrix previously written by [`CsrMatrix::save_npz`].
    pub fn load_npz(path: &Path) -> Result<CsrMatrix> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mut npz = NpzReader::new(file)
            .with_context(|| format!("{} is not an npz archive", path.display()))?;
        let data: Array1<i64> = npz.by_name("data")?;
        let indices: Array1<i64> = npz.by_name("indices")?;
        let indptr: Array1<i64> = npz.by_name("indptr")?;
        let shape: Array1<i64> = npz.by_name("shape")?;
        ensure!(shape.len() == 2, "npz shape array must have two entries");
        Ok(CsrMatrix {
            rows: shape[0] as usize,
            cols: shape[1] as usize,
            data: data.to_vec(),
            indices: indices.to_vec(),
            indptr: indptr.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CsrMatrix {
        // [[1, 0, 2],
        //  [0, 3, 0]]
        CsrMatrix::from_rows(3, &[vec![(0, 1), (2, 2)], vec![(1, 3)]])
    }

    #[test]
    fn from_rows_builds_expected_dense() {
        let m = sample();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.to_dense(), vec![vec![1, 0, 2], vec![0, 3, 0]]);
    }

    #[test]
    fn prepend_zero_column_shifts_indices() {
        let mut m = sample();
        m.prepend_zero_column();
        assert_eq!(m.cols(), 4);
        assert_eq!(m.to_dense(), vec![vec![0, 1, 0, 2], vec![0, 0, 3, 0]]);
    }

    #[test]
    fn vstack_concatenates_rows() {
        let top = sample();
        let bottom = CsrMatrix::from_rows(3, &[vec![(0, 7)]]);
        let stacked = top.vstack(&bottom).unwrap();
        assert_eq!(stacked.rows(), 3);
        assert_eq!(
            stacked.to_dense(),
            vec![vec![1, 0, 2], vec![0, 3, 0], vec![7, 0, 0]]
        );
    }

    #[test]
    fn vstack_rejects_column_mismatch() {
        let top = sample();
        let bottom = CsrMatrix::from_rows(2, &[vec![(0, 1)]]);
        assert!(top.vstack(&bottom).is_err());
    }

    #[test]
    fn slice_rows_roundtrips_with_vstack() {
        let m = CsrMatrix::from_rows(
            2,
            &[vec![(0, 1)], vec![(1, 2)], vec![(0, 3), (1, 4)], vec![]],
        );
        let top = m.slice_rows(0, 2);
        let bottom = m.slice_rows(2, 4);
        assert_eq!(top.rows(), 2);
        assert_eq!(bottom.rows(), 2);
        assert_eq!(top.vstack(&bottom).unwrap(), m);
    }

    #[test]
    fn column_sums_accumulate() {
        let m = sample();
        assert_eq!(m.column_sums(), vec![1, 3, 2]);
    }

    #[test]
    fn npz_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.npz");
        let m = sample();
        m.save_npz(&path).unwrap();
        let loaded = CsrMatrix::load_npz(&path).unwrap();
        assert_eq!(loaded, m);
    }

    #[test]
    fn empty_rows_are_preserved() {
        let m = CsrMatrix::from_rows(2, &[vec![], vec![(1, 5)], vec![]]);
        assert_eq!(m.rows(), 3);
        assert_eq!(m.to_dense(), vec![vec![0, 0], vec![0, 5], vec![0, 0]]);
    }
}
