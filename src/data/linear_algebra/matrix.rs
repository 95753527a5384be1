//! # Sparse matrix implementation
//!
//! The constraint matrices are accumulated row by row in a build-friendly form and converted to a
//! query-friendly form, with both majors indexed, once complete.
use std::slice::Iter;

/// A (row index, value) or (column index, value) pair of a sparse row or column.
pub type SparseTuple = (usize, f64);

/// Accumulates values before the dimensions of row contents are final.
///
/// Values within a row may arrive in any column order; sorting and the column-major index are
/// deferred to `finish`.
#[derive(Debug)]
pub struct SparseMatrixBuilder {
    rows: Vec<Vec<SparseTuple>>,
    nr_columns: usize,
}

impl SparseMatrixBuilder {
    /// Start building a matrix of known dimensions, initially all zero.
    #[must_use]
    pub fn new(nr_rows: usize, nr_columns: usize) -> Self {
        Self {
            rows: vec![Vec::new(); nr_rows],
            nr_columns,
        }
    }

    /// Set the value at coordinate (`i`, `j`), replacing any earlier value there.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(i < self.rows.len());
        debug_assert!(j < self.nr_columns);

        match self.rows[i].iter_mut().find(|&&mut (column, _)| column == j) {
            Some((_, existing)) => *existing = value,
            None => self.rows[i].push((j, value)),
        }
    }

    /// The values accumulated so far for row `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[SparseTuple] {
        debug_assert!(i < self.rows.len());

        &self.rows[i]
    }

    /// Overwrite row `target` with a copy of the given values, each multiplied by `factor`.
    pub fn set_row_multiple(&mut self, target: usize, values: &[SparseTuple], factor: f64) {
        debug_assert!(target < self.rows.len());

        self.rows[target] = values.iter()
            .map(|&(j, value)| (j, factor * value))
            .collect();
    }

    /// Sort the rows and derive the column-major index, producing the immutable form.
    #[must_use]
    pub fn finish(mut self) -> SparseMatrix {
        for row in &mut self.rows {
            row.sort_unstable_by_key(|&(j, _)| j);
            debug_assert!(row.windows(2).all(|w| w[0].0 < w[1].0));
        }

        let mut columns = vec![Vec::new(); self.nr_columns];
        for (i, row) in self.rows.iter().enumerate() {
            for &(j, value) in row {
                columns[j].push((i, value));
            }
        }

        let nr_rows = self.rows.len();
        SparseMatrix {
            rows: self.rows,
            columns,
            nr_rows,
            nr_columns: self.nr_columns,
        }
    }
}

/// Row-major and column-major indexed sparse matrix. Indices start at `0`.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    rows: Vec<Vec<SparseTuple>>,
    columns: Vec<Vec<SparseTuple>>,
    nr_rows: usize,
    nr_columns: usize,
}

impl SparseMatrix {
    /// Create a matrix of zeros of dimension `nr_rows` x `nr_columns`.
    #[must_use]
    pub fn zeros(nr_rows: usize, nr_columns: usize) -> Self {
        SparseMatrixBuilder::new(nr_rows, nr_columns).finish()
    }

    /// Create a matrix from dense row data. Mostly useful in tests.
    #[must_use]
    pub fn from_data(data: Vec<Vec<f64>>) -> Self {
        let nr_columns = data.first().map_or(0, Vec::len);
        debug_assert!(data.iter().all(|row| row.len() == nr_columns));

        let mut builder = SparseMatrixBuilder::new(data.len(), nr_columns);
        for (i, row) in data.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                if value != 0.0 {
                    builder.set(i, j, value);
                }
            }
        }

        builder.finish()
    }

    /// All (`column`, `value`) tuples of row `i`.
    pub fn row(&self, i: usize) -> Iter<'_, SparseTuple> {
        debug_assert!(i < self.nr_rows);

        self.rows[i].iter()
    }

    /// All (`row`, `value`) tuples of column `j`.
    pub fn column(&self, j: usize) -> Iter<'_, SparseTuple> {
        debug_assert!(j < self.nr_columns);

        self.columns[j].iter()
    }

    /// The value at coordinate (`i`, `j`).
    #[must_use]
    pub fn get_value(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.nr_rows);
        debug_assert!(j < self.nr_columns);

        match self.rows[i].iter().find(|&&(column, _)| column == j) {
            Some(&(_, value)) => value,
            None => 0.0,
        }
    }

    /// Set the value at coordinate (`i`, `j`), maintaining both majors.
    pub fn set_value(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(i < self.nr_rows);
        debug_assert!(j < self.nr_columns);

        Self::set_value_helper(&mut self.rows, i, j, value);
        Self::set_value_helper(&mut self.columns, j, i, value);
    }

    fn set_value_helper(
        major_vector: &mut [Vec<SparseTuple>],
        major: usize,
        minor: usize,
        value: f64,
    ) {
        let minor_vector = &mut major_vector[major];
        match minor_vector.binary_search_by_key(&minor, |&(index, _)| index) {
            Ok(position) => minor_vector[position].1 = value,
            Err(position) => minor_vector.insert(position, (minor, value)),
        }
    }

    /// A new matrix consisting of the listed rows, in the listed order.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        debug_assert!(indices.iter().all(|&i| i < self.nr_rows));

        let mut builder = SparseMatrixBuilder::new(indices.len(), self.nr_columns);
        for (new_index, &old_index) in indices.iter().enumerate() {
            builder.set_row_multiple(new_index, &self.rows[old_index], 1.0);
        }

        builder.finish()
    }

    /// Split vertically into the columns before `at` and the columns from `at` onward.
    ///
    /// Column indices in the right half are shifted down by `at`.
    #[must_use]
    pub fn split_columns(&self, at: usize) -> (Self, Self) {
        debug_assert!(at <= self.nr_columns);

        let mut left = SparseMatrixBuilder::new(self.nr_rows, at);
        let mut right = SparseMatrixBuilder::new(self.nr_rows, self.nr_columns - at);
        for (i, row) in self.rows.iter().enumerate() {
            for &(j, value) in row {
                if j < at {
                    left.set(i, j, value);
                } else {
                    right.set(i, j - at, value);
                }
            }
        }

        (left.finish(), right.finish())
    }

    /// The number of rows in this matrix.
    #[must_use]
    pub fn nr_rows(&self) -> usize {
        self.nr_rows
    }

    /// The number of columns in this matrix.
    #[must_use]
    pub fn nr_columns(&self) -> usize {
        self.nr_columns
    }

    /// The number of explicitly stored values in this matrix.
    #[must_use]
    pub fn size(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_matrix() -> SparseMatrix {
        SparseMatrix::from_data(vec![
            vec![1.0, 2.0, 0.0],
            vec![0.0, 5.0, 6.0],
        ])
    }

    #[test]
    fn build_and_query() {
        let mut builder = SparseMatrixBuilder::new(2, 3);
        builder.set(0, 1, 2.0);
        builder.set(0, 0, 1.0);
        builder.set(1, 2, 6.0);
        builder.set(1, 1, 5.0);
        // Replacement, not accumulation.
        builder.set(1, 1, 4.0);
        builder.set(1, 1, 5.0);
        let m = builder.finish();

        assert_eq!(m, test_matrix());
        assert_eq!(m.get_value(0, 0), 1.0);
        assert_eq!(m.get_value(0, 2), 0.0);
        assert_eq!(m.size(), 4);
        assert_eq!(m.row(0).as_slice(), &[(0, 1.0), (1, 2.0)]);
        assert_eq!(m.column(1).as_slice(), &[(0, 2.0), (1, 5.0)]);
    }

    #[test]
    fn row_copies_with_factor() {
        let mut builder = SparseMatrixBuilder::new(3, 3);
        builder.set(0, 0, 1.0);
        builder.set(0, 2, -2.0);
        let original = builder.row(0).to_vec();
        builder.set_row_multiple(1, &original, -1.0);
        builder.set_row_multiple(2, &original, 1.0);
        let m = builder.finish();

        assert_eq!(m.get_value(1, 0), -1.0);
        assert_eq!(m.get_value(1, 2), 2.0);
        assert_eq!(m.get_value(2, 0), 1.0);
        assert_eq!(m.get_value(2, 2), -2.0);
    }

    #[test]
    fn set_value_maintains_both_majors() {
        let mut m = test_matrix();
        m.set_value(0, 2, 9.0);
        m.set_value(0, 1, 3.0);

        assert_eq!(m.get_value(0, 2), 9.0);
        assert_eq!(m.row(0).as_slice(), &[(0, 1.0), (1, 3.0), (2, 9.0)]);
        assert_eq!(m.column(2).as_slice(), &[(0, 9.0), (1, 6.0)]);
    }

    #[test]
    fn select_and_split() {
        let m = SparseMatrix::from_data(vec![
            vec![1.0, 0.0, 3.0, 0.0],
            vec![0.0, 2.0, 0.0, 4.0],
            vec![5.0, 0.0, 0.0, 6.0],
        ]);

        let selected = m.select_rows(&[2, 0]);
        assert_eq!(selected.nr_rows(), 2);
        assert_eq!(selected.get_value(0, 0), 5.0);
        assert_eq!(selected.get_value(1, 2), 3.0);

        let (left, right) = m.split_columns(2);
        assert_eq!(left.nr_columns(), 2);
        assert_eq!(right.nr_columns(), 2);
        assert_eq!(left.get_value(0, 0), 1.0);
        assert_eq!(right.get_value(0, 0), 3.0);
        assert_eq!(right.get_value(2, 1), 6.0);
    }

    #[test]
    fn empty_dimensions() {
        let m = SparseMatrix::zeros(0, 3);
        assert_eq!(m.nr_rows(), 0);
        assert_eq!(m.size(), 0);

        let m = SparseMatrix::zeros(2, 0);
        assert_eq!(m.nr_columns(), 0);
    }
}
