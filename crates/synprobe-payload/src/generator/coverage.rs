//! t-wise coverage bookkeeping shared by the native backend and checks.

/// A value assignment to a set of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub columns: Vec<usize>,
    pub values: Vec<usize>,
}

/// All `t`-element column subsets of `0..n`, in lexicographic order.
pub(crate) fn column_subsets(n: usize, t: usize) -> Vec<Vec<usize>> {
    if t == 0 || t > n {
        return Vec::new();
    }
    let mut subsets = Vec::new();
    let mut current: Vec<usize> = (0..t).collect();
    loop {
        subsets.push(current.clone());
        let Some(i) = (0..t).rev().find(|&i| current[i] < n - t + i) else {
            return subsets;
        };
        current[i] += 1;
        for j in i + 1..t {
            current[j] = current[j - 1] + 1;
        }
    }
}

/// Coverage bitmap of one column subset, indexed in mixed radix.
#[derive(Debug, Clone)]
pub(crate) struct SubsetCoverage {
    pub columns: Vec<usize>,
    radices: Vec<usize>,
    covered: Vec<bool>,
    remaining: usize,
}

impl SubsetCoverage {
    pub fn new(columns: Vec<usize>, cardinalities: &[usize]) -> Self {
        let radices: Vec<usize> = columns.iter().map(|&c| cardinalities[c]).collect();
        let size = radices.iter().product();
        Self {
            columns,
            radices,
            covered: vec![false; size],
            remaining: size,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Tuple index of `values` (one per subset column), if in range.
    pub fn index_of(&self, values: impl IntoIterator<Item = usize>) -> Option<usize> {
        let mut index = 0;
        let mut count = 0;
        for (value, radix) in values.into_iter().zip(&self.radices) {
            if value >= *radix {
                return None;
            }
            index = index * radix + value;
            count += 1;
        }
        (count == self.radices.len()).then_some(index)
    }

    pub fn decode(&self, mut index: usize) -> Vec<usize> {
        let mut values = vec![0; self.radices.len()];
        for (slot, radix) in values.iter_mut().zip(&self.radices).rev() {
            *slot = index % radix;
            index /= radix;
        }
        values
    }

    pub fn is_covered(&self, index: usize) -> bool {
        self.covered[index]
    }

    pub fn first_uncovered(&self) -> Option<usize> {
        self.covered.iter().position(|c| !c)
    }

    /// Mark the tuple a full row realizes on this subset.
    pub fn cover_row(&mut self, row: &[usize]) {
        if let Some(index) = self.index_of(self.columns.iter().map(|&c| row[c])) {
            if !self.covered[index] {
                self.covered[index] = true;
                self.remaining -= 1;
            }
        }
    }
}

/// Interactions of strength `strength` that no row realizes. Rows of the
/// wrong width are ignored; values outside a column's cardinality never
/// count as covering.
pub fn missing_interactions(
    cardinalities: &[usize],
    strength: usize,
    rows: &[Vec<usize>],
) -> Vec<Interaction> {
    let mut missing = Vec::new();
    for columns in column_subsets(cardinalities.len(), strength) {
        let mut coverage = SubsetCoverage::new(columns, cardinalities);
        for row in rows.iter().filter(|r| r.len() == cardinalities.len()) {
            coverage.cover_row(row);
        }
        if coverage.remaining() == 0 {
            continue;
        }
        for index in 0..coverage.covered.len() {
            if !coverage.is_covered(index) {
                missing.push(Interaction {
                    columns: coverage.columns.clone(),
                    values: coverage.decode(index),
                });
            }
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsets_are_lexicographic() {
        assert_eq!(
            column_subsets(4, 2),
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(column_subsets(3, 3), vec![vec![0, 1, 2]]);
        assert!(column_subsets(2, 3).is_empty());
    }

    #[test]
    fn index_and_decode_agree() {
        let coverage = SubsetCoverage::new(vec![0, 2], &[2, 9, 3]);
        let index = coverage.index_of([1, 2]).unwrap();
        assert_eq!(coverage.decode(index), vec![1, 2]);
        assert_eq!(coverage.index_of([2, 0]), None);
    }

    #[test]
    fn full_factorial_has_nothing_missing() {
        let rows = vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]];
        assert!(missing_interactions(&[2, 2], 2, &rows).is_empty());
    }

    #[test]
    fn missing_pairs_are_reported() {
        let rows = vec![vec![0, 0], vec![1, 1]];
        let missing = missing_interactions(&[2, 2], 2, &rows);
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].values, vec![0, 1]);
    }
}
