//! In-process greedy covering-array construction.
//!
//! Each new row is seeded with the first uncovered tuple; the remaining
//! columns are filled left to right with the value that covers the most
//! still-uncovered tuples among the subsets whose columns are all assigned
//! (ties go to the smallest value). Every row covers at least its seed
//! tuple, so construction terminates with full t-wise coverage.

use super::coverage::{column_subsets, SubsetCoverage};
use super::CoveringArrayGenerator;
use crate::error::{PayloadError, PayloadResult};
use async_trait::async_trait;
use std::path::Path;
use synprobe_types::{ArrayKey, CoveringArray};

/// Backend that needs no external executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeGenerator;

#[async_trait]
impl CoveringArrayGenerator for NativeGenerator {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn produce(&self, key: &ArrayKey, _workdir: &Path) -> PayloadResult<CoveringArray> {
        let cardinalities = key.cardinalities().as_slice().to_vec();
        let strength = key.strength();
        // Construction is CPU-bound; keep it off the async workers.
        let rows = tokio::task::spawn_blocking(move || build(&cardinalities, strength))
            .await
            .map_err(|e| PayloadError::generation(key, e.to_string()))?;
        if rows.is_empty() {
            return Err(PayloadError::generation(key, "no interactions to cover"));
        }
        Ok(CoveringArray::new(key.columns(), rows)?)
    }
}

/// Rows covering every `strength`-wise interaction of `cardinalities`.
pub fn build(cardinalities: &[usize], strength: usize) -> Vec<Vec<usize>> {
    let n = cardinalities.len();
    if n == 0 || cardinalities.contains(&0) {
        return Vec::new();
    }
    let strength = strength.clamp(1, n);
    let mut subsets: Vec<SubsetCoverage> = column_subsets(n, strength)
        .into_iter()
        .map(|columns| SubsetCoverage::new(columns, cardinalities))
        .collect();

    let mut by_column: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (s, subset) in subsets.iter().enumerate() {
        for &c in &subset.columns {
            by_column[c].push(s);
        }
    }

    let mut rows = Vec::new();
    while let Some((seed, index)) = subsets
        .iter()
        .enumerate()
        .find_map(|(s, subset)| subset.first_uncovered().map(|i| (s, i)))
    {
        let mut row: Vec<Option<usize>> = vec![None; n];
        for (&c, value) in subsets[seed].columns.iter().zip(subsets[seed].decode(index)) {
            row[c] = Some(value);
        }

        for column in 0..n {
            if row[column].is_some() {
                continue;
            }
            let mut best = (0, 0);
            for value in 0..cardinalities[column] {
                row[column] = Some(value);
                let gain = by_column[column]
                    .iter()
                    .filter(|&&s| {
                        let subset = &subsets[s];
                        let values: Option<Vec<usize>> =
                            subset.columns.iter().map(|&c| row[c]).collect();
                        values
                            .and_then(|v| subset.index_of(v))
                            .is_some_and(|i| !subset.is_covered(i))
                    })
                    .count();
                if gain > best.1 {
                    best = (value, gain);
                }
            }
            row[column] = Some(best.0);
        }

        let row: Vec<usize> = row.into_iter().map(|v| v.unwrap_or(0)).collect();
        for subset in subsets.iter_mut() {
            subset.cover_row(&row);
        }
        rows.push(row);
    }
    rows
}
