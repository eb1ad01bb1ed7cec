//! Covering arrays and their cache key.

use crate::error::{TypesError, TypesResult};
use crate::synonym::Cardinalities;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a generated covering array: the strength plus the ordered
/// cardinality vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrayKey {
    strength: usize,
    cardinalities: Cardinalities,
}

impl ArrayKey {
    /// Create a key. The strength is capped at the number of positions,
    /// since no generator can cover more columns than exist.
    pub fn new(cardinalities: Cardinalities, strength: usize) -> TypesResult<Self> {
        if strength == 0 {
            return Err(TypesError::ZeroStrength);
        }
        let strength = strength.min(cardinalities.len().max(1));
        Ok(Self {
            strength,
            cardinalities,
        })
    }

    pub fn strength(&self) -> usize {
        self.strength
    }

    pub fn cardinalities(&self) -> &Cardinalities {
        &self.cardinalities
    }

    /// Number of columns of any array generated for this key.
    pub fn columns(&self) -> usize {
        self.cardinalities.len()
    }

    /// Stable signature, e.g. `t2-3,5,2`.
    pub fn signature(&self) -> String {
        format!("t{}-{}", self.strength, self.cardinalities)
    }

    /// File name for the canonical CSV of this key, e.g. `ca-t2-3,5,2.csv`.
    pub fn file_name(&self) -> String {
        format!("ca-{}.csv", self.signature())
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// Rectangular matrix of candidate indices, one column per position and one
/// row per selected combination.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoveringArray {
    columns: usize,
    rows: Vec<Vec<usize>>,
}

impl CoveringArray {
    /// Build from rows, checking that every row has `columns` values.
    pub fn new(columns: usize, rows: Vec<Vec<usize>>) -> TypesResult<Self> {
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns {
                return Err(TypesError::ColumnMismatch {
                    row: index,
                    expected: columns,
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Vec<usize>> {
        self.rows
    }

    /// Parse a single canonical row (`0,2,1`).
    pub fn parse_row(line: &str, row: usize) -> TypesResult<Vec<usize>> {
        line.trim()
            .split(',')
            .map(|value| {
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| TypesError::InvalidValue {
                        row,
                        value: value.to_string(),
                    })
            })
            .collect()
    }

    /// Parse canonical CSV: comma-separated integers, one row per line, no
    /// header. Blank lines are ignored.
    pub fn from_csv(text: &str, columns: usize) -> TypesResult<Self> {
        let rows = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(index, line)| Self::parse_row(line, index))
            .collect::<TypesResult<Vec<_>>>()?;
        Self::new(columns, rows)
    }

    /// Render as canonical CSV with a trailing newline per row.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let line = row
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// True when every value lies below its column's cardinality.
    pub fn fits(&self, cardinalities: &Cardinalities) -> bool {
        self.columns == cardinalities.len()
            && self.rows.iter().all(|row| {
                row.iter()
                    .zip(cardinalities.as_slice())
                    .all(|(value, card)| value < card)
            })
    }
}
