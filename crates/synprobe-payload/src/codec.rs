//! Covering-array rows to natural-language queries.
//!
//! Index 0 at every position is the original token, so the all-zero row is
//! the baseline (the unmodified seed). [`decode`] always yields the baseline
//! first and drops any all-zero row the backend emitted.

use crate::error::{PayloadError, PayloadResult};
use synprobe_types::SynonymTable;

/// The all-original-token combination for `table`.
pub fn baseline_row(table: &SynonymTable) -> Vec<usize> {
    vec![0; table.len()]
}

/// Decode one row into a sentence.
///
/// Multi-word candidates use `_` as separator and are joined with spaces.
/// Candidate 0 is the raw token and is never rewritten. `row_index` only
/// identifies the row in errors.
pub fn decode_row(table: &SynonymTable, row_index: usize, row: &[usize]) -> PayloadResult<String> {
    if row.len() != table.len() {
        return Err(PayloadError::RowWidth {
            row: row_index,
            expected: table.len(),
            found: row.len(),
        });
    }

    let mut words = Vec::with_capacity(row.len());
    for (position, &index) in row.iter().enumerate() {
        let candidate =
            table
                .candidate(position, index)
                .ok_or_else(|| PayloadError::DecodeIntegrity {
                    row: row_index,
                    position,
                    index,
                    cardinality: table.candidates(position).map_or(0, <[String]>::len),
                })?;
        if index == 0 {
            words.push(candidate.to_string());
        } else {
            words.push(candidate.replace('_', " "));
        }
    }
    Ok(words.join(" "))
}

/// Decode a sequence of rows lazily, baseline first.
pub fn decode<'a, I>(table: &'a SynonymTable, rows: I) -> Decoder<'a, I::IntoIter>
where
    I: IntoIterator<Item = PayloadResult<Vec<usize>>>,
{
    Decoder {
        table,
        rows: rows.into_iter(),
        baseline_sent: false,
        row_index: 0,
    }
}

/// Iterator returned by [`decode`].
pub struct Decoder<'a, I> {
    table: &'a SynonymTable,
    rows: I,
    baseline_sent: bool,
    row_index: usize,
}

impl<I> Iterator for Decoder<'_, I>
where
    I: Iterator<Item = PayloadResult<Vec<usize>>>,
{
    type Item = PayloadResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.baseline_sent {
            self.baseline_sent = true;
            return Some(decode_row(
                self.table,
                0,
                &baseline_row(self.table),
            ));
        }
        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(e)),
            };
            let index = self.row_index;
            self.row_index += 1;
            if row.iter().all(|&v| v == 0) {
                continue;
            }
            return Some(decode_row(self.table, index, &row));
        }
    }
}
