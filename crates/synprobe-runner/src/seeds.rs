//! Seed input: one JSON object per line with `question`, `answer` and
//! `passage`.

use crate::error::{RunnerError, RunnerResult};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use synprobe_types::SeedRecord;

/// Lazily reads seed records from a JSONL source. Blank lines are skipped;
/// line numbers in errors are 1-based.
pub struct SeedReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl SeedReader<BufReader<File>> {
    pub fn open(path: &Path) -> RunnerResult<Self> {
        let file = File::open(path).map_err(|e| {
            RunnerError::Config(format!("cannot open seed file {}: {}", path.display(), e))
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> SeedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for SeedReader<R> {
    type Item = RunnerResult<SeedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(
                serde_json::from_str(&line).map_err(|e| RunnerError::Seed {
                    line: self.line,
                    reason: e.to_string(),
                }),
            );
        }
    }
}

/// Parse a whole JSONL document.
pub fn parse_seeds(text: &str) -> RunnerResult<Vec<SeedRecord>> {
    SeedReader::new(text.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use synprobe_types::Label;

    #[test]
    fn reads_records_in_order() {
        let seeds = parse_seeds(
            "{\"question\":\"is the sky blue\",\"answer\":true,\"passage\":\"The sky is blue.\"}\n\
             \n\
             {\"question\":\"is fire cold\",\"answer\":\"false\"}\n",
        )
        .unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].question, "is the sky blue");
        assert_eq!(seeds[0].answer, Label::True);
        assert_eq!(seeds[1].answer, Label::False);
        assert_eq!(seeds[1].passage, "");
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let err = parse_seeds("{\"question\":\"q\",\"answer\":true}\n\nnot json\n").unwrap_err();
        assert!(matches!(err, RunnerError::Seed { line: 3, .. }));
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        assert!(matches!(
            SeedReader::open(Path::new("/nonexistent/train.jsonl")),
            Err(RunnerError::Config(_))
        ));
    }
}
